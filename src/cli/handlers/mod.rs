use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::snapshot::SnapshotSource;
use crate::io::source::build_descendant_query;
use crate::model::config::Config;
use crate::ops::load::{LoadError, LoadOutcome, Loader};
use crate::render::{self, ChartOptions, RetryPolicy, TextTimeline};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let cwd = std::env::current_dir()?;
    let config = config_io::load_config(cli.config.as_deref(), &cwd)?;
    match cli.command {
        Commands::Gantt(args) => cmd_gantt(args, &config),
        Commands::List(args) => cmd_list(args, &config),
        Commands::Tree(args) => cmd_tree(args, &config),
        Commands::Check(args) => cmd_check(args, &config),
        Commands::Query(args) => cmd_query(args, &config),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Load a snapshot file through the paged loader. Ctrl-C abandons the load.
fn load_snapshot(path: &Path, config: &Config) -> Result<LoadOutcome, Box<dyn std::error::Error>> {
    let source = SnapshotSource::open(path)?;
    let loader = Loader::new(config.load.clone(), config.store);
    let cancel = CancellationToken::new();

    let outcome = runtime()?.block_on(async {
        let interrupt = cancel.clone();
        tokio::select! {
            outcome = loader.run(&source, &source, &cancel) => outcome,
            _ = tokio::signal::ctrl_c() => {
                interrupt.cancel();
                Err(LoadError::Cancelled)
            }
        }
    })?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_gantt(args: GanttArgs, config: &Config) -> CmdResult {
    let outcome = load_snapshot(&args.snapshot, config)?;
    let options = ChartOptions {
        view_mode: args.view.unwrap_or(config.chart.view_mode),
        language: config.chart.language.clone(),
    };
    let mut chart = TextTimeline::new(args.width);
    runtime()?.block_on(render::render_chart(
        &mut chart,
        &outcome.records,
        &options,
        RetryPolicy::from(config.render),
    ))?;
    print!("{}", chart.output());
    Ok(())
}

fn cmd_list(args: ListArgs, config: &Config) -> CmdResult {
    let outcome = load_snapshot(&args.snapshot, config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    } else {
        for record in &outcome.records {
            println!("{}", format_record_line(record));
        }
    }
    Ok(())
}

fn cmd_tree(args: SnapshotArgs, config: &Config) -> CmdResult {
    let outcome = load_snapshot(&args.snapshot, config)?;
    print!("{}", outcome.store.dump());
    Ok(())
}

fn cmd_check(args: CheckArgs, config: &Config) -> CmdResult {
    let outcome = load_snapshot(&args.snapshot, config)?;
    let report = &outcome.report;

    if args.json {
        let check = CheckJson::new(report, outcome.store.len(), outcome.records.len());
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        println!(
            "{} entities, {} rendered, {} pages, {} skipped",
            outcome.store.len(),
            outcome.records.len(),
            report.pages,
            report.skipped
        );
        if report.pending.is_empty() {
            println!("all entities attached");
        } else {
            println!("{} never attached:", report.pending.len());
            for entry in &report.pending {
                println!("  {}", format_pending_line(entry));
            }
        }
    }

    if args.strict && !report.pending.is_empty() {
        return Err(format!("{} entities never attached", report.pending.len()).into());
    }
    Ok(())
}

fn cmd_query(args: QueryArgs, config: &Config) -> CmdResult {
    let page_size = args.page_size.unwrap_or(config.load.page_size);
    println!("{}", build_descendant_query(&args.container, page_size));
    Ok(())
}
