use std::collections::HashMap;

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use super::{ChartOptions, RenderError, TimelineRenderer};
use crate::model::timeline::{BarStyle, RenderRecord};
use crate::model::view::ViewMode;

/// Terminal timeline: one row per record with a bar on a shared date axis.
#[derive(Debug)]
pub struct TextTimeline {
    max_columns: usize,
    records: Vec<RenderRecord>,
    options: ChartOptions,
    view: ViewMode,
    styles: HashMap<String, BarStyle>,
    rendered: bool,
}

impl TextTimeline {
    pub fn new(max_columns: usize) -> Self {
        TextTimeline {
            max_columns,
            records: Vec::new(),
            options: ChartOptions::default(),
            view: ViewMode::Day,
            styles: HashMap::new(),
            rendered: false,
        }
    }

    /// Current view as text.
    pub fn output(&self) -> String {
        let mut out = format!("{} view", self.view);
        if self.options.view_mode != self.view {
            out.push_str(&format!(" (requested {})", self.options.view_mode));
        }
        out.push_str(&format!(", {}\n", self.options.language));

        if self.records.is_empty() {
            out.push_str("(no schedule items)\n");
            return out;
        }

        let name_width = self
            .records
            .iter()
            .map(|r| r.name.width())
            .max()
            .unwrap_or(0);
        let origin = self
            .records
            .iter()
            .flat_map(|r| [r.start, r.end])
            .flatten()
            .min();

        for record in &self.records {
            let padding = " ".repeat(name_width - record.name.width());
            let bar = match (origin, span(record)) {
                (Some(origin), Some((start, end))) => self.bar(record, origin, start, end),
                _ => String::new(),
            };
            let line = format!(
                "{}{}  {:<10}  {:<10}  {:>5.1}%  |{}",
                record.name,
                padding,
                fmt_date(record.start),
                fmt_date(record.end),
                record.progress,
                bar
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    fn bar(&self, record: &RenderRecord, origin: NaiveDate, start: NaiveDate, end: NaiveDate) -> String {
        let from = column((start - origin).num_days(), self.view);
        let to = column((end - origin).num_days() + 1, self.view);
        let len = (to - from).max(1);
        let glyph = self.glyph(&record.id);
        std::iter::repeat_n(' ', from)
            .chain(std::iter::repeat_n(glyph, len))
            .take(self.max_columns)
            .collect()
    }

    fn glyph(&self, id: &str) -> char {
        match self.styles.get(id).map(|s| s.bar_class.as_str()) {
            None => '=',
            Some("program-bar") => '█',
            Some("project-bar") => '▓',
            Some("milestone-bar") => '◆',
            Some("task-bar") => '▒',
            Some(_) => '░',
        }
    }
}

impl TimelineRenderer for TextTimeline {
    fn render(&mut self, records: &[RenderRecord], options: &ChartOptions) -> Result<(), RenderError> {
        self.records = records.to_vec();
        self.options = options.clone();
        self.view = options.view_mode.effective();
        self.styles.clear();
        self.rendered = true;
        Ok(())
    }

    fn change_view_mode(&mut self, mode: ViewMode) -> Result<(), RenderError> {
        if !self.rendered {
            return Err(RenderError::Failed("nothing rendered yet".into()));
        }
        self.options.view_mode = mode;
        self.view = mode.effective();
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.rendered
    }

    fn apply_styles(&mut self, styles: &[BarStyle]) {
        self.styles = styles.iter().map(|s| (s.id.clone(), s.clone())).collect();
    }
}

/// Start and end of the bar; a record with only one date is a one-day bar.
fn span(record: &RenderRecord) -> Option<(NaiveDate, NaiveDate)> {
    let start = record.start.or(record.end)?;
    let end = record.end.or(record.start)?;
    Some((start, end.max(start)))
}

/// Column for a day offset at the given granularity.
fn column(days: i64, view: ViewMode) -> usize {
    let days = days.max(0) as usize;
    match view.effective() {
        ViewMode::Hour => days * 24,
        ViewMode::Week => days / 7,
        ViewMode::Month | ViewMode::Quarter | ViewMode::Year => days / 30,
        ViewMode::Day => days,
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityType;
    use crate::model::timeline::StyleTag;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(id: &str, name: &str, ty: &str, start: Option<&str>, end: Option<&str>) -> RenderRecord {
        RenderRecord {
            id: id.into(),
            name: name.into(),
            start: start.map(date),
            end: end.map(date),
            progress: 0.0,
            style: StyleTag::for_type(&EntityType::new(ty)),
        }
    }

    fn sample() -> Vec<RenderRecord> {
        vec![
            record("R", "🚀 R", "program", Some("2024-01-01"), Some("2024-01-03")),
            record("A", "✅ A", "task", Some("2024-01-02"), Some("2024-01-02")),
        ]
    }

    #[test]
    fn test_day_view_with_styles() {
        let records = sample();
        let mut chart = TextTimeline::new(80);
        chart.render(&records, &ChartOptions::default()).unwrap();
        let styles: Vec<BarStyle> = records.iter().filter_map(BarStyle::for_record).collect();
        chart.apply_styles(&styles);

        assert_eq!(
            chart.output(),
            "Day view, en\n\
             🚀 R  2024-01-01  2024-01-03    0.0%  |███\n\
             ✅ A  2024-01-02  2024-01-02    0.0%  | ▒\n"
        );
    }

    #[test]
    fn test_unstyled_and_unscheduled_rows() {
        let records = vec![
            record("a", "alpha", "", Some("2024-01-01"), None),
            record("b", "b", "", None, None),
        ];
        let mut chart = TextTimeline::new(80);
        chart.render(&records, &ChartOptions::default()).unwrap();
        let output = chart.output();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "alpha  2024-01-01  -             0.0%  |=");
        assert_eq!(lines[2], "b      -           -             0.0%  |");
    }

    #[test]
    fn test_quarter_request_draws_month() {
        let mut chart = TextTimeline::new(80);
        let options = ChartOptions {
            view_mode: ViewMode::Quarter,
            language: "en".into(),
        };
        chart.render(&sample(), &options).unwrap();
        assert!(chart.output().starts_with("Month view (requested Quarter), en\n"));
    }

    #[test]
    fn test_bars_are_clipped() {
        let records = vec![record("x", "x", "task", Some("2024-01-01"), Some("2024-12-31"))];
        let mut chart = TextTimeline::new(10);
        chart.render(&records, &ChartOptions::default()).unwrap();
        let output = chart.output();
        let bar = output.lines().nth(1).unwrap().split('|').nth(1).unwrap();
        assert_eq!(bar.chars().count(), 10);
    }

    #[test]
    fn test_change_view_before_render_fails() {
        let mut chart = TextTimeline::new(80);
        assert!(!chart.is_ready());
        assert!(chart.change_view_mode(ViewMode::Week).is_err());
    }

    #[test]
    fn test_column_scales() {
        assert_eq!(column(2, ViewMode::Hour), 48);
        assert_eq!(column(14, ViewMode::Week), 2);
        assert_eq!(column(61, ViewMode::Year), 2);
        assert_eq!(column(-3, ViewMode::Day), 0);
    }
}
