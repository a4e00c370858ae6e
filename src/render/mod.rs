pub mod text;

pub use text::TextTimeline;

use std::time::Duration;

use crate::model::config::RenderConfig;
use crate::model::timeline::{BarStyle, RenderRecord};
use crate::model::view::ViewMode;

/// Error type for the render collaborator
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("chart not ready after {attempts} attempts")]
    NotReady { attempts: u32 },
    #[error("render failed: {0}")]
    Failed(String),
}

/// Options handed to the widget with the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Granularity as requested; widgets draw `view_mode.effective()`
    pub view_mode: ViewMode,
    pub language: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            view_mode: ViewMode::Day,
            language: "en".to_string(),
        }
    }
}

/// A timeline widget.
pub trait TimelineRenderer {
    fn render(&mut self, records: &[RenderRecord], options: &ChartOptions) -> Result<(), RenderError>;

    /// Switch granularity. Only called with natively supported modes.
    fn change_view_mode(&mut self, mode: ViewMode) -> Result<(), RenderError>;

    /// True once the bars exist and can be styled.
    fn is_ready(&self) -> bool;

    fn apply_styles(&mut self, styles: &[BarStyle]);
}

/// How long to wait for the widget to become stylable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl From<RenderConfig> for RetryPolicy {
    fn from(config: RenderConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Poll the widget until it is ready, then apply each record's style classes.
/// Returns how many bars were styled.
pub async fn stabilize_and_style(
    renderer: &mut dyn TimelineRenderer,
    records: &[RenderRecord],
    retry: RetryPolicy,
) -> Result<usize, RenderError> {
    let attempts = retry.max_attempts.max(1);
    for attempt in 1..=attempts {
        if renderer.is_ready() {
            let styles: Vec<BarStyle> = records.iter().filter_map(BarStyle::for_record).collect();
            renderer.apply_styles(&styles);
            tracing::debug!(attempt, styled = styles.len(), "chart styled");
            return Ok(styles.len());
        }
        if attempt < attempts {
            tracing::trace!(attempt, "chart not ready, retrying");
            tokio::time::sleep(retry.interval).await;
        }
    }
    Err(RenderError::NotReady { attempts })
}

/// Render the records and style them once the widget settles.
pub async fn render_chart(
    renderer: &mut dyn TimelineRenderer,
    records: &[RenderRecord],
    options: &ChartOptions,
    retry: RetryPolicy,
) -> Result<usize, RenderError> {
    renderer.render(records, options)?;
    stabilize_and_style(renderer, records, retry).await
}

/// Change zoom, mapping unsupported granularities to the nearest native one,
/// then restyle.
pub async fn change_view(
    renderer: &mut dyn TimelineRenderer,
    records: &[RenderRecord],
    requested: ViewMode,
    retry: RetryPolicy,
) -> Result<ViewMode, RenderError> {
    let effective = requested.effective();
    if effective != requested {
        tracing::debug!(%requested, %effective, "view mode approximated");
    }
    renderer.change_view_mode(effective)?;
    stabilize_and_style(renderer, records, retry).await?;
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityType;
    use crate::model::timeline::StyleTag;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Becomes ready after a fixed number of polls.
    #[derive(Default)]
    struct SlowWidget {
        ready_after: u32,
        polls: Cell<u32>,
        modes: Vec<ViewMode>,
        styled: Vec<BarStyle>,
    }

    impl TimelineRenderer for SlowWidget {
        fn render(&mut self, _: &[RenderRecord], options: &ChartOptions) -> Result<(), RenderError> {
            self.modes.push(options.view_mode.effective());
            Ok(())
        }

        fn change_view_mode(&mut self, mode: ViewMode) -> Result<(), RenderError> {
            self.modes.push(mode);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.polls.set(self.polls.get() + 1);
            self.polls.get() > self.ready_after
        }

        fn apply_styles(&mut self, styles: &[BarStyle]) {
            self.styled = styles.to_vec();
        }
    }

    fn record(id: &str, ty: &str) -> RenderRecord {
        RenderRecord {
            id: id.into(),
            name: id.into(),
            start: None,
            end: None,
            progress: 0.0,
            style: StyleTag::for_type(&EntityType::new(ty)),
        }
    }

    fn retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            interval: Duration::from_millis(16),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_styles_once_ready() {
        let mut widget = SlowWidget {
            ready_after: 3,
            ..SlowWidget::default()
        };
        let records = vec![record("p", "program"), record("x", "")];
        let styled = render_chart(&mut widget, &records, &ChartOptions::default(), retry(10))
            .await
            .unwrap();
        assert_eq!(styled, 1);
        assert_eq!(widget.polls.get(), 4);
        assert_eq!(
            widget.styled,
            vec![BarStyle {
                id: "p".into(),
                bar_class: "program-bar".into(),
                progress_class: "program-progress".into(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_bounded_attempts() {
        let mut widget = SlowWidget {
            ready_after: u32::MAX,
            ..SlowWidget::default()
        };
        let err = stabilize_and_style(&mut widget, &[], retry(5)).await.unwrap_err();
        assert!(matches!(err, RenderError::NotReady { attempts: 5 }));
        assert_eq!(widget.polls.get(), 5);
        assert!(widget.styled.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_view_maps_quarter_to_month() {
        let mut widget = SlowWidget::default();
        let mode = change_view(&mut widget, &[], ViewMode::Quarter, retry(3))
            .await
            .unwrap();
        assert_eq!(mode, ViewMode::Month);
        assert_eq!(widget.modes, vec![ViewMode::Month]);
    }

    #[test]
    fn test_retry_from_config() {
        let policy = RetryPolicy::from(RenderConfig {
            max_attempts: 4,
            interval_ms: 100,
        });
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.interval, Duration::from_millis(100));
    }
}
