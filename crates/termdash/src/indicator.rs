//! A ready-made progress line.
//!
//! [`ProgressIndicator`] ties a [`ProgressData`] to a row of widgets. Work on
//! any thread reports progress through [`ProgressIndicator::set_value`]; every
//! update is published as a [`ProgressSnapshot`] on
//! [`ProgressIndicator::value_changed`], which the row's widgets listen to.
//!
//! ```
//! use termdash::indicator::ProgressIndicator;
//!
//! let indicator = ProgressIndicator::with_default_widgets("archive.tar");
//! indicator.set_range(0.0, 2048.0);
//! indicator.set_value(1024.0);
//! assert_eq!(indicator.data().percentage(), 50.0);
//! ```

use std::sync::Arc;

use termdash_core::format::{format_binary_unit, format_duration, format_percentage};
use termdash_core::{EtaStrategy, ProgressData, ProgressSnapshot, RateStrategy, Signal};

use crate::application::Application;
use crate::geometry::SizePolicy;
use crate::layout::BoxLayout;
use crate::widget::Widget;
use crate::widgets::{Ellipsize, HORIZONTAL_BLOCKS};

/// Columns given to the number in rate labels.
const RATE_WIDTH: usize = 5;

/// Natural width of the default bar.
const DEFAULT_BAR_SIZE: usize = 10;

/// One dashboard line showing the progress of a task.
pub struct ProgressIndicator {
    root: Arc<Widget>,
    layout: Arc<BoxLayout>,
    data: Arc<ProgressData>,
    value_changed: Signal<ProgressSnapshot>,
}

impl ProgressIndicator {
    /// Create an indicator with an empty row, one column between widgets.
    pub fn new() -> Self {
        let root = Widget::container();
        root.set_name("progress-indicator");
        let layout = BoxLayout::new();
        layout.set_spacing(1);
        root.install_layout(layout.clone());
        Self {
            root,
            layout,
            data: Arc::new(ProgressData::new()),
            value_changed: Signal::new(),
        }
    }

    /// Create an indicator showing, left to right: `title`, the percentage,
    /// a bar, the rate and the ETA.
    pub fn with_default_widgets(title: impl Into<String>) -> Self {
        let indicator = Self::new();

        let title = Widget::label(title);
        if let Some(mut label) = title.as_label() {
            label.set_ellipsize(Ellipsize::End);
        }
        indicator.push_back(title);

        indicator.push_label(format_percentage(0.0), |snapshot| {
            format_percentage(snapshot.percentage)
        });

        let bar = Widget::bar();
        if let Some(mut state) = bar.as_bar() {
            state.set_size(DEFAULT_BAR_SIZE);
            state.set_frames(HORIZONTAL_BLOCKS);
        }
        bar.set_size_policy(SizePolicy::fixed());
        let weak = Arc::downgrade(&bar);
        indicator.value_changed.connect(move |snapshot| {
            if let Some(bar) = weak.upgrade() {
                if let Some(mut state) = bar.as_bar() {
                    state.set_percentage(snapshot.percentage);
                }
            }
        });
        indicator.push_back(bar);

        indicator.push_label(format_binary_unit(0.0, "B/s", RATE_WIDTH), |snapshot| {
            format_binary_unit(snapshot.rate, "B/s", RATE_WIDTH)
        });
        indicator.push_label(format_duration(None), |snapshot| {
            format_duration(snapshot.eta)
        });

        indicator
    }

    /// Append a fixed-width label whose text is recomputed from every
    /// snapshot.
    fn push_label<F>(&self, initial: String, text: F)
    where
        F: Fn(&ProgressSnapshot) -> String + Send + Sync + 'static,
    {
        let label = Widget::label(initial);
        label.set_size_policy(SizePolicy::fixed());
        let weak = Arc::downgrade(&label);
        self.value_changed.connect(move |snapshot| {
            if let Some(label) = weak.upgrade() {
                if let Err(err) = label.set_text(text(snapshot)) {
                    tracing::warn!(target: "termdash::widget", error = %err, "progress label not updated");
                }
            }
        });
        self.push_back(label);
    }

    /// The container widget holding the row.
    pub fn root(&self) -> &Arc<Widget> {
        &self.root
    }

    /// The layout arranging the row.
    pub fn layout(&self) -> &Arc<BoxLayout> {
        &self.layout
    }

    /// The progress model.
    pub fn data(&self) -> &Arc<ProgressData> {
        &self.data
    }

    /// Emitted with a snapshot after every value or range change.
    pub fn value_changed(&self) -> &Signal<ProgressSnapshot> {
        &self.value_changed
    }

    /// Record a new value and publish a snapshot.
    pub fn set_value(&self, value: f64) {
        self.data.update(value);
        self.value_changed.emit(self.data.snapshot());
    }

    /// Change the range and publish a snapshot.
    pub fn set_range(&self, min: f64, max: f64) {
        self.data.set_range(min, max);
        self.value_changed.emit(self.data.snapshot());
    }

    /// Replace the rate estimator. `None` disables rate estimation.
    pub fn set_rate_strategy(&self, strategy: Option<Box<dyn RateStrategy>>) {
        self.data.set_rate_strategy(strategy);
    }

    /// Replace the ETA estimator. `None` disables ETA estimation.
    pub fn set_eta_strategy(&self, strategy: Option<Box<dyn EtaStrategy>>) {
        self.data.set_eta_strategy(strategy);
    }

    /// Append a widget to the row.
    pub fn push_back(&self, widget: Arc<Widget>) {
        self.layout.push_back(widget);
    }

    /// Prepend a widget to the row.
    pub fn push_front(&self, widget: Arc<Widget>) {
        self.layout.push_front(widget);
    }

    /// Set the columns between widgets.
    pub fn set_spacing(&self, spacing: usize) {
        self.layout.set_spacing(spacing);
    }

    /// Show the row as a line of `app`.
    pub fn start(&self, app: &Application) {
        app.add_widget(self.root.clone());
    }

    /// Draw the row one last time and remove it from the dashboard. Its final
    /// state stays on screen above the remaining lines.
    pub fn stop(&self) {
        self.root.queue_render();
        self.root.close();
    }
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressIndicator")
            .field("root", &self.root.id())
            .field("value", &self.data.value())
            .field("percentage", &self.data.percentage())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ProgressIndicator: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn texts(indicator: &ProgressIndicator) -> Vec<String> {
        indicator
            .layout()
            .widgets()
            .iter()
            .filter_map(|widget| widget.as_label().map(|label| label.text().to_owned()))
            .collect()
    }

    #[test]
    fn test_default_widgets() {
        let indicator = ProgressIndicator::with_default_widgets("file.bin");
        assert_eq!(indicator.layout().len(), 5);
        assert_eq!(indicator.root().children().len(), 5);
        assert_eq!(
            texts(&indicator),
            vec!["file.bin", "  0%", "0.000   B/s", "--:--:--"]
        );
    }

    #[test]
    fn test_default_widgets_configured() {
        let indicator = ProgressIndicator::with_default_widgets("file.bin");
        let title = indicator.layout().item(0).unwrap();
        let title = title.as_widget().unwrap();
        assert_eq!(title.as_label().unwrap().ellipsize(), Ellipsize::End);

        let bar = indicator.layout().item(2).unwrap();
        let bar = bar.as_widget().unwrap();
        let state = bar.as_bar().unwrap();
        assert_eq!(state.size(), DEFAULT_BAR_SIZE);
        assert_eq!(state.frames().len(), HORIZONTAL_BLOCKS.len());
    }

    #[test]
    fn test_widgets_follow_value() {
        let indicator = ProgressIndicator::with_default_widgets("file.bin");
        indicator.set_range(0.0, 200.0);
        indicator.set_value(0.0);
        indicator.set_value(50.0);

        assert_eq!(texts(&indicator)[1], " 25%");
        let bar = indicator.layout().item(2).unwrap();
        let bar = bar.as_widget().unwrap();
        assert_eq!(bar.as_bar().unwrap().percentage(), 25.0);
    }

    #[test]
    fn test_value_changed_emits_snapshots() {
        let indicator = ProgressIndicator::new();
        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = emitted.clone();
        indicator.value_changed().connect(move |snapshot| {
            assert!(snapshot.value <= snapshot.max);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        indicator.set_range(0.0, 10.0);
        indicator.set_value(4.0);
        indicator.set_value(40.0);
        assert_eq!(emitted.load(Ordering::SeqCst), 3);
        assert_eq!(indicator.data().value(), 10.0);
        assert_eq!(indicator.data().percentage(), 100.0);
    }

    #[test]
    fn test_stop_without_application_closes_row() {
        let indicator = ProgressIndicator::with_default_widgets("x");
        indicator.stop();
        assert!(indicator.root().is_closed());
    }
}
