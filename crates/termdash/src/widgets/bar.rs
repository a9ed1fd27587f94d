//! Progress bar drawn with block characters.
//!
//! The bar fills proportionally to a percentage. With fractional frames, the
//! cell at the fill boundary shows a partial block, giving sub-cell precision.
//!
//! # Example
//!
//! ```
//! use termdash::widgets::{Bar, HORIZONTAL_BLOCKS};
//!
//! let mut bar = Bar::new().with_size(10);
//! bar.set_frames(HORIZONTAL_BLOCKS);
//! bar.set_percentage(42.0);
//! assert_eq!(bar.natural_size(), 10);
//! ```

use std::io;

use crossterm::style::ContentStyle;
use unicode_width::UnicodeWidthStr;

use crate::writer::TerminalWriter;

/// Left-to-right partial blocks, from one eighth to a full cell.
pub const HORIZONTAL_BLOCKS: &[&str] = &["▏", "▎", "▍", "▌", "▋", "▊", "▉", "▉", "▉", "█"];

/// Bottom-to-top partial blocks, from one eighth to a full cell.
pub const VERTICAL_BLOCKS: &[&str] = &["▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Styles for each segment of a [`Bar`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BarStyle {
    /// Left separator.
    pub left: ContentStyle,
    /// Filled cells, including a fractional cell.
    pub complete: ContentStyle,
    /// Empty cells.
    pub incomplete: ContentStyle,
    /// Right separator.
    pub right: ContentStyle,
}

/// How an allocation splits into filled, partial and empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarCells {
    /// Cells between the separators.
    pub bar_size: usize,
    /// Fully filled cells.
    pub complete: usize,
    /// Index into the fractional frames for the boundary cell, if drawn.
    pub fractional: Option<usize>,
    /// Empty cells.
    pub incomplete: usize,
}

/// A horizontal progress bar.
#[derive(Debug, Clone)]
pub struct Bar {
    size: usize,
    percentage: f64,
    frames: Vec<String>,
    complete: String,
    lead: String,
    incomplete: String,
    left: String,
    right: String,
    style: BarStyle,
}

impl Bar {
    /// Natural width of a new bar.
    pub const DEFAULT_SIZE: usize = 40;

    /// Create an empty `[===>   ]` style bar.
    pub fn new() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            percentage: 0.0,
            frames: Vec::new(),
            complete: "=".into(),
            lead: ">".into(),
            incomplete: " ".into(),
            left: "[".into(),
            right: "]".into(),
            style: BarStyle::default(),
        }
    }

    /// Set the natural width, separators included.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the natural width, separators included.
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    /// Natural width, separators included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Set the fill level, clamped to `0..=100`. NaN reads as empty.
    pub fn set_percentage(&mut self, percentage: f64) {
        self.percentage = if percentage.is_nan() {
            0.0
        } else {
            percentage.clamp(0.0, 100.0)
        };
    }

    /// Fill level in percent.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Use `frames` for filled cells. The last frame is a full cell; the
    /// others draw the partially filled boundary cell. An empty list falls
    /// back to the complete and lead symbols.
    pub fn set_frames<S: AsRef<str>>(&mut self, frames: &[S]) {
        self.frames = frames.iter().map(|f| f.as_ref().to_owned()).collect();
    }

    /// Fractional frames.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Set the symbols used without fractional frames.
    pub fn set_symbols(
        &mut self,
        complete: impl Into<String>,
        lead: impl Into<String>,
        incomplete: impl Into<String>,
    ) {
        self.complete = complete.into();
        self.lead = lead.into();
        self.incomplete = incomplete.into();
    }

    /// Set the separators around the cells. Either may be empty.
    pub fn set_separators(&mut self, left: impl Into<String>, right: impl Into<String>) {
        self.left = left.into();
        self.right = right.into();
    }

    /// Set the segment styles.
    pub fn set_style(&mut self, style: BarStyle) {
        self.style = style;
    }

    /// Segment styles.
    pub fn style(&self) -> BarStyle {
        self.style
    }

    fn separators_width(&self) -> usize {
        self.left.width() + self.right.width()
    }

    /// Separators plus room for the fill symbols.
    pub fn minimum_size(&self) -> usize {
        let fill = if self.frames.is_empty() {
            self.complete.width()
        } else {
            self.frames.len()
        };
        self.separators_width() + fill
    }

    /// The configured size.
    pub fn natural_size(&self) -> usize {
        self.size
    }

    /// Split `allocated` columns into cells for the current percentage.
    pub fn cells(&self, allocated: usize) -> BarCells {
        let separators = self.separators_width();
        if allocated <= separators {
            return BarCells::default();
        }
        let bar_size = allocated - separators;
        let done = self.percentage / 100.0 * bar_size as f64;
        let complete = (done.floor() as usize).min(bar_size);
        let fraction = done - complete as f64;
        let mut incomplete = bar_size - complete;

        let frame_count = self.frames.len();
        let mut fractional = None;
        if frame_count > 0 && incomplete > 0 && fraction >= 1.0 / frame_count as f64 {
            let index = (fraction * frame_count as f64).floor() as usize;
            fractional = Some(index.saturating_sub(1).min(frame_count - 1));
            incomplete -= 1;
        }

        BarCells {
            bar_size,
            complete,
            fractional,
            incomplete,
        }
    }

    /// Draw exactly `allocated` columns.
    pub fn render(&self, writer: &mut TerminalWriter, allocated: usize) -> io::Result<()> {
        let cells = self.cells(allocated);
        if cells.bar_size == 0 {
            return writer.write_spaces(allocated);
        }

        writer.write_styled(&self.left, self.style.left)?;
        if let Some(full) = self.frames.last() {
            writer.write_styled(&full.repeat(cells.complete), self.style.complete)?;
            if let Some(index) = cells.fractional {
                writer.write_styled(&self.frames[index], self.style.complete)?;
            }
        } else if cells.complete > 0 {
            let mut filled = self.complete.repeat(cells.complete - 1);
            filled.push_str(&self.lead);
            writer.write_styled(&filled, self.style.complete)?;
        }
        writer.write_styled(&self.incomplete.repeat(cells.incomplete), self.style.incomplete)?;
        writer.write_styled(&self.right, self.style.right)
    }
}

impl Default for Bar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::tests::SharedBuffer;

    fn rendered(bar: &Bar, allocated: usize) -> String {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        bar.render(&mut writer, allocated).unwrap();
        writer.flush().unwrap();
        buffer.contents()
    }

    #[test]
    fn test_cells_without_frames() {
        let mut bar = Bar::new();
        bar.set_percentage(50.0);
        let cells = bar.cells(12);
        assert_eq!(cells.bar_size, 10);
        assert_eq!(cells.complete, 5);
        assert_eq!(cells.fractional, None);
        assert_eq!(cells.incomplete, 5);
        assert!(rendered(&bar, 12).contains("====>"));
    }

    #[test]
    fn test_cells_with_fractional_frame() {
        let mut bar = Bar::new();
        bar.set_frames(VERTICAL_BLOCKS);
        bar.set_percentage(55.0);
        // 5.5 cells done: 5 full, the boundary cell at 4/8.
        let cells = bar.cells(12);
        assert_eq!(cells.complete, 5);
        assert_eq!(cells.fractional, Some(3));
        assert_eq!(cells.incomplete, 4);
        assert!(rendered(&bar, 12).contains("█████▄"));
    }

    #[test]
    fn test_tiny_fraction_is_not_drawn() {
        let mut bar = Bar::new();
        bar.set_frames(VERTICAL_BLOCKS);
        bar.set_percentage(1.0);
        let cells = bar.cells(12);
        assert_eq!(cells.complete, 0);
        assert_eq!(cells.fractional, None);
        assert_eq!(cells.incomplete, 10);
    }

    #[test]
    fn test_full_and_empty() {
        let mut bar = Bar::new();
        bar.set_frames(HORIZONTAL_BLOCKS);
        bar.set_percentage(100.0);
        let cells = bar.cells(12);
        assert_eq!((cells.complete, cells.fractional, cells.incomplete), (10, None, 0));

        bar.set_percentage(f64::NAN);
        assert_eq!(bar.percentage(), 0.0);
        assert_eq!(bar.cells(12).incomplete, 10);
    }

    #[test]
    fn test_allocation_below_separators() {
        let bar = Bar::new();
        assert_eq!(bar.cells(2), BarCells::default());
        assert_eq!(rendered(&bar, 2), "  ");
    }

    #[test]
    fn test_sizes() {
        let mut bar = Bar::new().with_size(10);
        assert_eq!(bar.natural_size(), 10);
        assert_eq!(bar.minimum_size(), 3);
        bar.set_frames(VERTICAL_BLOCKS);
        assert_eq!(bar.minimum_size(), 10);
        bar.set_separators("", "");
        assert_eq!(bar.minimum_size(), 8);
    }
}
