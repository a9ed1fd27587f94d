//! Single-line text.
//!
//! A label fits its text to the width it is given: slack is distributed
//! according to its [`Alignment`], and text that does not fit is shortened
//! with `...` according to its [`Ellipsize`] mode.

use std::io;

use crossterm::style::ContentStyle;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::geometry::Alignment;
use crate::writer::TerminalWriter;

const ELLIPSIS: &str = "...";

/// Where text that does not fit is shortened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ellipsize {
    /// Keep the end: `...ding`.
    Start,
    /// Keep both ends: `lo...ng`.
    Middle,
    /// Keep the beginning: `long...`.
    #[default]
    End,
}

/// Text with padding, alignment and ellipsizing.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
    padding: usize,
    size_override: Option<usize>,
    ellipsize: Ellipsize,
    alignment: Alignment,
    style: ContentStyle,
}

impl Label {
    /// Create a label showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Displayed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the displayed text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Blank columns on each side of the text.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Set the blank columns on each side of the text.
    pub fn set_padding(&mut self, padding: usize) {
        self.padding = padding;
    }

    /// Force the natural width instead of deriving it from the text.
    pub fn set_size_override(&mut self, size: Option<usize>) {
        self.size_override = size;
    }

    /// Forced natural width, if any.
    pub fn size_override(&self) -> Option<usize> {
        self.size_override
    }

    /// Where over-long text is shortened.
    pub fn ellipsize(&self) -> Ellipsize {
        self.ellipsize
    }

    /// Set where over-long text is shortened.
    pub fn set_ellipsize(&mut self, mode: Ellipsize) {
        self.ellipsize = mode;
    }

    /// Placement of the text within its allocation.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Set the placement of the text within its allocation.
    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    /// Text style.
    pub fn style(&self) -> ContentStyle {
        self.style
    }

    /// Set the text style.
    pub fn set_style(&mut self, style: ContentStyle) {
        self.style = style;
    }

    /// Text width plus padding, unless overridden.
    pub fn natural_size(&self) -> usize {
        self.size_override
            .unwrap_or_else(|| self.text.width() + 2 * self.padding)
    }

    /// Room for the ellipsis and the padding.
    pub fn minimum_size(&self) -> usize {
        self.natural_size().min(ELLIPSIS.len() + 2 * self.padding)
    }

    /// The columns drawn for an allocation of `allocated`, as
    /// `(leading blanks, text, trailing blanks)`.
    pub fn fit(&self, allocated: usize) -> (usize, String, usize) {
        if allocated < ELLIPSIS.len() && self.text.width() > allocated {
            return (0, ".".repeat(allocated), 0);
        }
        let padding = if allocated >= 2 * self.padding + 1 {
            self.padding
        } else {
            0
        };
        let inner = allocated - 2 * padding;
        let text = ellipsize(&self.text, inner, self.ellipsize);
        let (left, right) = self.alignment.split(inner - text.width());
        (padding + left, text, right + padding)
    }

    /// Draw exactly `allocated` columns.
    pub fn render(&self, writer: &mut TerminalWriter, allocated: usize) -> io::Result<()> {
        let (leading, text, trailing) = self.fit(allocated);
        writer.write_spaces(leading)?;
        writer.write_styled(&text, self.style)?;
        writer.write_spaces(trailing)
    }
}

/// Shorten `text` to at most `width` columns.
fn ellipsize(text: &str, width: usize, mode: Ellipsize) -> String {
    if text.width() <= width {
        return text.to_owned();
    }
    if width <= ELLIPSIS.len() {
        return ".".repeat(width);
    }

    let keep = width - ELLIPSIS.len();
    match mode {
        Ellipsize::End => format!("{}{ELLIPSIS}", prefix(text, keep)),
        Ellipsize::Start => format!("{ELLIPSIS}{}", suffix(text, keep)),
        Ellipsize::Middle => {
            let head = keep.div_ceil(2);
            format!("{}{ELLIPSIS}{}", prefix(text, head), suffix(text, keep - head))
        }
    }
}

/// Longest prefix of `text` at most `width` columns wide.
fn prefix(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (index, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &text[..index];
        }
    }
    text
}

/// Longest suffix of `text` at most `width` columns wide.
fn suffix(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (index, ch) in text.char_indices().rev() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &text[index + ch.len_utf8()..];
        }
    }
    text
}
