//! Terminal dimension queries.

use terminal_size::{terminal_size, Height, Width};

/// Dimensions of the terminal in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalSize {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
}

impl TerminalSize {
    /// Create a size from columns and rows.
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub(crate) const fn pack(self) -> u32 {
        ((self.cols as u32) << 16) | self.rows as u32
    }

    pub(crate) const fn unpack(packed: u32) -> Self {
        Self {
            cols: (packed >> 16) as u16,
            rows: packed as u16,
        }
    }
}

/// Ask the OS for the size of the terminal attached to stdout.
///
/// Returns `None` when stdout is not a terminal.
pub fn query_size() -> Option<TerminalSize> {
    terminal_size().map(|(Width(cols), Height(rows))| TerminalSize { cols, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_roundtrip() {
        let size = TerminalSize::new(213, 57);
        assert_eq!(TerminalSize::unpack(size.pack()), size);
        assert_eq!(TerminalSize::unpack(0), TerminalSize::default());
    }
}
