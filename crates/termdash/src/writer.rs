//! Frame-buffered terminal output.
//!
//! [`TerminalWriter`] accumulates one frame of output in memory using
//! `crossterm` commands and hands it to the underlying sink in a single write
//! when the frame ends. Frames are drawn in place: each new frame moves the
//! cursor back to the first line of the previous one, so a dashboard with
//! several root widgets redraws the same block of lines.
//!
//! Lines can be committed with [`TerminalWriter::commit_lines`]. Committed
//! lines become regular scrollback and are not redrawn by later frames, which
//! is how closed root widgets leave their final state on screen.

use std::io::{self, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::{ContentStyle, Print, PrintStyledContent, StyledContent};
use crossterm::terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap};

/// Buffered writer drawing dashboard frames onto a terminal.
pub struct TerminalWriter {
    out: Box<dyn Write + Send>,
    frame: Vec<u8>,
    /// Lines in the redrawable region of the last flushed frame.
    drawn_lines: usize,
    /// Lines written so far in the current frame.
    current_line: usize,
    /// Lines of the current frame that were committed to scrollback.
    committed_lines: usize,
    line_wrap_disabled: bool,
}

impl TerminalWriter {
    /// Create a writer drawing onto `out`.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            frame: Vec::with_capacity(4096),
            drawn_lines: 0,
            current_line: 0,
            committed_lines: 0,
            line_wrap_disabled: false,
        }
    }

    /// Create a writer drawing onto stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Turn off autowrap so over-long lines are truncated instead of wrapped.
    pub fn disable_line_wrap(&mut self) -> io::Result<()> {
        queue!(self.out, DisableLineWrap)?;
        self.out.flush()?;
        self.line_wrap_disabled = true;
        Ok(())
    }

    /// Restore autowrap if this writer turned it off.
    pub fn restore_line_wrap(&mut self) -> io::Result<()> {
        if self.line_wrap_disabled {
            queue!(self.out, EnableLineWrap)?;
            self.out.flush()?;
            self.line_wrap_disabled = false;
        }
        Ok(())
    }

    /// Returns `true` while autowrap is turned off by this writer.
    pub fn is_line_wrap_disabled(&self) -> bool {
        self.line_wrap_disabled
    }

    /// Start a new frame at the top of the previous frame's region.
    pub fn begin_frame(&mut self) -> io::Result<()> {
        self.frame.clear();
        self.current_line = 0;
        self.committed_lines = 0;
        if self.drawn_lines > 1 {
            queue!(self.frame, MoveUp(to_u16(self.drawn_lines - 1)))?;
        }
        queue!(self.frame, MoveToColumn(0))
    }

    /// Start the next line of the current frame.
    pub fn begin_line(&mut self) -> io::Result<()> {
        if self.current_line > 0 {
            self.frame.extend_from_slice(b"\r\n");
        }
        self.current_line += 1;
        queue!(self.frame, MoveToColumn(0))
    }

    /// Turn every line written so far in this frame into scrollback.
    pub fn commit_lines(&mut self) {
        self.committed_lines = self.current_line;
    }

    /// Finish the frame: blank out lines the previous frame used but this one
    /// did not, then write the frame to the sink.
    pub fn end_frame(&mut self) -> io::Result<()> {
        let written = self.current_line;
        if written < self.drawn_lines {
            let stale = self.drawn_lines - written;
            let mut moved = 0;
            for line in 0..stale {
                if written > 0 || line > 0 {
                    self.frame.extend_from_slice(b"\r\n");
                    moved += 1;
                }
                queue!(self.frame, Clear(ClearType::CurrentLine))?;
            }
            if moved > 0 {
                queue!(self.frame, MoveUp(to_u16(moved)))?;
            }
        }
        self.drawn_lines = written - self.committed_lines;
        self.flush()
    }

    /// Move the cursor to `column` on the current line.
    pub fn move_to_column(&mut self, column: usize) -> io::Result<()> {
        queue!(self.frame, MoveToColumn(to_u16(column)))
    }

    /// Write unstyled text.
    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        queue!(self.frame, Print(text))
    }

    /// Write text with a style. A default style writes plain text.
    pub fn write_styled(&mut self, text: &str, style: ContentStyle) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        queue!(self.frame, PrintStyledContent(StyledContent::new(style, text)))
    }

    /// Write `count` spaces.
    pub fn write_spaces(&mut self, count: usize) -> io::Result<()> {
        self.frame.extend(std::iter::repeat_n(b' ', count));
        Ok(())
    }

    /// Erase from the cursor to the end of the current line.
    pub fn erase_to_end_of_line(&mut self) -> io::Result<()> {
        queue!(self.frame, Clear(ClearType::UntilNewLine))
    }

    /// Write everything buffered so far to the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.frame.is_empty() {
            self.out.write_all(&self.frame)?;
            self.frame.clear();
        }
        self.out.flush()
    }

    /// Leave the drawn region: move below the last line, restore autowrap
    /// and flush.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.drawn_lines > 0 {
            self.frame.extend_from_slice(b"\r\n");
            self.drawn_lines = 0;
        }
        self.flush()?;
        self.restore_line_wrap()
    }

    /// Lines in the region the next frame will redraw.
    pub fn drawn_lines(&self) -> usize {
        self.drawn_lines
    }
}

impl std::fmt::Debug for TerminalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalWriter")
            .field("buffered", &self.frame.len())
            .field("drawn_lines", &self.drawn_lines)
            .field("line_wrap_disabled", &self.line_wrap_disabled)
            .finish_non_exhaustive()
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// In-memory sink shared with the test.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(pub(crate) Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }

        pub(crate) fn clear(&self) {
            self.0.lock().clear();
        }
    }

    #[test]
    fn test_frame_is_written_on_end() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.begin_frame().unwrap();
        writer.begin_line().unwrap();
        writer.write_str("hello").unwrap();
        assert!(buffer.contents().is_empty());

        writer.end_frame().unwrap();
        let out = buffer.contents();
        assert!(out.contains("hello"));
        assert_eq!(writer.drawn_lines(), 1);
    }

    #[test]
    fn test_redraw_moves_up_over_previous_frame() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.begin_frame().unwrap();
        for text in ["a", "b", "c"] {
            writer.begin_line().unwrap();
            writer.write_str(text).unwrap();
        }
        writer.end_frame().unwrap();
        buffer.clear();

        writer.begin_frame().unwrap();
        writer.end_frame().unwrap();
        // Cursor up two lines to the first line of the region.
        assert!(buffer.contents().starts_with("\x1b[2A"));
    }

    #[test]
    fn test_stale_lines_are_cleared() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.begin_frame().unwrap();
        writer.begin_line().unwrap();
        writer.begin_line().unwrap();
        writer.end_frame().unwrap();
        buffer.clear();

        writer.begin_frame().unwrap();
        writer.begin_line().unwrap();
        writer.write_str("only").unwrap();
        writer.end_frame().unwrap();
        let out = buffer.contents();
        assert!(out.contains("\x1b[2K"));
        assert_eq!(writer.drawn_lines(), 1);
    }

    #[test]
    fn test_committed_lines_leave_region() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.begin_frame().unwrap();
        writer.begin_line().unwrap();
        writer.write_str("done").unwrap();
        writer.commit_lines();
        writer.begin_line().unwrap();
        writer.write_str("live").unwrap();
        writer.end_frame().unwrap();
        assert_eq!(writer.drawn_lines(), 1);
    }

    #[test]
    fn test_line_wrap_restored_on_finish() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.disable_line_wrap().unwrap();
        assert!(buffer.contents().contains("\x1b[?7l"));
        writer.finish().unwrap();
        assert!(buffer.contents().contains("\x1b[?7h"));
        assert!(!writer.is_line_wrap_disabled());
    }

    #[test]
    fn test_default_style_is_plain() {
        let buffer = SharedBuffer::default();
        let mut writer = TerminalWriter::new(buffer.clone());
        writer.write_styled("plain", ContentStyle::default()).unwrap();
        writer.write_spaces(2).unwrap();
        writer.flush().unwrap();
        assert_eq!(buffer.contents(), "plain  ");
    }
}
