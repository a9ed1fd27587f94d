//! Spinners cycling through frames on their own timer.

use std::io;
use std::time::Duration;

use crossterm::style::ContentStyle;
use termdash_core::{PeriodicTimer, TimerId};
use unicode_width::UnicodeWidthStr;

use crate::writer::TerminalWriter;

/// A frame sequence and the interval between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStyle {
    /// Frames shown in order, then repeated.
    pub frames: &'static [&'static str],
    /// Time each frame stays on screen.
    pub interval: Duration,
}

impl AnimationStyle {
    /// Braille dots spinning.
    pub const DOTS: Self = Self::new(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"], 80);
    /// Dense braille dots spinning.
    pub const DOTS2: Self = Self::new(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"], 80);
    /// A rotating line.
    pub const LINE: Self = Self::new(&["-", "\\", "|", "/"], 130);
    /// A pulsing dash.
    pub const LINE2: Self = Self::new(&["⠂", "-", "–", "—", "–", "-"], 100);
    /// A box-drawing pipe going round.
    pub const PIPE: Self = Self::new(&["┤", "┘", "┴", "└", "├", "┌", "┬", "┐"], 100);
    /// Dots appearing one by one.
    pub const SIMPLE_DOTS: Self = Self::new(&[".  ", ".. ", "...", "   "], 400);
    /// Dots scrolling across.
    pub const SIMPLE_DOTS_SCROLLING: Self =
        Self::new(&[".  ", ".. ", "...", " ..", "  .", "   "], 200);
    /// A twinkling star.
    pub const STAR: Self = Self::new(&["✶", "✸", "✹", "✺", "✹", "✷"], 70);
    /// Plus, cross and star.
    pub const STAR2: Self = Self::new(&["+", "x", "*"], 80);
    /// A flipping underscore.
    pub const FLIP: Self = Self::new(
        &["_", "_", "_", "-", "`", "`", "'", "´", "-", "_", "_", "_"],
        70,
    );
    /// Trigrams.
    pub const HAMBURGER: Self = Self::new(&["☱", "☲", "☴"], 100);

    const fn new(frames: &'static [&'static str], interval_ms: u64) -> Self {
        Self {
            frames,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

impl Default for AnimationStyle {
    fn default() -> Self {
        Self::DOTS
    }
}

/// A spinner.
///
/// While attached to a running application the animation owns a
/// [`PeriodicTimer`] that posts a timer event to its widget once per
/// interval; each event advances one frame.
#[derive(Debug)]
pub struct Animation {
    frames: Vec<String>,
    interval: Duration,
    frame: usize,
    style: ContentStyle,
    timer: Option<PeriodicTimer>,
}

impl Animation {
    /// Create an animation from a preset.
    pub fn new(style: AnimationStyle) -> Self {
        Self {
            frames: style.frames.iter().map(|f| (*f).to_owned()).collect(),
            interval: style.interval,
            frame: 0,
            style: ContentStyle::default(),
            timer: None,
        }
    }

    /// Switch to a preset.
    pub fn set_animation_style(&mut self, style: AnimationStyle) {
        self.set_frames(style.frames, style.interval);
    }

    /// Replace the frames and interval, restarting from the first frame.
    pub fn set_frames<S: AsRef<str>>(&mut self, frames: &[S], interval: Duration) {
        self.frames = frames.iter().map(|f| f.as_ref().to_owned()).collect();
        self.frame = 0;
        self.interval = interval;
        if let Some(timer) = &self.timer {
            timer.set_interval(interval);
        }
    }

    /// All frames.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Time between frames.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index of the frame on screen.
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// The frame on screen, empty if there are no frames.
    pub fn current_frame(&self) -> &str {
        self.frames.get(self.frame).map_or("", String::as_str)
    }

    /// Move to the next frame, wrapping around.
    pub fn advance(&mut self) {
        if !self.frames.is_empty() {
            self.frame = (self.frame + 1) % self.frames.len();
        }
    }

    /// Set the text style.
    pub fn set_style(&mut self, style: ContentStyle) {
        self.style = style;
    }

    /// Text style.
    pub fn style(&self) -> ContentStyle {
        self.style
    }

    /// Width of the widest frame.
    pub fn natural_size(&self) -> usize {
        self.frames.iter().map(|f| f.width()).max().unwrap_or(0)
    }

    /// The id tagging this animation's timer events, while it ticks.
    pub fn timer_id(&self) -> Option<TimerId> {
        self.timer.as_ref().map(PeriodicTimer::id)
    }

    /// Returns `true` while the timer exists and is not paused.
    pub fn is_ticking(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| timer.is_running() && !timer.is_paused())
    }

    /// Start ticking. `tick` runs on the timer thread once per interval with
    /// the timer's id. Does nothing if already ticking.
    pub(crate) fn start_timer<F>(&mut self, paused: bool, tick: F) -> termdash_core::Result<()>
    where
        F: Fn(TimerId) + Send + Sync + 'static,
    {
        if self.timer.is_some() {
            return Ok(());
        }
        let timer = PeriodicTimer::new(self.interval, || {}).with_name("termdash-animation");
        let id = timer.id();
        timer.set_function(move || tick(id));
        if paused {
            timer.pause();
        }
        timer.start()?;
        self.timer = Some(timer);
        Ok(())
    }

    /// Detach the timer. The caller stops it, outside any lock the timer
    /// callback might wait on.
    pub(crate) fn take_timer(&mut self) -> Option<PeriodicTimer> {
        self.timer.take()
    }

    pub(crate) fn pause_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.pause();
        }
    }

    pub(crate) fn resume_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.resume();
        }
    }

    /// Draw exactly `allocated` columns.
    pub fn render(&self, writer: &mut TerminalWriter, allocated: usize) -> io::Result<()> {
        let frame = self.current_frame();
        let width = frame.width();
        if width > allocated {
            return writer.write_spaces(allocated);
        }
        writer.write_styled(frame, self.style)?;
        writer.write_spaces(allocated - width)
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(AnimationStyle::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_advance_wraps() {
        let mut animation = Animation::new(AnimationStyle::STAR2);
        assert_eq!(animation.current_frame(), "+");
        animation.advance();
        animation.advance();
        assert_eq!(animation.current_frame(), "*");
        animation.advance();
        assert_eq!(animation.frame_index(), 0);
    }

    #[test]
    fn test_natural_size_is_widest_frame() {
        assert_eq!(Animation::new(AnimationStyle::SIMPLE_DOTS).natural_size(), 3);
        assert_eq!(Animation::new(AnimationStyle::DOTS).natural_size(), 1);

        let mut empty = Animation::default();
        empty.set_frames::<&str>(&[], Duration::from_millis(10));
        assert_eq!(empty.natural_size(), 0);
        assert_eq!(empty.current_frame(), "");
        empty.advance();
    }

    #[test]
    fn test_timer_ticks_with_its_id() {
        let mut animation = Animation::new(AnimationStyle::new(&["a", "b"], 10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(parking_lot::Mutex::new(None));

        let ticks_clone = ticks.clone();
        let seen_clone = seen.clone();
        animation
            .start_timer(false, move |id| {
                ticks_clone.fetch_add(1, Ordering::SeqCst);
                *seen_clone.lock() = Some(id);
            })
            .unwrap();
        assert!(animation.is_ticking());

        std::thread::sleep(Duration::from_millis(60));
        animation.take_timer().unwrap().stop();
        assert!(!animation.is_ticking());
        assert!(ticks.load(Ordering::SeqCst) >= 2);
        assert!(seen.lock().is_some());

        let after = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_paused_timer_does_not_tick() {
        let mut animation = Animation::new(AnimationStyle::new(&["a"], 10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_clone = ticks.clone();
        animation
            .start_timer(true, move |_| {
                ticks_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        animation.resume_timer();
        std::thread::sleep(Duration::from_millis(40));
        assert!(ticks.load(Ordering::SeqCst) >= 1);
    }
}
