//! State of the leaf widget kinds.
//!
//! Each type here holds what a [`Widget`](crate::Widget) of that kind draws.
//! Widgets expose it through [`Widget::as_bar`](crate::Widget::as_bar),
//! [`Widget::as_label`](crate::Widget::as_label) and
//! [`Widget::as_animation`](crate::Widget::as_animation).

mod animation;
mod bar;
mod label;

pub use animation::{Animation, AnimationStyle};
pub use bar::{Bar, BarCells, BarStyle, HORIZONTAL_BLOCKS, VERTICAL_BLOCKS};
pub use label::{Ellipsize, Label};
