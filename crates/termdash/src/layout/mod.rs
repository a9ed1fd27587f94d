//! Single-axis layout management.
//!
//! A [`BoxLayout`] arranges [`LayoutItem`]s left to right on one terminal
//! line. Each item reports a minimum, natural and maximum width plus a
//! [`SizePolicy`](crate::SizePolicy); the layout hands out the width of its
//! parent widget accordingly.
//!
//! # Sizing Algorithm
//!
//! 1. Every visible item starts at its natural width.
//! 2. Surplus width goes to expanding items in proportion to their resize
//!    factors, then whatever is left to growing items, never past an item's
//!    maximum.
//! 3. A deficit is taken from shrinking items in proportion to their resize
//!    factors, never below an item's minimum. What cannot be reclaimed
//!    overflows the line.
//! 4. Items are placed in order, separated by the layout's spacing.
//!
//! # Example
//!
//! ```ignore
//! use termdash::{Widget, SizePolicy, SizePolicyFlags};
//! use termdash::layout::BoxLayout;
//!
//! let root = Widget::container();
//! let layout = BoxLayout::new();
//! layout.set_spacing(1);
//! layout.push_back(Widget::label("hashing"));
//! layout.push_back(Widget::bar());
//! root.set_layout(layout).unwrap();
//! ```

mod box_layout;
mod item;

pub use box_layout::BoxLayout;
pub use item::LayoutItem;
