//! Horizontal box layout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::error::LayoutError;
use crate::geometry::{SizePolicy, SizePolicyFlags};
use crate::widget::{Widget, WidgetId};

use super::LayoutItem;

struct LayoutState {
    items: Vec<LayoutItem>,
    spacing: usize,
    policy: Option<SizePolicy>,
}

/// Arranges items in a row, sharing out the width of its parent widget.
///
/// Widgets added to a layout become children of the layout's parent widget.
/// Widgets added before the layout is installed on a widget (see
/// [`Widget::set_layout`]) are adopted when it is installed.
///
/// # Related
///
/// - [`LayoutItem`] - The items being arranged
/// - [`SizePolicy`] - How each item reacts to surplus or deficit width
pub struct BoxLayout {
    state: Mutex<LayoutState>,
    parent: RwLock<Weak<Widget>>,
    allocated: AtomicUsize,
    position: AtomicUsize,
}

impl BoxLayout {
    /// Create an empty layout with no spacing.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LayoutState {
                items: Vec::new(),
                spacing: 0,
                policy: None,
            }),
            parent: RwLock::new(Weak::new()),
            allocated: AtomicUsize::new(0),
            position: AtomicUsize::new(0),
        })
    }

    // ========================================================================
    // Item management
    // ========================================================================

    /// Append a widget.
    pub fn push_back(&self, widget: Arc<Widget>) {
        let len = self.len();
        self.insert_unchecked(len, LayoutItem::Widget(widget));
    }

    /// Prepend a widget.
    pub fn push_front(&self, widget: Arc<Widget>) {
        self.insert_unchecked(0, LayoutItem::Widget(widget));
    }

    /// Insert a widget before position `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::IndexOutOfRange`] if `pos > len()`.
    pub fn insert(&self, pos: usize, widget: Arc<Widget>) -> Result<(), LayoutError> {
        let len = self.len();
        if pos > len {
            return Err(LayoutError::IndexOutOfRange { index: pos, len });
        }
        self.insert_unchecked(pos, LayoutItem::Widget(widget));
        Ok(())
    }

    /// Append a nested layout. Its widgets become children of this layout's
    /// parent widget.
    pub fn push_layout(&self, layout: Arc<BoxLayout>) {
        let len = self.len();
        self.insert_unchecked(len, LayoutItem::Layout(layout));
    }

    /// Insert `item` before `pos`. A widget already managed by this layout is
    /// moved rather than added twice.
    fn insert_unchecked(&self, mut pos: usize, item: LayoutItem) {
        let parent = self.parent();
        match &item {
            LayoutItem::Layout(nested) => nested.set_parent(&self.parent.read()),
            LayoutItem::Widget(widget) => {
                let nested: Vec<Arc<BoxLayout>> = self
                    .items()
                    .iter()
                    .filter_map(|item| item.as_layout().cloned())
                    .collect();
                for layout in nested {
                    layout.take_widget(widget.id());
                }
            }
        }
        {
            let mut state = self.state.lock();
            if let LayoutItem::Widget(widget) = &item {
                let existing = state
                    .items
                    .iter()
                    .position(|i| i.as_widget().is_some_and(|w| w.id() == widget.id()));
                if let Some(existing) = existing {
                    state.items.remove(existing);
                    if existing < pos {
                        pos -= 1;
                    }
                }
            }
            let pos = pos.min(state.items.len());
            state.items.insert(pos, item.clone());
        }

        if let Some(parent) = parent {
            match &item {
                LayoutItem::Widget(widget) => parent.attach_child(widget.clone()),
                LayoutItem::Layout(nested) => {
                    for widget in nested.widgets() {
                        parent.attach_child(widget);
                    }
                }
            }
            parent.queue_layout();
        }
    }

    /// Remove the item at `pos`. Widgets leave the parent widget as well.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::IndexOutOfRange`] if there is no item at `pos`.
    pub fn erase(&self, pos: usize) -> Result<LayoutItem, LayoutError> {
        let item = {
            let mut state = self.state.lock();
            let len = state.items.len();
            if pos >= len {
                return Err(LayoutError::IndexOutOfRange { index: pos, len });
            }
            state.items.remove(pos)
        };

        if let Some(parent) = self.parent() {
            match &item {
                LayoutItem::Widget(widget) => {
                    parent.detach_child(widget);
                }
                LayoutItem::Layout(nested) => {
                    for widget in nested.widgets() {
                        parent.detach_child(&widget);
                    }
                }
            }
            parent.queue_layout();
        }
        if let LayoutItem::Layout(nested) = &item {
            nested.set_parent(&Weak::new());
        }
        Ok(item)
    }

    /// Remove `widget`, searching nested layouts too. The widget also leaves
    /// the parent widget.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::ItemNotFound`] if the widget is not managed by
    /// this layout.
    pub fn erase_widget(&self, widget: &Arc<Widget>) -> Result<(), LayoutError> {
        if !self.take_widget(widget.id()) {
            return Err(LayoutError::ItemNotFound);
        }
        if let Some(parent) = self.parent() {
            parent.detach_child(widget);
            parent.queue_layout();
        }
        Ok(())
    }

    /// Drop every item referencing `id`, including in nested layouts.
    pub(crate) fn take_widget(&self, id: WidgetId) -> bool {
        let nested: Vec<Arc<BoxLayout>> = {
            let mut state = self.state.lock();
            let before = state.items.len();
            state
                .items
                .retain(|item| item.as_widget().is_none_or(|widget| widget.id() != id));
            if state.items.len() != before {
                return true;
            }
            state.items.iter().filter_map(|item| item.as_layout().cloned()).collect()
        };
        nested.iter().any(|layout| layout.take_widget(id))
    }

    /// Position of `widget` among the top-level items.
    pub fn find(&self, widget: &Widget) -> Option<usize> {
        self.state
            .lock()
            .items
            .iter()
            .position(|item| item.as_widget().is_some_and(|w| w.id() == widget.id()))
    }

    /// Returns `true` if `widget` is managed by this layout or a nested one.
    pub fn contains(&self, widget: &Widget) -> bool {
        self.widgets().iter().any(|w| w.id() == widget.id())
    }

    /// The item at `pos`.
    pub fn item(&self, pos: usize) -> Option<LayoutItem> {
        self.state.lock().items.get(pos).cloned()
    }

    /// A copy of the top-level items.
    pub fn items(&self) -> Vec<LayoutItem> {
        self.state.lock().items.clone()
    }

    /// Every widget managed by this layout and its nested layouts, in order.
    pub fn widgets(&self) -> Vec<Arc<Widget>> {
        let mut widgets = Vec::new();
        for item in self.items() {
            match item {
                LayoutItem::Widget(widget) => widgets.push(widget),
                LayoutItem::Layout(nested) => widgets.extend(nested.widgets()),
            }
        }
        widgets
    }

    /// Number of top-level items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns `true` if the layout has no items.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Columns left blank between visible items.
    pub fn spacing(&self) -> usize {
        self.state.lock().spacing
    }

    /// Set the columns left blank between visible items.
    pub fn set_spacing(&self, spacing: usize) {
        self.state.lock().spacing = spacing;
        if let Some(parent) = self.parent() {
            parent.queue_layout();
        }
    }

    // ========================================================================
    // Parent widget
    // ========================================================================

    /// The widget whose width this layout shares out.
    pub fn parent(&self) -> Option<Arc<Widget>> {
        self.parent.read().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Weak<Widget>) {
        *self.parent.write() = parent.clone();
        let nested: Vec<Arc<BoxLayout>> = self
            .items()
            .iter()
            .filter_map(|item| item.as_layout().cloned())
            .collect();
        for layout in nested {
            layout.set_parent(parent);
        }
    }

    // ========================================================================
    // Sizing
    // ========================================================================

    fn visible_items(&self) -> (Vec<LayoutItem>, usize) {
        let state = self.state.lock();
        let items = state.items.iter().filter(|item| item.is_visible()).cloned().collect();
        (items, state.spacing)
    }

    fn sum_with_spacing(&self, size_of: impl Fn(&LayoutItem) -> usize) -> usize {
        let (items, spacing) = self.visible_items();
        let gaps = spacing.saturating_mul(items.len().saturating_sub(1));
        items
            .iter()
            .fold(gaps, |total, item| total.saturating_add(size_of(item)))
    }

    /// Sum of the visible items' minimum widths plus spacing.
    pub fn minimum_size(&self) -> usize {
        self.sum_with_spacing(LayoutItem::minimum_size)
    }

    /// Sum of the visible items' natural widths plus spacing.
    pub fn natural_size(&self) -> usize {
        self.sum_with_spacing(|item| item.natural_size().min(item.maximum_size()))
    }

    /// Sum of the visible items' maximum widths plus spacing.
    pub fn maximum_size(&self) -> usize {
        self.sum_with_spacing(LayoutItem::maximum_size)
    }

    /// Columns taken by the visible items after the last [`update`](Self::update).
    pub fn used_size(&self) -> usize {
        self.sum_with_spacing(LayoutItem::allocated_size)
    }

    /// Width assigned to this layout.
    pub fn allocated_size(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    pub(crate) fn allocate_size(&self, size: usize) {
        self.allocated.store(size, Ordering::Release);
    }

    /// Column this layout starts at.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    pub(crate) fn set_position(&self, position: usize) {
        self.position.store(position, Ordering::Release);
    }

    /// Policy of this layout when nested in another one.
    ///
    /// Unless overridden, the flags are the union of the visible items' flags.
    pub fn size_policy(&self) -> SizePolicy {
        if let Some(policy) = self.state.lock().policy {
            return policy;
        }
        let (items, _) = self.visible_items();
        let mut flags = SizePolicyFlags::FIXED;
        for item in &items {
            flags |= item.size_policy().flags();
        }
        SizePolicy::new(flags)
    }

    /// Override the policy used when this layout is nested.
    pub fn set_size_policy(&self, policy: Option<SizePolicy>) {
        self.state.lock().policy = policy;
    }

    /// Share out the allocated width among the items and place them, then
    /// lay out whatever the items contain.
    #[tracing::instrument(skip(self), target = "termdash::layout", level = "trace")]
    pub fn update(&self) {
        let (items, spacing) = {
            let state = self.state.lock();
            (state.items.clone(), state.spacing)
        };
        let visible: Vec<&LayoutItem> = items.iter().filter(|item| item.is_visible()).collect();
        let sizes = compute_sizes(&visible, spacing, self.allocated_size());

        let mut position = self.position();
        for (item, size) in visible.iter().zip(&sizes) {
            item.place(position, *size);
            position += size + spacing;
        }
        for item in items.iter().filter(|item| !item.is_visible()) {
            item.place(position, 0);
        }

        for item in &items {
            item.update_contents();
        }
        tracing::trace!(target: "termdash::layout", ?sizes, "layout updated");
    }
}

struct Slot {
    size: usize,
    minimum: usize,
    maximum: usize,
    policy: SizePolicy,
}

/// Width of each visible item for an allocation of `allocated` columns.
fn compute_sizes(items: &[&LayoutItem], spacing: usize, allocated: usize) -> Vec<usize> {
    let mut slots: Vec<Slot> = items
        .iter()
        .map(|item| {
            let maximum = item.maximum_size();
            Slot {
                size: item.natural_size().min(maximum),
                minimum: item.minimum_size().min(maximum),
                maximum,
                policy: item.size_policy(),
            }
        })
        .collect();

    let gaps = spacing.saturating_mul(slots.len().saturating_sub(1));
    let available = allocated.saturating_sub(gaps);
    let total: usize = slots.iter().map(|slot| slot.size).sum();

    if available > total {
        let surplus = available - total;
        let left = distribute_surplus(&mut slots, surplus, SizePolicy::is_expanding);
        distribute_surplus(&mut slots, left, SizePolicy::is_growing);
    } else if total > available {
        distribute_deficit(&mut slots, total - available);
    }

    slots.into_iter().map(|slot| slot.size).collect()
}

/// Hand `amount` columns out in shares of `weight / total_weight`, in order.
/// Shares are capped by each index's `room`; returns what was given to each.
fn proportional_shares(eligible: &[(usize, f64, usize)], amount: usize) -> Vec<usize> {
    let total_weight: f64 = eligible.iter().map(|(_, weight, _)| weight).sum();
    let mut given: Vec<usize> = eligible
        .iter()
        .map(|(_, weight, room)| {
            let share = (amount as f64 * weight / total_weight).floor() as usize;
            share.min(*room)
        })
        .collect();

    // Rounding remainder, one column at a time to the first items with room.
    let mut remainder = amount - given.iter().sum::<usize>().min(amount);
    for (slot, (_, _, room)) in given.iter_mut().zip(eligible) {
        if remainder == 0 {
            break;
        }
        if *slot < *room {
            *slot += 1;
            remainder -= 1;
        }
    }
    given
}

/// Grow items matching `selects` until `surplus` is spent or no item can
/// take more. Returns the unspent surplus.
fn distribute_surplus(
    slots: &mut [Slot],
    mut surplus: usize,
    selects: fn(SizePolicy) -> bool,
) -> usize {
    while surplus > 0 {
        let eligible: Vec<(usize, f64, usize)> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                selects(slot.policy) && slot.policy.resize_factor() > 0.0 && slot.size < slot.maximum
            })
            .map(|(i, slot)| (i, slot.policy.resize_factor(), slot.maximum - slot.size))
            .collect();
        if eligible.is_empty() {
            break;
        }

        let given = proportional_shares(&eligible, surplus);
        let spent: usize = given.iter().sum();
        if spent == 0 {
            break;
        }
        for ((index, _, _), amount) in eligible.iter().zip(given) {
            slots[*index].size += amount;
        }
        surplus -= spent;
    }
    surplus
}

/// Shrink shrinkable items until `deficit` is recovered or every one sits at
/// its minimum.
fn distribute_deficit(slots: &mut [Slot], mut deficit: usize) {
    while deficit > 0 {
        let eligible: Vec<(usize, f64, usize)> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.policy.can_shrink()
                    && slot.policy.resize_factor() > 0.0
                    && slot.size > slot.minimum
            })
            .map(|(i, slot)| (i, slot.policy.resize_factor(), slot.size - slot.minimum))
            .collect();
        if eligible.is_empty() {
            break;
        }

        let taken = proportional_shares(&eligible, deficit);
        let recovered: usize = taken.iter().sum();
        if recovered == 0 {
            break;
        }
        for ((index, _, _), amount) in eligible.iter().zip(taken) {
            slots[*index].size -= amount;
        }
        deficit -= recovered;
    }
}

impl std::fmt::Debug for BoxLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLayout")
            .field("items", &self.len())
            .field("spacing", &self.spacing())
            .field("allocated", &self.allocated_size())
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(BoxLayout: Send, Sync);
