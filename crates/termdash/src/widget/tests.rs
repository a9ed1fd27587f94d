use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::terminal::TerminalSize;
use crate::writer::tests::SharedBuffer;

fn fixed_label(text: &str) -> Arc<Widget> {
    let label = Widget::label(text);
    label.set_size_policy(SizePolicy::fixed());
    label
}

fn row(spacing: usize, widgets: &[Arc<Widget>]) -> (Arc<Widget>, Arc<BoxLayout>) {
    let root = Widget::container();
    let layout = BoxLayout::new();
    layout.set_spacing(spacing);
    for widget in widgets {
        layout.push_back(widget.clone());
    }
    root.set_layout(layout.clone()).unwrap();
    (root, layout)
}

fn render(widget: &Widget) -> String {
    let buffer = SharedBuffer::default();
    let mut writer = TerminalWriter::new(buffer.clone());
    widget.render(&mut writer).unwrap();
    writer.flush().unwrap();
    buffer.contents()
}

#[test]
fn test_ids_are_unique() {
    let a = Widget::container();
    let b = Widget::container();
    assert_ne!(a.id(), b.id());
    assert!(a.id() < b.id());
    assert_eq!(a.name(), "container");
    a.set_name("status");
    assert_eq!(a.name(), "status");
}

#[test]
fn test_set_layout_adopts_widgets() {
    let label = fixed_label("ab");
    let (root, layout) = row(1, &[label.clone()]);
    assert_eq!(root.children().len(), 1);
    assert_eq!(label.parent().unwrap().id(), root.id());
    assert!(Arc::ptr_eq(&layout.parent().unwrap(), &root));

    let late = fixed_label("cd");
    layout.push_back(late.clone());
    assert_eq!(root.children().len(), 2);
    assert_eq!(late.root().unwrap().id(), root.id());
}

#[test]
fn test_replacing_layout_detaches_old_widgets() {
    let kept = fixed_label("kept");
    let dropped = fixed_label("dropped");
    let (root, _) = row(0, &[kept.clone(), dropped.clone()]);

    let replacement = BoxLayout::new();
    replacement.push_back(kept.clone());
    root.set_layout(replacement).unwrap();

    assert_eq!(root.children().len(), 1);
    assert!(dropped.parent().is_none());
    assert_eq!(kept.parent().unwrap().id(), root.id());
}

#[test]
fn test_add_and_remove_child() {
    let root = Widget::container();
    let child = fixed_label("x");
    root.add_child(child.clone()).unwrap();
    assert!(root.layout().is_some());
    assert_eq!(root.layout().unwrap().find(&child), Some(0));

    root.remove_child(&child).unwrap();
    assert!(root.children().is_empty());
    assert!(root.layout().unwrap().is_empty());
    assert_eq!(root.remove_child(&child), Err(WidgetError::NotAChild));
}

#[test]
fn test_reparenting_moves_child() {
    let child = fixed_label("x");
    let (first, first_layout) = row(0, &[child.clone()]);
    let (second, second_layout) = row(0, &[]);

    second_layout.push_back(child.clone());
    assert!(first.children().is_empty());
    assert!(first_layout.is_empty());
    assert_eq!(child.parent().unwrap().id(), second.id());
}

#[test]
fn test_kind_mismatch() {
    let label = Widget::label("x");
    assert_eq!(
        label.set_percentage(10.0),
        Err(WidgetError::WrongKind {
            expected: "bar",
            found: "label"
        })
    );
    assert!(label.add_child(Widget::label("y")).is_err());
    assert!(label.set_layout(BoxLayout::new()).is_err());
    assert!(label.as_bar().is_none());
    assert!(Widget::bar().set_text("x").is_err());
    assert!(Widget::container()
        .set_animation_style(AnimationStyle::LINE)
        .is_err());
}

#[test]
fn test_kind_sizes() {
    let bar = Widget::bar();
    bar.set_bar_size(12).unwrap();
    assert_eq!(bar.natural_size(), 12);
    assert_eq!(bar.maximum_size(), usize::MAX);

    let spinner = Widget::animation(AnimationStyle::SIMPLE_DOTS);
    assert_eq!(spinner.minimum_size(), 3);
    assert_eq!(spinner.maximum_size(), 3);
    assert!(spinner.size_policy().is_fixed());

    let label = Widget::label("hello");
    label.set_padding(1).unwrap();
    assert_eq!(label.natural_size(), 7);
    assert!(label.size_policy().can_grow());
    assert!(label.size_policy().can_shrink());

    let (root, _) = row(2, &[fixed_label("abc"), fixed_label("de")]);
    assert_eq!(root.natural_size(), 7);
    assert_eq!(Widget::container().natural_size(), 0);
}

#[test]
fn test_render_row() {
    let bar = Widget::bar();
    bar.set_bar_size(6).unwrap();
    bar.set_size_policy(SizePolicy::fixed());
    bar.set_percentage(50.0).unwrap();
    let (root, _) = row(1, &[fixed_label("ab"), bar]);

    root.allocate_size(12);
    root.update_layout();
    assert_eq!(render(&root), "ab [=>  ]   \x1b[K");
}

#[test]
fn test_render_centered_row() {
    let label = fixed_label("ab");
    let (root, _) = row(1, &[label.clone(), fixed_label("cd")]);
    root.set_alignment(Alignment::Center);

    root.allocate_size(9);
    root.update_layout();
    assert_eq!(label.position(), 2);
    assert_eq!(render(&root), "  ab cd  \x1b[K");
}

#[test]
fn test_hidden_widget_is_skipped() {
    let hidden = fixed_label("zz");
    let (root, _) = row(1, &[fixed_label("ab"), hidden.clone(), fixed_label("cd")]);
    hidden.hide();
    assert!(!hidden.is_visible());

    root.allocate_size(5);
    root.update_layout();
    assert_eq!(render(&root), "ab cd\x1b[K");

    hidden.show();
    root.allocate_size(8);
    root.update_layout();
    assert_eq!(render(&root), "ab zz cd\x1b[K");
}

#[test]
fn test_empty_container_renders_nothing() {
    let root = Widget::container();
    root.allocate_size(10);
    assert_eq!(render(&root), "\x1b[K");
}

#[test]
fn test_close_detaches_from_parent_and_layout() {
    let child = fixed_label("x");
    let (root, layout) = row(0, &[child.clone()]);
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = closed.clone();
    child.on_closed().connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    child.close();
    child.close();
    assert!(child.is_closed());
    assert!(child.parent().is_none());
    assert!(root.children().is_empty());
    assert!(layout.find(&child).is_none());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_layout_event_lays_out_subtree() {
    let inner_label = Widget::label("abc");
    inner_label.set_size_policy(SizePolicy::new(SizePolicyFlags::EXPAND));
    let (inner, _) = row(0, &[inner_label.clone()]);
    inner.set_size_policy(SizePolicy::new(SizePolicyFlags::EXPAND));
    let (root, _) = row(1, &[fixed_label("x"), inner.clone()]);

    root.allocate_size(10);
    let mut event = Event::layout();
    root.on_event(&mut event);
    assert!(event.is_accepted());
    assert_eq!(inner.position(), 2);
    assert_eq!(inner.allocated_size(), 8);
    assert_eq!(inner_label.position(), 2);
    assert_eq!(inner_label.allocated_size(), 8);
}

#[test]
fn test_resize_event_sizes_root() {
    let (root, _) = row(0, &[fixed_label("abc")]);
    let mut event = Event::resize(TerminalSize::new(40, 10));
    root.on_event(&mut event);
    assert!(event.is_accepted());
    assert_eq!(root.allocated_size(), 40);
}

#[test]
fn test_close_event_reaches_target() {
    let child = fixed_label("x");
    let (root, _) = row(0, &[child.clone()]);
    let (completion, done) = crossbeam_channel::bounded(1);

    let mut event = Event::close(child.id(), Some(completion));
    root.on_event(&mut event);
    assert!(event.is_accepted());
    assert!(child.is_closed());
    assert!(root.children().is_empty());
    assert!(done.try_recv().is_ok());
}

#[test]
fn test_timer_event_for_unknown_timer_is_not_accepted() {
    let spinner = Widget::animation(AnimationStyle::STAR2);
    let unrelated = termdash_core::PeriodicTimer::new(Duration::from_secs(1), || {});
    let mut event = Event::timer(unrelated.id());
    spinner.on_event(&mut event);
    assert!(!event.is_accepted());
    assert_eq!(spinner.as_animation().unwrap().frame_index(), 0);
}

#[test]
fn test_termination_reaches_every_child() {
    let (root, _) = row(1, &[fixed_label("a"), Widget::animation(AnimationStyle::LINE)]);
    let mut event = Event::termination();
    root.on_event(&mut event);
    assert!(!event.is_accepted());
    assert!(!root.children()[1].as_animation().unwrap().is_ticking());
}
