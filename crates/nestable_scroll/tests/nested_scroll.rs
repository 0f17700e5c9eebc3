//! Integration tests for the nestable scroll container
//!
//! These tests drive a container the way a host would:
//! - Build it, hand the rendered view's handlers to the host events
//! - Let a nested list read and toggle the shared context
//! - Rebuild when the dirty flag says so

use nestable_core::events::event_types;
use nestable_core::{ContextState, Event, EventDispatcher, LayoutEvent, Rect, ScrollEvent};
use nestable_scroll::prelude::*;
use nestable_scroll::{NestableScrollContextProvider, Result};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

type Captured = Arc<Mutex<Option<NestableScrollContext>>>;

/// Container whose single child stores the context it sees
fn capturing_container(key: &str) -> (NestableScrollContainer, Captured) {
    let captured: Captured = Arc::new(Mutex::new(None));
    let captured_clone = Arc::clone(&captured);
    let capture = move |ctx: &mut ContextState| -> Result<()> {
        *captured_clone.lock().unwrap() = Some(use_safe_nestable_scroll_context(ctx)?);
        Ok(())
    };
    (nestable_scroll_container(key).child(capture), captured)
}

fn captured_context(captured: &Captured) -> NestableScrollContext {
    captured
        .lock()
        .unwrap()
        .clone()
        .expect("child was not built")
}

fn layout(height: f32) -> LayoutEvent {
    LayoutEvent::with_size(320.0, height)
}

#[test]
fn test_enablement_truth_table() {
    let cases = [
        (true, true, true),
        (false, true, false),
        (true, false, false),
        (false, false, false),
    ];

    for (toggle, prop, expected) in cases {
        let mut ctx = ContextState::standalone();
        let enabled = NestableScrollContextProvider::new("list")
            .scroll_enabled(prop)
            .provide(&mut ctx, |ctx| {
                let scroll = use_safe_nestable_scroll_context(ctx).unwrap();
                scroll.set_outer_scroll_enabled(toggle);
                scroll.outer_scroll_enabled()
            });

        assert_eq!(enabled, expected, "toggle={toggle} prop={prop}");
    }
}

#[test]
fn test_toggle_off_then_on_restores() {
    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    let before = scroll.outer_scroll_enabled();
    scroll.set_outer_scroll_enabled(false);
    assert!(!scroll.outer_scroll_enabled());
    scroll.set_outer_scroll_enabled(true);
    assert_eq!(scroll.outer_scroll_enabled(), before);
}

#[test]
fn test_scroll_writes_offset_and_forwards_event_once() {
    let mut ctx = ContextState::standalone();
    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    let (container, captured) = capturing_container("list");
    let container = container.on_scroll(move |event: &ScrollEvent| {
        let addr = event as *const ScrollEvent as usize;
        seen_clone.lock().unwrap().push(addr);
    });

    let view = container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    let event = ScrollEvent::vertical(123.5);
    view.handlers.on_scroll(&event);

    assert_eq!(scroll.outer_scroll_offset().get(), Some(123.5));
    let addr = &event as *const ScrollEvent as usize;
    assert_eq!(*seen.lock().unwrap(), vec![addr]);
}

#[test]
fn test_caller_scroll_handler_sees_previous_offset() {
    let mut ctx = ContextState::standalone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    let (container, captured) = capturing_container("list");
    let shared = Arc::clone(&captured);
    let container = container.on_scroll(move |_: &ScrollEvent| {
        let offset = captured_context(&shared).outer_scroll_offset().get();
        seen_clone.lock().unwrap().push(offset);
    });

    let view = container.build(&mut ctx).unwrap();
    view.handlers.on_scroll(&ScrollEvent::vertical(123.5));

    assert_eq!(*seen.lock().unwrap(), vec![Some(0.0)]);
    let scroll = captured_context(&captured);
    assert_eq!(scroll.outer_scroll_offset().get(), Some(123.5));
}

#[test]
fn test_caller_content_size_handler_sees_new_height() {
    let mut ctx = ContextState::standalone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    let (container, captured) = capturing_container("list");
    let shared = Arc::clone(&captured);
    let container = container.on_content_size_change(move |_, _| {
        let height = captured_context(&shared).scroll_view_size().get();
        seen_clone.lock().unwrap().push(height);
    });

    let view = container.build(&mut ctx).unwrap();
    view.handlers.on_content_size_change(300.0, 900.0);

    assert_eq!(*seen.lock().unwrap(), vec![Some(900.0)]);
}

#[test]
fn test_caller_handler_may_toggle_enablement() {
    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    let captured_clone = Arc::clone(&captured);
    let container = container.on_scroll(move |_: &ScrollEvent| {
        captured_context(&captured_clone).set_outer_scroll_enabled(false);
    });

    let view = container.build(&mut ctx).unwrap();
    assert!(view.scroll_enabled);
    ctx.take_rebuild_request();

    view.handlers.on_scroll(&ScrollEvent::vertical(50.0));
    assert!(ctx.take_rebuild_request());
    let scroll = captured_context(&captured);
    assert_eq!(scroll.outer_scroll_offset().get(), Some(50.0));

    let view = container.build(&mut ctx).unwrap();
    assert!(!view.scroll_enabled);
}

#[test]
fn test_scroll_does_not_request_rebuild() {
    let mut ctx = ContextState::standalone();
    let view = nestable_scroll_container("list").build(&mut ctx).unwrap();
    ctx.take_rebuild_request();

    let handlers = &view.handlers;
    handlers.on_scroll(&ScrollEvent::vertical(40.0));
    handlers.on_layout(&layout(400.0));
    handlers.on_content_size_change(320.0, 900.0);

    assert!(!ctx.take_rebuild_request());
}

#[test]
fn test_layout_is_last_write_wins() {
    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    let view = container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    view.handlers.on_layout(&layout(400.0));
    assert_eq!(scroll.container_size().get(), Some(400.0));

    view.handlers.on_layout(&layout(450.0));
    assert_eq!(scroll.container_size().get(), Some(450.0));
}

#[test]
fn test_content_size_written_then_forwarded() {
    let mut ctx = ContextState::standalone();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let calls_clone = Arc::clone(&calls);

    let (container, captured) = capturing_container("list");
    let container = container.on_content_size_change(move |w, h| {
        calls_clone.lock().unwrap().push((w, h));
    });

    let view = container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    view.handlers.on_content_size_change(300.0, 900.0);

    assert_eq!(scroll.scroll_view_size().get(), Some(900.0));
    assert_eq!(*calls.lock().unwrap(), vec![(300.0, 900.0)]);
}

#[test]
fn test_missing_provider() {
    let ctx = ContextState::standalone();

    let err = use_safe_nestable_scroll_context(&ctx).unwrap_err();
    assert!(err.is_missing_provider());
    assert!(use_nestable_scroll_context(&ctx).is_none());

    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    assert!(scroll.outer_scroll_enabled());
    assert!(scroll.default_outer_scroll_enabled());
    assert_eq!(scroll.outer_scroll_offset().get(), Some(0.0));
    assert_eq!(scroll.container_size().get(), Some(0.0));
    assert_eq!(scroll.scroll_view_size().get(), Some(0.0));
}

#[test]
fn test_context_not_visible_to_siblings() {
    let mut ctx = ContextState::standalone();
    nestable_scroll_container("list").build(&mut ctx).unwrap();

    assert!(use_nestable_scroll_context(&ctx).is_none());
}

#[test]
fn test_forwarded_ref_is_used() {
    let mut ctx = ContextState::standalone();
    let forwarded = ScrollRef::new();

    let (container, captured) = capturing_container("list");
    let view = container.bind(&forwarded).build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    assert!(view.scroll_ref.ptr_eq(&forwarded));
    assert!(scroll.scrollable_ref().ptr_eq(&forwarded));
}

#[test]
fn test_owned_ref_survives_rebuilds() {
    let mut ctx = ContextState::standalone();
    let container = nestable_scroll_container("list");

    let first = container.build(&mut ctx).unwrap();
    let second = container.build(&mut ctx).unwrap();

    assert!(first.scroll_ref.ptr_eq(&second.scroll_ref));
}

#[test]
fn test_nested_drag_disables_outer_scroll_on_rebuild() {
    let mut ctx = ContextState::standalone();
    let dragging = Arc::new(Mutex::new(false));
    let dragging_clone = Arc::clone(&dragging);

    // A nested list that mirrors its drag state into the context
    let nested_list = move |ctx: &mut ContextState| -> Result<()> {
        let scroll = use_safe_nestable_scroll_context(ctx)?;
        let is_dragging = *dragging_clone.lock().unwrap();
        if scroll.default_outer_scroll_enabled() == is_dragging {
            scroll.set_outer_scroll_enabled(!is_dragging);
        }
        Ok(())
    };
    let container = nestable_scroll_container("list").child(nested_list);

    let view = container.build(&mut ctx).unwrap();
    assert!(view.scroll_enabled);
    assert!(!ctx.take_rebuild_request());

    // Drag starts: the child flips the toggle and asks for a rebuild
    *dragging.lock().unwrap() = true;
    let view = container.build(&mut ctx).unwrap();
    assert!(view.scroll_enabled);
    assert!(ctx.take_rebuild_request());

    let view = container.build(&mut ctx).unwrap();
    assert!(!view.scroll_enabled);
    assert!(!view.scroll_ref.is_scroll_enabled());

    // Drag ends
    *dragging.lock().unwrap() = false;
    container.build(&mut ctx).unwrap();
    assert!(ctx.take_rebuild_request());
    let view = container.build(&mut ctx).unwrap();
    assert!(view.scroll_enabled);
}

#[test]
fn test_prop_overrides_toggle() {
    let mut ctx = ContextState::standalone();
    let view = nestable_scroll_container("list")
        .props(ScrollProps::new().scroll_enabled(false).bounces(false))
        .build(&mut ctx)
        .unwrap();

    assert!(!view.scroll_enabled);
    assert!(!view.props.bounces);

    let view = nestable_scroll_container("list")
        .scroll_enabled(true)
        .build(&mut ctx)
        .unwrap();
    assert!(view.scroll_enabled);
}

#[test]
fn test_props_from_toml() {
    let props = ScrollProps::from_toml_str("scroll_enabled = false").unwrap();
    let mut ctx = ContextState::standalone();

    let view = nestable_scroll_container("list")
        .props(props)
        .build(&mut ctx)
        .unwrap();

    assert!(!view.scroll_enabled);
    assert_eq!(view.scroll_event_throttle, 1);
}

#[test]
fn test_host_events_through_dispatcher() {
    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    let view = container.build(&mut ctx).unwrap();
    let scroll = captured_context(&captured);

    let mut dispatcher = EventDispatcher::new();
    view.handlers.attach(&mut dispatcher, 3);
    assert_eq!(dispatcher.handler_count(3, event_types::LAYOUT), 1);

    dispatcher.dispatch(&mut Event::layout(3, Rect::new(0.0, 0.0, 320.0, 400.0)));
    dispatcher.dispatch(&mut Event::content_size(3, 320.0, 900.0));
    dispatcher.dispatch(&mut Event::scroll(3, ScrollEvent::vertical(75.0)));

    // Events for other nodes are ignored
    dispatcher.dispatch(&mut Event::scroll(4, ScrollEvent::vertical(999.0)));

    assert_eq!(scroll.container_size().get(), Some(400.0));
    assert_eq!(scroll.scroll_view_size().get(), Some(900.0));
    assert_eq!(scroll.outer_scroll_offset().get(), Some(75.0));
}

#[test]
fn test_scroll_ref_requests_for_host() {
    let mut ctx = ContextState::standalone();
    let forwarded = ScrollRef::new();
    let view = nestable_scroll_container("list")
        .bind(&forwarded)
        .build(&mut ctx)
        .unwrap();

    view.handlers.on_layout(&layout(400.0));
    view.handlers.on_content_size_change(320.0, 1000.0);
    forwarded.scroll_to_end(true);

    let pending = view.scroll_ref.take_pending().unwrap();
    assert_eq!(pending.y, 600.0);
    assert!(pending.animated);
}

#[test]
fn test_containers_do_not_share_state() {
    let mut ctx = ContextState::standalone();
    let (outer, outer_captured) = capturing_container("outer");
    let (inner, inner_captured) = capturing_container("inner");

    let outer_view = outer.build(&mut ctx).unwrap();
    inner.build(&mut ctx).unwrap();

    outer_view.handlers.on_scroll(&ScrollEvent::vertical(10.0));

    let outer_scroll = captured_context(&outer_captured);
    let inner_scroll = captured_context(&inner_captured);
    assert_eq!(outer_scroll.outer_scroll_offset().get(), Some(10.0));
    assert_eq!(inner_scroll.outer_scroll_offset().get(), Some(0.0));
}

#[test]
fn test_unmount_releases_state() {
    let mut ctx = ContextState::standalone();
    let (container, captured) = capturing_container("list");
    let view = container.build(&mut ctx).unwrap();
    let stale = captured_context(&captured);

    view.handlers.on_layout(&layout(400.0));
    stale.set_outer_scroll_enabled(false);
    container.unmount(&ctx);

    assert_eq!(stale.container_size().get(), None);
    assert!(!stale.outer_scroll_enabled());

    container.build(&mut ctx).unwrap();
    let fresh = captured_context(&captured);
    assert_eq!(fresh.container_size().get(), Some(0.0));
    assert!(fresh.outer_scroll_enabled());
}
