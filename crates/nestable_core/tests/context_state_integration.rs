//! Integration tests for keyed state + reactive graph + providers
//!
//! These tests verify that:
//! - Keyed state survives rebuilds and feeds derived values
//! - Effects observe writes made through `State` and `SharedValue` handles
//! - Provided values are scoped to the subtree built inside the provider

use nestable_core::{ContextError, ContextState, Event, EventDispatcher, ScrollEvent, State};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq)]
struct Theme(&'static str);

/// Simulate one build of a widget that keeps a counter and its double
fn build_counter(ctx: &ContextState) -> (State<i32>, Option<i32>) {
    let count = ctx.use_state_keyed("counter", || 0);
    let signal = count.signal();
    let doubled = ctx.use_derived_keyed("counter_doubled", move |g| g.get(signal).unwrap_or(0) * 2);
    let value = ctx.reactive().lock().unwrap().get_derived(doubled);
    (count, value)
}

#[test]
fn test_keyed_state_feeds_derived_across_rebuilds() {
    let ctx = ContextState::standalone();

    let (count, doubled) = build_counter(&ctx);
    assert_eq!(doubled, Some(0));

    count.set(21);
    assert!(ctx.take_rebuild_request());

    let (count, doubled) = build_counter(&ctx);
    assert_eq!(count.get(), Some(21));
    assert_eq!(doubled, Some(42));
}

#[test]
fn test_effect_sees_shared_value_writes() {
    let ctx = ContextState::standalone();
    let offset = ctx.use_shared_value_keyed("offset", || 0.0f32);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let signal = offset.signal();
    let seen_clone = Arc::clone(&seen);
    let _effect = ctx.reactive().lock().unwrap().create_effect(move |g| {
        if let Some(y) = g.get(signal) {
            seen_clone.lock().unwrap().push(y);
        }
    });

    offset.set(12.0);
    offset.set(30.5);

    assert_eq!(*seen.lock().unwrap(), vec![0.0, 12.0, 30.5]);
    assert!(!ctx.take_rebuild_request());
}

#[test]
fn test_nested_providers_shadow() {
    let mut ctx = ContextState::standalone();

    let (outer, inner, after) = ctx.provide(Theme("light"), |ctx| {
        let outer = ctx.use_context::<Theme>();
        let inner = ctx.provide(Theme("dark"), |ctx| ctx.use_context::<Theme>());
        let after = ctx.use_context::<Theme>();
        (outer, inner, after)
    });

    assert_eq!(outer, Some(Theme("light")));
    assert_eq!(inner, Some(Theme("dark")));
    assert_eq!(after, Some(Theme("light")));

    let missing = ctx.use_context_or_fail::<Theme>();
    assert_eq!(
        missing,
        Err(ContextError::MissingProvider {
            context: std::any::type_name::<Theme>(),
        })
    );
}

#[test]
fn test_forgotten_state_starts_over() {
    let ctx = ContextState::standalone();

    let count = ctx.use_state_keyed("counter", || 1);
    count.set(5);
    ctx.forget_signal_keyed::<i32>("counter");

    assert_eq!(count.get(), None);
    assert_eq!(ctx.use_state_keyed("counter", || 1).get(), Some(1));
}

#[test]
fn test_dispatcher_drives_shared_value() {
    let ctx = ContextState::standalone();
    let offset = ctx.use_shared_value_keyed("offset", || 0.0f32);
    let mut dispatcher = EventDispatcher::new();

    let offset_clone = offset.clone();
    dispatcher.register(1, nestable_core::events::event_types::SCROLL, move |event| {
        if let nestable_core::EventData::Scroll(scroll) = &event.data {
            offset_clone.set(scroll.content_offset.y);
        }
    });

    dispatcher.dispatch(&mut Event::scroll(1, ScrollEvent::vertical(88.0)));
    assert_eq!(offset.get(), Some(88.0));
}
