//! Event dispatch system
//!
//! Events reported by the host's scroll views (scroll, layout and
//! content-size changes) and a dispatcher that routes them to handlers
//! registered per widget.

use rustc_hash::FxHashMap;

use crate::geometry::{Point, Rect, Size};

/// Event type identifier
pub type EventType = u32;

/// Common event types
pub mod event_types {
    use super::EventType;

    /// Content offset changed
    pub const SCROLL: EventType = 30;
    /// Viewport measured or re-measured
    pub const LAYOUT: EventType = 40;
    /// Content measured or re-measured
    pub const CONTENT_SIZE_CHANGE: EventType = 41;
}

/// Payload of a scroll notification
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollEvent {
    /// Offset of the content relative to the viewport
    pub content_offset: Point,
    /// Size of the scrollable content
    pub content_size: Size,
    /// Size of the viewport
    pub layout_measurement: Size,
}

impl ScrollEvent {
    /// Scroll event carrying only a vertical offset
    pub fn vertical(offset_y: f32) -> Self {
        Self {
            content_offset: Point::new(0.0, offset_y),
            ..Default::default()
        }
    }
}

/// Payload of a layout notification
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutEvent {
    /// Measured frame of the view
    pub layout: Rect,
}

impl LayoutEvent {
    pub fn new(layout: Rect) -> Self {
        Self { layout }
    }

    /// Layout event for a viewport of the given size at the origin
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            layout: Size::new(width, height).into(),
        }
    }
}

/// A UI event with associated data
#[derive(Clone, Debug)]
pub struct Event {
    pub event_type: EventType,
    pub target: u64, // Widget ID
    pub data: EventData,
    pub propagation_stopped: bool,
}

/// Event-specific data
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    Scroll(ScrollEvent),
    Layout(LayoutEvent),
    ContentSize { width: f32, height: f32 },
}

impl Event {
    pub fn new(event_type: EventType, target: u64, data: EventData) -> Self {
        Self {
            event_type,
            target,
            data,
            propagation_stopped: false,
        }
    }

    pub fn scroll(target: u64, scroll: ScrollEvent) -> Self {
        Self::new(event_types::SCROLL, target, EventData::Scroll(scroll))
    }

    pub fn layout(target: u64, layout: Rect) -> Self {
        Self::new(
            event_types::LAYOUT,
            target,
            EventData::Layout(LayoutEvent::new(layout)),
        )
    }

    pub fn content_size(target: u64, width: f32, height: f32) -> Self {
        Self::new(
            event_types::CONTENT_SIZE_CHANGE,
            target,
            EventData::ContentSize { width, height },
        )
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Event handler function type
pub type EventHandler = Box<dyn Fn(&Event) + Send + Sync>;

/// Dispatches events to registered handlers
pub struct EventDispatcher {
    handlers: FxHashMap<(u64, EventType), Vec<EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }

    /// Register an event handler for a widget and event type
    pub fn register<F>(&mut self, widget_id: u64, event_type: EventType, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handlers
            .entry((widget_id, event_type))
            .or_default()
            .push(Box::new(handler));
    }

    /// Remove every handler registered for a widget
    pub fn unregister(&mut self, widget_id: u64) {
        self.handlers.retain(|(id, _), _| *id != widget_id);
    }

    /// Number of handlers registered for a widget and event type
    pub fn handler_count(&self, widget_id: u64, event_type: EventType) -> usize {
        self.handlers
            .get(&(widget_id, event_type))
            .map_or(0, Vec::len)
    }

    /// Dispatch an event to all registered handlers
    pub fn dispatch(&self, event: &mut Event) {
        if let Some(handlers) = self.handlers.get(&(event.target, event.event_type)) {
            for handler in handlers {
                if event.propagation_stopped {
                    break;
                }
                handler(event);
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
