//! Programmatic handle to a host scroll view
//!
//! A `ScrollRef` is what a caller forwards into a container to talk to the
//! underlying scroll view. Cloning it shares the same view; two refs are the
//! same ref when [`ScrollRef::ptr_eq`] says so.
//!
//! Scroll requests are queued, not applied: the host drains them once per
//! frame with [`ScrollRef::take_pending`] and applies them to the view.
//!
//! ```rust
//! use nestable_scroll::scroll_ref::{PendingScroll, ScrollRef};
//!
//! let scroll_ref = ScrollRef::new();
//! scroll_ref.scroll_to(240.0, true);
//!
//! assert_eq!(
//!     scroll_ref.take_pending(),
//!     Some(PendingScroll { x: 0.0, y: 240.0, animated: true })
//! );
//! assert_eq!(scroll_ref.take_pending(), None);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use nestable_core::{Point, Size};

/// A queued scroll request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingScroll {
    /// Target horizontal content offset
    pub x: f32,
    /// Target vertical content offset
    pub y: f32,
    /// Whether the host should animate to the target
    pub animated: bool,
}

/// State mirrored from the host scroll view
#[derive(Debug, Default)]
pub struct ScrollRefInner {
    /// Node id of the bound view, once the host has mounted it
    pub node: Option<u64>,
    /// Last reported content offset
    pub offset: Point,
    /// Last reported content size
    pub content_size: Size,
    /// Last reported viewport size
    pub viewport_size: Size,
    /// Last enablement applied to the view
    pub scroll_enabled: bool,
    /// Latest scroll request (newer requests replace older ones)
    pub pending: Option<PendingScroll>,
}

/// Shared inner state of a [`ScrollRef`]
pub type SharedScrollRefInner = Arc<Mutex<ScrollRefInner>>;

/// Callback invoked when a scroll request is queued
pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle to a host scroll view
#[derive(Clone)]
pub struct ScrollRef {
    inner: SharedScrollRefInner,
    trigger: TriggerCallback,
}

impl Default for ScrollRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScrollRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("ScrollRef")
            .field("node", &inner.node)
            .field("offset", &inner.offset)
            .field("pending", &inner.pending)
            .finish()
    }
}

impl ScrollRef {
    /// Create an unbound scroll ref
    pub fn new() -> Self {
        Self::with_inner(Self::new_inner(), Arc::new(|| {}))
    }

    /// Create a scroll ref that calls `trigger` whenever a request is queued
    pub fn with_trigger<F>(trigger: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_inner(Self::new_inner(), Arc::new(trigger))
    }

    /// Create a fresh inner state
    pub fn new_inner() -> SharedScrollRefInner {
        Arc::new(Mutex::new(ScrollRefInner {
            scroll_enabled: true,
            ..Default::default()
        }))
    }

    /// Wrap an existing inner state
    pub fn with_inner(inner: SharedScrollRefInner, trigger: TriggerCallback) -> Self {
        Self { inner, trigger }
    }

    /// Check whether two refs point at the same view
    pub fn ptr_eq(&self, other: &ScrollRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Host side
    // =========================================================================

    /// Bind the ref to a mounted view
    pub fn bind(&self, node: u64) {
        self.inner.lock().unwrap().node = Some(node);
    }

    /// Detach the ref from its view
    pub fn unbind(&self) {
        self.inner.lock().unwrap().node = None;
    }

    /// Node id of the bound view
    pub fn node(&self) -> Option<u64> {
        self.inner.lock().unwrap().node
    }

    /// Record the offset last reported by the view
    pub fn record_offset(&self, offset: Point) {
        self.inner.lock().unwrap().offset = offset;
    }

    /// Record the content size last reported by the view
    pub fn record_content_size(&self, size: Size) {
        self.inner.lock().unwrap().content_size = size;
    }

    /// Record the viewport size last reported by the view
    pub fn record_viewport_size(&self, size: Size) {
        self.inner.lock().unwrap().viewport_size = size;
    }

    /// Record the enablement applied to the view
    pub fn record_scroll_enabled(&self, enabled: bool) {
        self.inner.lock().unwrap().scroll_enabled = enabled;
    }

    /// Take the queued scroll request, if any
    pub fn take_pending(&self) -> Option<PendingScroll> {
        self.inner.lock().unwrap().pending.take()
    }

    // =========================================================================
    // Caller side
    // =========================================================================

    /// Last reported content offset
    pub fn offset(&self) -> Point {
        self.inner.lock().unwrap().offset
    }

    /// Whether user scrolling was enabled on the last build
    pub fn is_scroll_enabled(&self) -> bool {
        self.inner.lock().unwrap().scroll_enabled
    }

    /// Maximum vertical offset for the last reported sizes
    pub fn max_offset_y(&self) -> f32 {
        let inner = self.inner.lock().unwrap();
        (inner.content_size.height - inner.viewport_size.height).max(0.0)
    }

    /// Whether the view is scrolled to its last row
    pub fn is_at_bottom(&self) -> bool {
        self.offset().y >= self.max_offset_y()
    }

    /// Request a scroll to a vertical offset
    pub fn scroll_to(&self, y: f32, animated: bool) {
        let x = self.offset().x;
        self.queue(PendingScroll { x, y, animated });
    }

    /// Request a scroll to the top edge
    pub fn scroll_to_top(&self, animated: bool) {
        self.scroll_to(0.0, animated);
    }

    /// Request a scroll to the bottom edge
    pub fn scroll_to_end(&self, animated: bool) {
        let y = self.max_offset_y();
        self.scroll_to(y, animated);
    }

    /// Request a scroll relative to the last reported offset
    pub fn scroll_by(&self, dx: f32, dy: f32, animated: bool) {
        let offset = self.offset();
        self.queue(PendingScroll {
            x: offset.x + dx,
            y: offset.y + dy,
            animated,
        });
    }

    fn queue(&self, request: PendingScroll) {
        self.inner.lock().unwrap().pending = Some(request);
        tracing::trace!(
            "scroll request queued: ({:.1}, {:.1}) animated={}",
            request.x,
            request.y,
            request.animated
        );
        (self.trigger)();
    }
}
