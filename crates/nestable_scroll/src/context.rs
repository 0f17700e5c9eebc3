//! Shared scroll context
//!
//! Every container publishes one [`NestableScrollContext`] to the subtree it
//! builds. Nested draggable lists read it to learn where the outer view is
//! scrolled and how large it is, and to switch outer scrolling off while
//! they are being dragged.
//!
//! Outer scrolling is enabled only while both the caller's `scroll_enabled`
//! prop and the context's own toggle are true. The toggle starts out true.
//!
//! ```rust
//! use nestable_core::ContextState;
//! use nestable_scroll::context::{
//!     use_safe_nestable_scroll_context, NestableScrollContextProvider,
//! };
//!
//! let mut ctx = ContextState::standalone();
//!
//! let enabled = NestableScrollContextProvider::new("feed").provide(&mut ctx, |ctx| {
//!     let scroll = use_safe_nestable_scroll_context(ctx).unwrap();
//!     scroll.set_outer_scroll_enabled(false);
//!     scroll.outer_scroll_enabled()
//! });
//!
//! assert!(!enabled);
//! ```

use std::fmt;
use std::sync::Arc;

use nestable_core::{ContextState, Derived, SharedReactiveGraph, SharedValue, State};

use crate::error::Result;
use crate::scroll_ref::ScrollRef;

// Slot names, combined with the container key
const DEFAULT_OUTER_SCROLL_ENABLED: &str = "default_outer_scroll_enabled";
const SCROLL_ENABLED_PROP: &str = "scroll_enabled_prop";
const OUTER_SCROLL_ENABLED: &str = "outer_scroll_enabled";
const OUTER_SCROLL_OFFSET: &str = "outer_scroll_offset";
const CONTAINER_SIZE: &str = "container_size";
const SCROLL_VIEW_SIZE: &str = "scroll_view_size";
const SCROLLABLE_REF: &str = "scrollable_ref";

pub(crate) fn slot_key(key: &str, slot: &str) -> String {
    format!("nestable_scroll:{key}:{slot}")
}

/// Scroll coordination state shared by one container and its descendants
///
/// Cloning is cheap and every clone refers to the same cells.
#[derive(Clone)]
pub struct NestableScrollContext {
    outer_scroll_enabled: Derived<bool>,
    default_outer_scroll_enabled: State<bool>,
    outer_scroll_offset: SharedValue<f32>,
    container_size: SharedValue<f32>,
    scroll_view_size: SharedValue<f32>,
    scrollable_ref: ScrollRef,
    reactive: SharedReactiveGraph,
}

impl fmt::Debug for NestableScrollContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestableScrollContext")
            .field("outer_scroll_enabled", &self.outer_scroll_enabled())
            .field("outer_scroll_offset", &self.outer_scroll_offset.get())
            .field("container_size", &self.container_size.get())
            .field("scroll_view_size", &self.scroll_view_size.get())
            .finish()
    }
}

impl NestableScrollContext {
    /// Whether the outer view currently accepts user scrolling
    ///
    /// Reads `false` once the container has been unmounted.
    pub fn outer_scroll_enabled(&self) -> bool {
        self.reactive
            .lock()
            .unwrap()
            .get_derived(self.outer_scroll_enabled)
            .unwrap_or(false)
    }

    /// Derived node behind [`NestableScrollContext::outer_scroll_enabled`],
    /// for use in effects
    pub fn outer_scroll_enabled_derived(&self) -> Derived<bool> {
        self.outer_scroll_enabled
    }

    /// Toggle outer scrolling; nested lists set this to `false` while dragging
    ///
    /// The toggle is component state: writing it requests a rebuild so the
    /// container re-applies enablement to its view.
    pub fn set_outer_scroll_enabled(&self, enabled: bool) {
        tracing::debug!("outer scroll toggle set to {}", enabled);
        self.default_outer_scroll_enabled.set(enabled);
    }

    /// Current value of the toggle, ignoring the caller's prop
    ///
    /// Reads `false` once the container has been unmounted.
    pub fn default_outer_scroll_enabled(&self) -> bool {
        self.default_outer_scroll_enabled.get().unwrap_or(false)
    }

    /// Vertical content offset of the outer view
    pub fn outer_scroll_offset(&self) -> &SharedValue<f32> {
        &self.outer_scroll_offset
    }

    /// Measured viewport height of the outer view
    pub fn container_size(&self) -> &SharedValue<f32> {
        &self.container_size
    }

    /// Measured content height of the outer view
    pub fn scroll_view_size(&self) -> &SharedValue<f32> {
        &self.scroll_view_size
    }

    /// The ref in use for the outer view
    pub fn scrollable_ref(&self) -> &ScrollRef {
        &self.scrollable_ref
    }
}

/// Create or recover the context value for the container identified by `key`
///
/// The first call creates every cell: numeric cells at `0.0`, the toggle at
/// `true`. Later calls with the same key return the same cells, so values
/// survive rebuilds. The caller's `scroll_enabled` is re-applied on every
/// call and the derived enablement follows it.
///
/// A forwarded ref is used as-is. Without one, the container owns a ref that
/// is created on first use and kept for the container's lifetime.
pub fn create_context_value(
    ctx: &ContextState,
    key: &str,
    forwarded_ref: Option<ScrollRef>,
    scroll_enabled: bool,
) -> NestableScrollContext {
    let default_outer_scroll_enabled =
        ctx.use_state_keyed(&slot_key(key, DEFAULT_OUTER_SCROLL_ENABLED), || true);
    let scroll_enabled_prop =
        ctx.use_signal_keyed(&slot_key(key, SCROLL_ENABLED_PROP), || scroll_enabled);

    if ctx
        .reactive()
        .lock()
        .unwrap()
        .set_if_changed(scroll_enabled_prop, scroll_enabled)
    {
        tracing::debug!("container {} scroll_enabled -> {}", key, scroll_enabled);
    }

    let toggle = default_outer_scroll_enabled.signal();
    let enabled_key = slot_key(key, OUTER_SCROLL_ENABLED);
    let outer_scroll_enabled = ctx.use_derived_keyed(&enabled_key, move |g| {
        g.get(toggle).unwrap_or(true) && g.get(scroll_enabled_prop).unwrap_or(true)
    });

    let outer_scroll_offset =
        ctx.use_shared_value_keyed(&slot_key(key, OUTER_SCROLL_OFFSET), || 0.0f32);
    let container_size = ctx.use_shared_value_keyed(&slot_key(key, CONTAINER_SIZE), || 0.0f32);
    let scroll_view_size = ctx.use_shared_value_keyed(&slot_key(key, SCROLL_VIEW_SIZE), || 0.0f32);

    let scrollable_ref = match forwarded_ref {
        Some(forwarded) => forwarded,
        None => ctx.use_ref_keyed(&slot_key(key, SCROLLABLE_REF), ScrollRef::new),
    };

    NestableScrollContext {
        outer_scroll_enabled,
        default_outer_scroll_enabled,
        outer_scroll_offset,
        container_size,
        scroll_view_size,
        scrollable_ref,
        reactive: Arc::clone(ctx.reactive()),
    }
}

/// Drop every cell of the container identified by `key`
///
/// Handles still held elsewhere read `None` from their cells afterwards, and
/// `false` from both the toggle and the derived enablement. The next build
/// under the same key starts from scratch.
pub fn release_context_value(ctx: &ContextState, key: &str) {
    ctx.forget_derived_keyed::<bool>(&slot_key(key, OUTER_SCROLL_ENABLED));
    ctx.forget_signal_keyed::<bool>(&slot_key(key, DEFAULT_OUTER_SCROLL_ENABLED));
    ctx.forget_signal_keyed::<bool>(&slot_key(key, SCROLL_ENABLED_PROP));
    ctx.forget_signal_keyed::<f32>(&slot_key(key, OUTER_SCROLL_OFFSET));
    ctx.forget_signal_keyed::<f32>(&slot_key(key, CONTAINER_SIZE));
    ctx.forget_signal_keyed::<f32>(&slot_key(key, SCROLL_VIEW_SIZE));
    ctx.forget_ref_keyed::<ScrollRef>(&slot_key(key, SCROLLABLE_REF));
    tracing::debug!("released scroll context for container {}", key);
}

/// Publishes a [`NestableScrollContext`] to the subtree built inside it
pub struct NestableScrollContextProvider<'a> {
    key: &'a str,
    forwarded_ref: Option<ScrollRef>,
    scroll_enabled: bool,
}

impl<'a> NestableScrollContextProvider<'a> {
    pub fn new(key: &'a str) -> Self {
        Self {
            key,
            forwarded_ref: None,
            scroll_enabled: true,
        }
    }

    /// Use the caller's ref instead of an internally owned one
    pub fn forwarded_ref(mut self, forwarded_ref: Option<ScrollRef>) -> Self {
        self.forwarded_ref = forwarded_ref;
        self
    }

    /// Caller's enablement prop
    pub fn scroll_enabled(mut self, enabled: bool) -> Self {
        self.scroll_enabled = enabled;
        self
    }

    /// Build `children` with the context value visible to them
    pub fn provide<R, F>(self, ctx: &mut ContextState, children: F) -> R
    where
        F: FnOnce(&mut ContextState) -> R,
    {
        let value = create_context_value(ctx, self.key, self.forwarded_ref, self.scroll_enabled);
        ctx.provide(value, children)
    }
}

/// Nearest enclosing scroll context, if any
pub fn use_nestable_scroll_context(ctx: &ContextState) -> Option<NestableScrollContext> {
    ctx.use_context::<NestableScrollContext>()
}

/// Nearest enclosing scroll context
///
/// Fails with [`ScrollError::MissingProvider`](crate::error::ScrollError::MissingProvider)
/// when called outside a container: the component was composed in the
/// wrong place.
pub fn use_safe_nestable_scroll_context(ctx: &ContextState) -> Result<NestableScrollContext> {
    Ok(ctx.use_context_or_fail::<NestableScrollContext>()?)
}
