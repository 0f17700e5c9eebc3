//! Nestable scroll container
//!
//! An outer scroll view that can host nested draggable lists. On every build
//! the container:
//!
//! 1. Publishes a [`NestableScrollContext`] to its children
//! 2. Produces a [`RenderedScrollView`] for the host, with handlers that
//!    write the view's scroll offset, viewport height and content height
//!    into the context's cells
//! 3. Sets the view's enablement to the context's derived
//!    `outer_scroll_enabled`, overriding the caller's `scroll_enabled` prop
//!
//! # Example
//!
//! ```rust
//! use nestable_core::{ContextState, LayoutEvent, ScrollEvent};
//! use nestable_scroll::prelude::*;
//! use nestable_scroll::Result;
//!
//! let mut ctx = ContextState::standalone();
//!
//! // A nested list grabs the context while it is built
//! let nested_list = |ctx: &mut ContextState| -> Result<()> {
//!     let scroll = use_safe_nestable_scroll_context(ctx)?;
//!     scroll.set_outer_scroll_enabled(false);
//!     Ok(())
//! };
//! let container = nestable_scroll_container("settings").child(nested_list);
//!
//! let view = container.build(&mut ctx).unwrap();
//! view.handlers.on_layout(&LayoutEvent::with_size(320.0, 400.0));
//! view.handlers.on_scroll(&ScrollEvent::vertical(123.5));
//!
//! // The child disabled outer scrolling; the next build applies it
//! assert!(ctx.take_rebuild_request());
//! let view = container.build(&mut ctx).unwrap();
//! assert!(!view.scroll_enabled);
//! ```

use std::fmt;
use std::sync::Arc;

use nestable_core::events::event_types;
use nestable_core::{ContextState, EventData, EventDispatcher, LayoutEvent, ScrollEvent, Size};

use crate::config::ScrollProps;
use crate::context::{
    release_context_value, slot_key, use_safe_nestable_scroll_context, NestableScrollContext,
    NestableScrollContextProvider,
};
use crate::error::Result;
use crate::scroll_ref::ScrollRef;
use crate::stable_callback::StableCallback;

/// Host scroll events are delivered for every pixel of movement
pub const SCROLL_EVENT_THROTTLE: u32 = 1;

// Slot names for the stable handlers
const ON_SCROLL: &str = "on_scroll";
const ON_LAYOUT: &str = "on_layout";
const ON_CONTENT_SIZE_CHANGE: &str = "on_content_size_change";

/// Caller scroll handler
pub type ScrollHandler = Arc<dyn Fn(&ScrollEvent) + Send + Sync>;

/// Caller content-size handler, called with `(width, height)`
pub type ContentSizeHandler = Arc<dyn Fn(f32, f32) + Send + Sync>;

/// A child built inside the container, with the scroll context in reach
pub trait ScrollChild: Send + Sync {
    fn build(&self, ctx: &mut ContextState) -> Result<()>;
}

impl<F> ScrollChild for F
where
    F: Fn(&mut ContextState) -> Result<()> + Send + Sync,
{
    fn build(&self, ctx: &mut ContextState) -> Result<()> {
        self(ctx)
    }
}

// ============================================================================
// Rendered output
// ============================================================================

/// Handlers the host calls when its scroll view reports changes
#[derive(Clone)]
pub struct ScrollViewHandlers {
    scroll: StableCallback<ScrollEvent>,
    layout: StableCallback<LayoutEvent>,
    content_size: StableCallback<Size>,
}

impl fmt::Debug for ScrollViewHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollViewHandlers")
            .field("scroll", &self.scroll)
            .field("layout", &self.layout)
            .field("content_size", &self.content_size)
            .finish()
    }
}

impl ScrollViewHandlers {
    /// The view scrolled
    pub fn on_scroll(&self, event: &ScrollEvent) {
        self.scroll.call(event);
    }

    /// The view was measured
    pub fn on_layout(&self, event: &LayoutEvent) {
        self.layout.call(event);
    }

    /// The content was measured
    pub fn on_content_size_change(&self, width: f32, height: f32) {
        self.content_size.call(&Size::new(width, height));
    }

    /// Scroll handler; the same instance across rebuilds
    pub fn scroll_handler(&self) -> &StableCallback<ScrollEvent> {
        &self.scroll
    }

    /// Layout handler; the same instance across rebuilds
    pub fn layout_handler(&self) -> &StableCallback<LayoutEvent> {
        &self.layout
    }

    /// Content-size handler; the same instance across rebuilds
    pub fn content_size_handler(&self) -> &StableCallback<Size> {
        &self.content_size
    }

    /// Route raw host events for `node` to these handlers
    ///
    /// Handlers from a previous build registered for the same node are
    /// replaced.
    pub fn attach(&self, dispatcher: &mut EventDispatcher, node: u64) {
        dispatcher.unregister(node);

        let handlers = self.clone();
        dispatcher.register(node, event_types::SCROLL, move |event| {
            if let EventData::Scroll(scroll) = &event.data {
                handlers.on_scroll(scroll);
            }
        });

        let handlers = self.clone();
        dispatcher.register(node, event_types::LAYOUT, move |event| {
            if let EventData::Layout(layout) = &event.data {
                handlers.on_layout(layout);
            }
        });

        let handlers = self.clone();
        dispatcher.register(node, event_types::CONTENT_SIZE_CHANGE, move |event| {
            if let EventData::ContentSize { width, height } = event.data {
                handlers.on_content_size_change(width, height);
            }
        });
    }
}

/// What the container asks the host to render
#[derive(Debug, Clone)]
pub struct RenderedScrollView {
    /// Caller props, forwarded unchanged
    pub props: ScrollProps,
    /// Final enablement; always the context's `outer_scroll_enabled`
    pub scroll_enabled: bool,
    /// Always [`SCROLL_EVENT_THROTTLE`]
    pub scroll_event_throttle: u32,
    /// Ref the host binds to its view
    pub scroll_ref: ScrollRef,
    pub handlers: ScrollViewHandlers,
}

// ============================================================================
// Inner container
// ============================================================================

/// Binds the host view to the context published by the enclosing provider
struct NestableScrollContainerInner<'a> {
    key: &'a str,
    props: &'a ScrollProps,
    on_scroll: Option<&'a ScrollHandler>,
    on_content_size_change: Option<&'a ContentSizeHandler>,
    children: &'a [Box<dyn ScrollChild>],
}

impl NestableScrollContainerInner<'_> {
    fn build(&self, ctx: &mut ContextState) -> Result<RenderedScrollView> {
        let scroll = use_safe_nestable_scroll_context(ctx)?;

        let handlers = ScrollViewHandlers {
            scroll: self.scroll_handler(ctx, &scroll),
            layout: self.layout_handler(ctx, &scroll),
            content_size: self.content_size_handler(ctx, &scroll),
        };

        let scroll_ref = scroll.scrollable_ref();
        let scroll_enabled = scroll.outer_scroll_enabled();
        scroll_ref.record_scroll_enabled(scroll_enabled);

        for child in self.children {
            child.build(ctx)?;
        }

        Ok(RenderedScrollView {
            props: self.props.clone(),
            scroll_enabled,
            scroll_event_throttle: SCROLL_EVENT_THROTTLE,
            scroll_ref: scroll_ref.clone(),
            handlers,
        })
    }

    /// The caller sees the event before the offset cell is written
    fn scroll_handler(
        &self,
        ctx: &ContextState,
        scroll: &NestableScrollContext,
    ) -> StableCallback<ScrollEvent> {
        let handler = ctx.use_ref_keyed(&slot_key(self.key, ON_SCROLL), StableCallback::default);

        let caller = self.on_scroll.cloned();
        let offset = scroll.outer_scroll_offset().clone();
        let scroll_ref = scroll.scrollable_ref().clone();
        handler.replace(move |event: &ScrollEvent| {
            if let Some(caller) = &caller {
                caller(event);
            }
            tracing::trace!("outer scroll offset -> {:.1}", event.content_offset.y);
            offset.set(event.content_offset.y);
            scroll_ref.record_offset(event.content_offset);
        });
        handler
    }

    fn layout_handler(
        &self,
        ctx: &ContextState,
        scroll: &NestableScrollContext,
    ) -> StableCallback<LayoutEvent> {
        let handler = ctx.use_ref_keyed(&slot_key(self.key, ON_LAYOUT), StableCallback::default);

        let container_size = scroll.container_size().clone();
        let scroll_ref = scroll.scrollable_ref().clone();
        handler.replace(move |event: &LayoutEvent| {
            tracing::trace!("outer container size -> {:.1}", event.layout.height());
            container_size.set(event.layout.height());
            scroll_ref.record_viewport_size(event.layout.size);
        });
        handler
    }

    /// The cell is written before the caller sees the new size
    fn content_size_handler(
        &self,
        ctx: &ContextState,
        scroll: &NestableScrollContext,
    ) -> StableCallback<Size> {
        let handler = ctx.use_ref_keyed(
            &slot_key(self.key, ON_CONTENT_SIZE_CHANGE),
            StableCallback::default,
        );

        let caller = self.on_content_size_change.cloned();
        let scroll_view_size = scroll.scroll_view_size().clone();
        let scroll_ref = scroll.scrollable_ref().clone();
        handler.replace(move |size: &Size| {
            tracing::trace!("outer content size -> {:.1}", size.height);
            scroll_view_size.set(size.height);
            scroll_ref.record_content_size(*size);
            if let Some(caller) = &caller {
                caller(size.width, size.height);
            }
        });
        handler
    }
}

// ============================================================================
// Public container
// ============================================================================

/// A scroll container that shares its scroll state with nested lists
///
/// The container itself holds no state: everything lives in keyed state
/// under its key, so rebuilding a container with the same key picks up
/// where the last build left off.
pub struct NestableScrollContainer {
    key: String,
    props: ScrollProps,
    forwarded_ref: Option<ScrollRef>,
    on_scroll: Option<ScrollHandler>,
    on_content_size_change: Option<ContentSizeHandler>,
    children: Vec<Box<dyn ScrollChild>>,
}

impl fmt::Debug for NestableScrollContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestableScrollContainer")
            .field("key", &self.key)
            .field("props", &self.props)
            .field("forwarded_ref", &self.forwarded_ref)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

impl NestableScrollContainer {
    /// Create a container whose state is kept under `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            props: ScrollProps::default(),
            forwarded_ref: None,
            on_scroll: None,
            on_content_size_change: None,
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace all scroll view props
    pub fn props(mut self, props: ScrollProps) -> Self {
        self.props = props;
        self
    }

    /// Caller's enablement; a nested drag can still disable scrolling
    pub fn scroll_enabled(mut self, enabled: bool) -> Self {
        self.props.scroll_enabled = Some(enabled);
        self
    }

    /// Use the caller's ref for the host view
    pub fn bind(mut self, scroll_ref: &ScrollRef) -> Self {
        self.forwarded_ref = Some(scroll_ref.clone());
        self
    }

    pub fn on_scroll<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ScrollEvent) + Send + Sync + 'static,
    {
        self.on_scroll = Some(Arc::new(handler));
        self
    }

    pub fn on_content_size_change<F>(mut self, handler: F) -> Self
    where
        F: Fn(f32, f32) + Send + Sync + 'static,
    {
        self.on_content_size_change = Some(Arc::new(handler));
        self
    }

    /// Add a child built inside the container's scroll context
    pub fn child(mut self, child: impl ScrollChild + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    /// Build the container and its children
    pub fn build(&self, ctx: &mut ContextState) -> Result<RenderedScrollView> {
        let inner = NestableScrollContainerInner {
            key: &self.key,
            props: &self.props,
            on_scroll: self.on_scroll.as_ref(),
            on_content_size_change: self.on_content_size_change.as_ref(),
            children: &self.children,
        };

        NestableScrollContextProvider::new(&self.key)
            .forwarded_ref(self.forwarded_ref.clone())
            .scroll_enabled(self.props.resolved_scroll_enabled())
            .provide(ctx, |ctx| inner.build(ctx))
    }

    /// Drop all state kept for this container
    pub fn unmount(&self, ctx: &ContextState) {
        release_context_value(ctx, &self.key);
        ctx.forget_ref_keyed::<StableCallback<ScrollEvent>>(&slot_key(&self.key, ON_SCROLL));
        ctx.forget_ref_keyed::<StableCallback<LayoutEvent>>(&slot_key(&self.key, ON_LAYOUT));
        ctx.forget_ref_keyed::<StableCallback<Size>>(&slot_key(&self.key, ON_CONTENT_SIZE_CHANGE));
        if let Some(scroll_ref) = &self.forwarded_ref {
            scroll_ref.unbind();
        }
    }
}

/// Create a nestable scroll container whose state is kept under `key`
pub fn nestable_scroll_container(key: impl Into<String>) -> NestableScrollContainer {
    NestableScrollContainer::new(key)
}
