//! nestable_scroll
//!
//! An outer scroll container that shares its scroll state with nested
//! draggable lists.
//!
//! A [`NestableScrollContainer`] publishes a [`NestableScrollContext`] to
//! everything built inside it. Nested lists read the outer scroll offset and
//! the viewport and content heights from it, and can temporarily disable
//! outer scrolling while one of their items is being dragged.
//!
//! - Outer enablement is derived: enabled only while both the caller's
//!   `scroll_enabled` prop and the context's toggle are on
//! - Offset and size cells are written by the container's handlers without
//!   requesting a rebuild
//! - Reading the context outside a container fails with
//!   [`ScrollError::MissingProvider`]

pub mod config;
pub mod container;
pub mod context;
pub mod error;
pub mod scroll_ref;
pub mod stable_callback;

pub use config::{DecelerationRate, EdgeInsets, ScrollProps};
pub use container::{
    nestable_scroll_container, ContentSizeHandler, NestableScrollContainer, RenderedScrollView,
    ScrollChild, ScrollHandler, ScrollViewHandlers, SCROLL_EVENT_THROTTLE,
};
pub use context::{
    create_context_value, release_context_value, use_nestable_scroll_context,
    use_safe_nestable_scroll_context, NestableScrollContext, NestableScrollContextProvider,
};
pub use error::{Result, ScrollError};
pub use scroll_ref::{PendingScroll, ScrollRef};
pub use stable_callback::StableCallback;

/// Common imports for container and nested list authors.
pub mod prelude {
    pub use crate::config::ScrollProps;
    pub use crate::container::{nestable_scroll_container, NestableScrollContainer};
    pub use crate::context::{
        use_nestable_scroll_context, use_safe_nestable_scroll_context, NestableScrollContext,
    };
    pub use crate::error::ScrollError;
    pub use crate::scroll_ref::ScrollRef;
}
