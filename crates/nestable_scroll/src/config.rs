//! Scroll view props
//!
//! The standard scroll-view configuration a container forwards to the host
//! view. Props can be built fluently or loaded from TOML:
//!
//! ```rust
//! use nestable_scroll::config::{DecelerationRate, ScrollProps};
//!
//! let props = ScrollProps::from_toml_str(
//!     r#"
//!     scroll_enabled = false
//!     deceleration_rate = "fast"
//!
//!     [content_inset]
//!     bottom = 24.0
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(props.scroll_enabled, Some(false));
//! assert_eq!(props.deceleration_rate, DecelerationRate::Fast);
//! assert_eq!(props.content_inset.bottom, 24.0);
//! assert!(props.bounces);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Insets applied around the scrollable content
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeInsets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

/// How quickly momentum scrolling comes to rest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecelerationRate {
    #[default]
    Normal,
    Fast,
}

/// Props of the host scroll view
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollProps {
    /// Caller's enablement; `None` means enabled
    ///
    /// This is one input to the container's enablement, not the final
    /// value: a nested drag can still disable scrolling.
    pub scroll_enabled: Option<bool>,
    /// Scroll horizontally instead of vertically
    pub horizontal: bool,
    /// Bounce past the content edges
    pub bounces: bool,
    pub shows_vertical_scroll_indicator: bool,
    pub shows_horizontal_scroll_indicator: bool,
    pub content_inset: EdgeInsets,
    pub deceleration_rate: DecelerationRate,
}

impl Default for ScrollProps {
    fn default() -> Self {
        Self {
            scroll_enabled: None,
            horizontal: false,
            bounces: true,
            shows_vertical_scroll_indicator: true,
            shows_horizontal_scroll_indicator: true,
            content_inset: EdgeInsets::default(),
            deceleration_rate: DecelerationRate::Normal,
        }
    }
}

impl ScrollProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse props from a TOML document; missing fields take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Caller's enablement with the default applied
    pub fn resolved_scroll_enabled(&self) -> bool {
        self.scroll_enabled.unwrap_or(true)
    }

    // =========================================================================
    // Builder
    // =========================================================================

    pub fn scroll_enabled(mut self, enabled: bool) -> Self {
        self.scroll_enabled = Some(enabled);
        self
    }

    pub fn horizontal(mut self, horizontal: bool) -> Self {
        self.horizontal = horizontal;
        self
    }

    pub fn bounces(mut self, bounces: bool) -> Self {
        self.bounces = bounces;
        self
    }

    /// Hide both scroll indicators
    pub fn hide_indicators(mut self) -> Self {
        self.shows_vertical_scroll_indicator = false;
        self.shows_horizontal_scroll_indicator = false;
        self
    }

    pub fn content_inset(mut self, inset: EdgeInsets) -> Self {
        self.content_inset = inset;
        self
    }

    pub fn deceleration_rate(mut self, rate: DecelerationRate) -> Self {
        self.deceleration_rate = rate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = ScrollProps::default();
        assert_eq!(props.scroll_enabled, None);
        assert!(props.resolved_scroll_enabled());
        assert!(props.bounces);
        assert!(!props.horizontal);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let props = ScrollProps::from_toml_str("").unwrap();
        assert_eq!(props, ScrollProps::default());
    }

    #[test]
    fn test_builder() {
        let props = ScrollProps::new()
            .scroll_enabled(false)
            .horizontal(true)
            .bounces(false)
            .hide_indicators();

        assert!(!props.resolved_scroll_enabled());
        assert!(props.horizontal);
        assert!(!props.bounces);
        assert!(!props.shows_vertical_scroll_indicator);
    }

    #[test]
    fn test_inset_and_deceleration_match_toml() {
        let inset = EdgeInsets {
            top: 8.0,
            bottom: 24.0,
            ..EdgeInsets::default()
        };
        let built = ScrollProps::new()
            .content_inset(inset)
            .deceleration_rate(DecelerationRate::Fast);

        let source = "deceleration_rate = \"fast\"\n\n[content_inset]\ntop = 8.0\nbottom = 24.0\n";
        let parsed = ScrollProps::from_toml_str(source).unwrap();

        assert_eq!(built.content_inset.top, 8.0);
        assert_eq!(built.content_inset.left, 0.0);
        assert_eq!(built.deceleration_rate, DecelerationRate::Fast);
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ScrollProps::from_toml_str("bounces = \"sometimes\"").unwrap_err();
        assert!(matches!(err, crate::error::ScrollError::Config(_)));
    }
}
