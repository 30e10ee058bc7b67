//! Element ids, class names, delays and notices used by the editor components.
//!
//! The defaults match the markup rendered by the admin page server. A page can
//! override any subset with a JSON object, e.g. in a `data-editor-config`
//! attribute on `<body>`.

use editor_types::{
    COPIED_NOTICE, COPY_FAILED_NOTICE, SAVE_FAILED_NOTICE, UNSAVED_CHANGES_NOTICE,
};
use serde::Deserialize;

use crate::error::{Result, UiError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Id of the edit form
    pub form_id: String,
    /// Form attribute holding "1" for a new resource and "0" for an existing one
    pub new_resource_attribute: String,
    pub warning_id: String,
    pub message_region_id: String,
    pub message_class: String,
    /// Fields whose change forces a full page save
    pub reload_class: String,
    pub copy_class: String,
    pub copied_class: String,

    /// Tag shared by every overlay element, used by dismissal
    pub overlay_tag: String,
    pub backdrop_class: String,
    pub modal_class: String,
    pub loader_class: String,
    /// Tag of elements that dismiss the overlay stack when activated
    pub close_tag: String,
    pub modal_active_class: String,

    pub message_delay_ms: u32,
    pub message_stagger_ms: u32,
    pub saved_message_delay_ms: u32,
    pub copied_indicator_ms: u32,
    pub modal_activation_ms: u32,
    /// Top and bottom margin of a modal taller than the viewport
    pub modal_margin_px: u32,

    pub unsaved_notice: String,
    pub copied_notice: String,
    pub copy_failed_notice: String,
    pub save_failed_notice: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            form_id: "edit_page".to_string(),
            new_resource_attribute: "data-new".to_string(),
            warning_id: "warning_message".to_string(),
            message_region_id: "system-messages".to_string(),
            message_class: "system-message".to_string(),
            reload_class: "i-reload".to_string(),
            copy_class: "clipboard".to_string(),
            copied_class: "copied".to_string(),
            overlay_tag: "to-close".to_string(),
            backdrop_class: "overlay".to_string(),
            modal_class: "modal".to_string(),
            loader_class: "loader".to_string(),
            close_tag: "close-modal-event".to_string(),
            modal_active_class: "modal-active".to_string(),
            message_delay_ms: 3000,
            message_stagger_ms: 3000,
            saved_message_delay_ms: 3000,
            copied_indicator_ms: 1000,
            modal_activation_ms: 10,
            modal_margin_px: 20,
            unsaved_notice: UNSAVED_CHANGES_NOTICE.to_string(),
            copied_notice: COPIED_NOTICE.to_string(),
            copy_failed_notice: COPY_FAILED_NOTICE.to_string(),
            save_failed_notice: SAVE_FAILED_NOTICE.to_string(),
        }
    }
}

impl UiConfig {
    /// Parse a partial JSON override on top of the defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| UiError::InvalidConfig(e.to_string()))
    }

    /// Removal delay of the `index`-th message of a freshly displayed batch
    pub fn message_removal_delay(&self, index: usize) -> u32 {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.message_delay_ms
            .saturating_add(index.saturating_mul(self.message_stagger_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = UiConfig::from_json(r#"{"form_id": "edit_media", "copied_indicator_ms": 500}"#)
            .unwrap();
        assert_eq!(config.form_id, "edit_media");
        assert_eq!(config.copied_indicator_ms, 500);
        assert_eq!(config.warning_id, "warning_message");
        assert_eq!(config.unsaved_notice, "There are unsaved changes.");
    }

    #[test]
    fn test_empty_override_is_default() {
        assert_eq!(UiConfig::from_json("  ").unwrap(), UiConfig::default());
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let err = UiConfig::from_json("{\"form_id\": 3}").unwrap_err();
        assert!(matches!(err, UiError::InvalidConfig(_)));
    }

    #[test]
    fn test_staggered_message_delays() {
        let config = UiConfig::default();
        assert_eq!(config.message_removal_delay(0), 3000);
        assert_eq!(config.message_removal_delay(1), 6000);
        assert_eq!(config.message_removal_delay(4), 15000);
    }
}
