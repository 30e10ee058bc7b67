//! Shared types between the editor UI and the page server
//!
//! These types are used by both:
//! - the browser behavior layer (`editor-ui`, WASM)
//! - anything on the server side that needs to read a submitted form
//!
//! Serializable with serde so snapshots can travel as JSON when needed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Markers
// ============================================================================

/// Query parameter appended to the form action for a background save
pub const BACKGROUND_SAVE_PARAM: &str = "ajax";
pub const BACKGROUND_SAVE_VALUE: &str = "1";

/// Notice shown in the warning region once a session turns dirty
pub const UNSAVED_CHANGES_NOTICE: &str = "There are unsaved changes.";

/// Text of the transient indicator shown next to a copied field
pub const COPIED_NOTICE: &str = "Copied!";
pub const COPY_FAILED_NOTICE: &str = "Copy failed!";

/// Error message rendered when a background save does not come back with 200
pub const SAVE_FAILED_NOTICE: &str = "The page could not be saved.";

/// Append the background-save marker to a form action.
///
/// Uses `&` when the action already carries a query string, `?` otherwise.
pub fn with_background_marker(action: &str) -> String {
    let separator = if action.contains('?') {
        if action.ends_with('?') || action.ends_with('&') {
            ""
        } else {
            "&"
        }
    } else {
        "?"
    };
    format!("{action}{separator}{BACKGROUND_SAVE_PARAM}={BACKGROUND_SAVE_VALUE}")
}

// ============================================================================
// Editing Session
// ============================================================================

/// Whether the open form holds edits that were not acknowledged by the server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DirtyState {
    #[default]
    Clean,
    Dirty,
}

/// How the next submit reaches the server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Regular form submission followed by a full page load
    #[default]
    Navigational,
    /// Asynchronous submission that only refreshes the message region
    Background,
}

// ============================================================================
// Form Controls
// ============================================================================

/// One `<option>` of a select control
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectOption {
    /// Effective value: the `value` attribute, or the label when it is absent
    pub value: String,
    pub text: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            selected,
        }
    }

    /// Multi-select value, falling back to the label when the value is empty
    pub fn submitted(&self) -> &str {
        if self.value.is_empty() {
            &self.text
        } else {
            &self.value
        }
    }
}

/// Current state of a form control, read from the document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ControlState {
    /// Text-like inputs, hidden inputs and textareas
    Text { value: String },
    Checkbox { value: String, checked: bool },
    Radio { value: String, checked: bool },
    /// `<input type="file">`; `value` is the browser's file name
    File { value: String },
    Select {
        options: Vec<SelectOption>,
        multiple: bool,
    },
}

/// A named control of an edit form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormControl {
    pub name: String,
    pub disabled: bool,
    pub state: ControlState,
}

impl FormControl {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            state: ControlState::Text {
                value: value.into(),
            },
        }
    }

    pub fn checkbox(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            state: ControlState::Checkbox {
                value: value.into(),
                checked,
            },
        }
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            state: ControlState::Radio {
                value: value.into(),
                checked,
            },
        }
    }

    pub fn select(name: impl Into<String>, options: Vec<SelectOption>, multiple: bool) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            state: ControlState::Select { options, multiple },
        }
    }

    pub fn file(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            state: ControlState::File {
                value: value.into(),
            },
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

// ============================================================================
// Form Snapshot
// ============================================================================

/// Value contributed by a single field name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text, checkbox and radio values
    Text(String),
    /// The chosen option of a single select
    Selected(String),
    /// Every chosen option of a multi-select, in option order
    Multiple(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) | FieldValue::Selected(value) => Some(value.as_str()),
            FieldValue::Multiple(_) => None,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(value) | FieldValue::Selected(value) => vec![value.as_str()],
            FieldValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Ordered mapping from field name to value, derived from the form controls
///
/// Every named, enabled control contributes exactly one entry. Radio groups
/// start as an empty string and take the checked member's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormSnapshot {
    fields: IndexMap<String, FieldValue>,
}

impl FormSnapshot {
    pub fn from_controls<'a, I>(controls: I) -> Self
    where
        I: IntoIterator<Item = &'a FormControl>,
    {
        let mut fields = IndexMap::new();
        for control in controls {
            if control.name.is_empty() || control.disabled {
                continue;
            }
            match &control.state {
                ControlState::Text { value } | ControlState::File { value } => {
                    fields.insert(control.name.clone(), FieldValue::Text(value.clone()));
                }
                ControlState::Checkbox { value, checked } => {
                    let value = if *checked { value.clone() } else { String::new() };
                    fields.insert(control.name.clone(), FieldValue::Text(value));
                }
                ControlState::Radio { value, checked } => {
                    let entry = fields
                        .entry(control.name.clone())
                        .or_insert_with(|| FieldValue::Text(String::new()));
                    if *checked {
                        *entry = FieldValue::Text(value.clone());
                    }
                }
                ControlState::Select {
                    options,
                    multiple: true,
                } => {
                    let values = options
                        .iter()
                        .filter(|option| option.selected)
                        .map(|option| option.submitted().to_string())
                        .collect();
                    fields.insert(control.name.clone(), FieldValue::Multiple(values));
                }
                ControlState::Select {
                    options,
                    multiple: false,
                } => {
                    let value = options
                        .iter()
                        .find(|option| option.selected)
                        .map(|option| option.value.clone())
                        .unwrap_or_default();
                    fields.insert(control.name.clone(), FieldValue::Selected(value));
                }
            }
        }
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Flatten into `(name, value)` pairs, one per selected option for
    /// multi-selects, in field order. This is how a multipart body carries it.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |value| (name.as_str(), value))
            })
            .collect()
    }
}

// ============================================================================
// Submit Body
// ============================================================================

/// `(name, value)` entries a native form submission would send
///
/// Unlike [`FormSnapshot`], unchecked checkboxes, unset radio groups and
/// selects without a chosen option contribute nothing. File inputs are left
/// out because their content only exists in the browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SubmitBody {
    entries: Vec<(String, String)>,
}

impl SubmitBody {
    pub fn from_controls<'a, I>(controls: I) -> Self
    where
        I: IntoIterator<Item = &'a FormControl>,
    {
        let mut entries = Vec::new();
        for control in controls {
            if control.name.is_empty() || control.disabled {
                continue;
            }
            match &control.state {
                ControlState::Text { value } => {
                    entries.push((control.name.clone(), value.clone()));
                }
                ControlState::Checkbox { value, checked }
                | ControlState::Radio { value, checked } => {
                    if *checked {
                        entries.push((control.name.clone(), value.clone()));
                    }
                }
                ControlState::File { .. } => {}
                ControlState::Select { options, multiple } => {
                    let selected = options.iter().filter(|option| option.selected);
                    let take = if *multiple { usize::MAX } else { 1 };
                    for option in selected.take(take) {
                        entries.push((control.name.clone(), option.value.clone()));
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }
}

// ============================================================================
// Code Editor Modes
// ============================================================================

/// Map a file extension (or block mode key) to a code editor mode.
///
/// Unknown keys select no specific mode, i.e. plain text.
pub fn editor_mode(key: &str) -> Option<&'static str> {
    match key {
        "html" => Some("htmlmixed"),
        "md" => Some("markdown"),
        "xml" => Some("xml"),
        "css" => Some("css"),
        "js" | "json" => Some("javascript"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_checked_and_unchecked() {
        let checked = FormSnapshot::from_controls(&[FormControl::checkbox("enabled", "1", true)]);
        assert_eq!(
            checked.get("enabled"),
            Some(&FieldValue::Text("1".to_string()))
        );

        let unchecked =
            FormSnapshot::from_controls(&[FormControl::checkbox("enabled", "1", false)]);
        assert_eq!(
            unchecked.get("enabled"),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_multi_select_keeps_option_order() {
        let controls = [FormControl::select(
            "tags",
            vec![
                SelectOption::new("news", "News", true),
                SelectOption::new("blog", "Blog", false),
                SelectOption::new("", "Misc", true),
            ],
            true,
        )];
        let snapshot = FormSnapshot::from_controls(&controls);
        assert_eq!(
            snapshot.get("tags"),
            Some(&FieldValue::Multiple(vec![
                "news".to_string(),
                "Misc".to_string()
            ]))
        );
    }

    #[test]
    fn test_single_select_without_selection_is_empty() {
        let controls = [FormControl::select(
            "robots",
            vec![SelectOption::new("index", "Index", false)],
            false,
        )];
        let snapshot = FormSnapshot::from_controls(&controls);
        assert_eq!(
            snapshot.get("robots"),
            Some(&FieldValue::Selected(String::new()))
        );
    }

    #[test]
    fn test_single_select_uses_option_value_not_label() {
        let controls = [FormControl::select(
            "robots",
            vec![
                SelectOption::new("", "\u{a0}", true),
                SelectOption::new("noindex", "No index", false),
            ],
            false,
        )];
        let snapshot = FormSnapshot::from_controls(&controls);
        assert_eq!(
            snapshot.get("robots"),
            Some(&FieldValue::Selected(String::new()))
        );
    }

    #[test]
    fn test_radio_group_contributes_one_entry() {
        let unset = FormSnapshot::from_controls(&[
            FormControl::radio("layout", "wide", false),
            FormControl::radio("layout", "narrow", false),
        ]);
        assert_eq!(unset.len(), 1);
        assert_eq!(unset.get("layout"), Some(&FieldValue::Text(String::new())));

        let set = FormSnapshot::from_controls(&[
            FormControl::text("title", "Home"),
            FormControl::radio("layout", "wide", false),
            FormControl::radio("layout", "narrow", true),
            FormControl::text("slug", "home"),
        ]);
        assert_eq!(set.get("layout"), Some(&FieldValue::Text("narrow".into())));
        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["title", "layout", "slug"]);
    }

    #[test]
    fn test_disabled_and_unnamed_controls_are_skipped() {
        let snapshot = FormSnapshot::from_controls(&[
            FormControl::text("", "ignored"),
            FormControl::text("title", "Home").disabled(),
            FormControl::text("slug", "home"),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("title").is_none());
    }

    #[test]
    fn test_pairs_flatten_multi_select() {
        let mut snapshot = FormSnapshot::default();
        snapshot.insert("title", FieldValue::Text("Home".into()));
        snapshot.insert(
            "tags",
            FieldValue::Multiple(vec!["a".to_string(), "b".to_string()]),
        );
        assert_eq!(
            snapshot.pairs(),
            vec![("title", "Home"), ("tags", "a"), ("tags", "b")]
        );
    }

    #[test]
    fn test_snapshot_serializes_as_ordered_object() {
        let snapshot = FormSnapshot::from_controls(&[
            FormControl::text("title", "Home"),
            FormControl::checkbox("enabled", "1", true),
        ]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"title":"Home","enabled":"1"}"#);
    }

    #[test]
    fn test_submit_body_omits_unset_controls() {
        let body = SubmitBody::from_controls(&[
            FormControl::text("form_method", "save"),
            FormControl::checkbox("image_remove", "1", false),
            FormControl::radio("layout", "wide", false),
            FormControl::radio("layout", "narrow", false),
            FormControl::select(
                "robots",
                vec![SelectOption::new("index", "Index", false)],
                false,
            ),
            FormControl::file("image", "C:\\fakepath\\a.png"),
        ]);
        assert_eq!(body.pairs(), vec![("form_method", "save")]);
    }

    #[test]
    fn test_submit_body_follows_native_rules() {
        let body = SubmitBody::from_controls(&[
            FormControl::text("title", "Home"),
            FormControl::checkbox("enabled", "1", true),
            FormControl::radio("layout", "wide", false),
            FormControl::radio("layout", "narrow", true),
            FormControl::select(
                "robots",
                vec![
                    SelectOption::new("", "\u{a0}", true),
                    SelectOption::new("noindex", "No index", false),
                ],
                false,
            ),
            FormControl::select(
                "tags",
                vec![
                    SelectOption::new("news", "News", true),
                    SelectOption::new("blog", "Blog", false),
                    SelectOption::new("misc", "Misc", true),
                ],
                true,
            ),
            FormControl::text("locked", "x").disabled(),
        ]);
        assert_eq!(
            body.pairs(),
            vec![
                ("title", "Home"),
                ("enabled", "1"),
                ("layout", "narrow"),
                ("robots", ""),
                ("tags", "news"),
                ("tags", "misc"),
            ]
        );
        assert_eq!(body.get_all("tags"), vec!["news", "misc"]);
        assert!(!body.contains("locked"));
    }

    #[test]
    fn test_background_marker() {
        assert_eq!(
            with_background_marker("/admin/page?edit=home.html"),
            "/admin/page?edit=home.html&ajax=1"
        );
        assert_eq!(with_background_marker("/admin/page"), "/admin/page?ajax=1");
        assert_eq!(
            with_background_marker("/admin/page?edit="),
            "/admin/page?edit=&ajax=1"
        );
    }

    #[test]
    fn test_editor_modes() {
        assert_eq!(editor_mode("html"), Some("htmlmixed"));
        assert_eq!(editor_mode("md"), Some("markdown"));
        assert_eq!(editor_mode("json"), Some("javascript"));
        assert_eq!(editor_mode("txt"), None);
        assert_eq!(editor_mode(""), None);
    }
}
