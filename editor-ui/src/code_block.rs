//! Code editor blocks embedded in the edit form.

use std::rc::{Rc, Weak};

use editor_types::editor_mode;

use crate::dom::{Document, DomEvent, EventKind};

/// The embeddable code editor widget
pub trait CodeEditor {
    fn on_change(&self, listener: Rc<dyn Fn()>);
    /// `None` selects plain text
    fn set_mode(&self, mode: Option<&str>);
    fn focus(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOptions {
    /// Id of the textarea the editor replaces
    pub textarea_id: String,
    /// A mode key (`html`, `md`, ...) or `$name` to follow the `i_name` selector
    pub mode: String,
    /// Extension of the file being edited, may be empty
    pub extension: String,
    pub focus: bool,
}

impl BlockOptions {
    pub fn new(textarea_id: &str, mode: &str, extension: &str, focus: bool) -> Self {
        Self {
            textarea_id: textarea_id.to_string(),
            mode: mode.to_string(),
            extension: extension.to_string(),
            focus,
        }
    }

    fn selector_id(&self) -> Option<String> {
        self.mode.strip_prefix('$').map(|key| format!("i_{key}"))
    }

    fn label_id(&self) -> String {
        self.textarea_id.replacen("i_", "l_", 1)
    }
}

/// Initialise a code block: dirty notification, focus and mode selection.
///
/// Returns the mode the editor was left in.
pub fn attach_block<D, E>(
    document: &Rc<D>,
    editor: Rc<E>,
    options: &BlockOptions,
    on_change: Option<Rc<dyn Fn()>>,
) -> Option<&'static str>
where
    D: Document + 'static,
    E: CodeEditor + 'static,
{
    if let Some(on_change) = on_change {
        editor.on_change(on_change);
    }
    if options.focus {
        editor.focus();
    }

    let mut mode = editor_mode(&options.mode);
    if let Some(selector_id) = options.selector_id() {
        match document.element_by_id(&selector_id) {
            None if !options.extension.is_empty() => {
                mode = editor_mode(&options.extension);
            }
            None => {}
            Some(selector) => {
                mode = follow_selector(document, editor.clone(), options, selector);
            }
        }
    }

    editor.set_mode(mode);
    log::debug!(
        "Code block #{} uses mode {:?}",
        options.textarea_id,
        mode.unwrap_or("text")
    );
    mode
}

fn follow_selector<D, E>(
    document: &Rc<D>,
    editor: Rc<E>,
    options: &BlockOptions,
    selector: D::Node,
) -> Option<&'static str>
where
    D: Document + 'static,
    E: CodeEditor + 'static,
{
    let label = document.element_by_id(&options.label_id());
    let label_text = label
        .as_ref()
        .map(|label| document.text(label))
        .unwrap_or_default();

    if !options.extension.is_empty() {
        document.set_value(&selector, &options.extension);
    }
    refresh_label(&**document, &selector, label.as_ref(), &label_text);

    let weak: Weak<D> = Rc::downgrade(document);
    let target = selector.clone();
    document.add_event_listener(
        &selector,
        EventKind::Change,
        Rc::new(move |_event: &DomEvent| {
            let Some(document) = weak.upgrade() else {
                return;
            };
            editor.set_mode(editor_mode(&document.value(&target)));
            refresh_label(&*document, &target, label.as_ref(), &label_text);
        }),
    );

    editor_mode(&document.value(&selector))
}

fn refresh_label<D: Document>(
    document: &D,
    selector: &D::Node,
    label: Option<&D::Node>,
    fallback: &str,
) {
    let Some(label) = label else {
        return;
    };
    let text = document
        .selected_option_text(selector)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    document.set_text(label, &text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeEditor {
        modes: RefCell<Vec<Option<String>>>,
        listeners: RefCell<Vec<Rc<dyn Fn()>>>,
        focused: RefCell<bool>,
    }

    impl FakeEditor {
        fn last_mode(&self) -> Option<String> {
            self.modes.borrow().last().cloned().flatten()
        }

        fn type_text(&self) {
            let listeners = self.listeners.borrow().clone();
            for listener in listeners {
                listener();
            }
        }
    }

    impl CodeEditor for FakeEditor {
        fn on_change(&self, listener: Rc<dyn Fn()>) {
            self.listeners.borrow_mut().push(listener);
        }

        fn set_mode(&self, mode: Option<&str>) {
            self.modes.borrow_mut().push(mode.map(str::to_string));
        }

        fn focus(&self) {
            *self.focused.borrow_mut() = true;
        }
    }

    const TYPED_BLOCK: &str = r#"
        <label id="l_content">Content</label>
        <select id="i_file_type">
            <option value="html">HTML</option>
            <option value="md">Markdown</option>
            <option value="txt">Text</option>
        </select>
        <textarea id="i_content"></textarea>"#;

    #[test]
    fn test_fixed_mode() {
        let document = Rc::new(MemoryDocument::new());
        let editor = Rc::new(FakeEditor::default());
        let options = BlockOptions::new("i_content", "md", "", true);
        assert_eq!(attach_block(&document, editor.clone(), &options, None), Some("markdown"));
        assert_eq!(editor.last_mode().as_deref(), Some("markdown"));
        assert!(*editor.focused.borrow());
    }

    #[test]
    fn test_unknown_mode_is_plain_text() {
        let document = Rc::new(MemoryDocument::new());
        let editor = Rc::new(FakeEditor::default());
        let options = BlockOptions::new("i_content", "yaml", "", false);
        assert_eq!(attach_block(&document, editor.clone(), &options, None), None);
        assert_eq!(editor.last_mode(), None);
        assert!(!*editor.focused.borrow());
    }

    #[test]
    fn test_missing_selector_falls_back_to_extension() {
        let document = Rc::new(MemoryDocument::new());
        let editor = Rc::new(FakeEditor::default());
        let options = BlockOptions::new("i_content", "$file_type", "css", false);
        assert_eq!(attach_block(&document, editor, &options, None), Some("css"));
    }

    #[test]
    fn test_selector_follows_extension_and_changes() {
        let document = Rc::new(MemoryDocument::with_body(TYPED_BLOCK));
        let editor = Rc::new(FakeEditor::default());
        let options = BlockOptions::new("i_content", "$file_type", "md", false);
        assert_eq!(
            attach_block(&document, editor.clone(), &options, None),
            Some("markdown")
        );
        let label = document.element_by_id("l_content").unwrap();
        assert_eq!(document.text(&label), "Markdown");

        let selector = document.element_by_id("i_file_type").unwrap();
        document.choose(&selector, "txt");
        assert_eq!(editor.last_mode(), None);
        assert_eq!(document.text(&label), "Text");

        document.choose(&selector, "html");
        assert_eq!(editor.last_mode().as_deref(), Some("htmlmixed"));
        assert_eq!(document.text(&label), "HTML");
    }

    #[test]
    fn test_change_notification_is_forwarded() {
        let document = Rc::new(MemoryDocument::new());
        let editor = Rc::new(FakeEditor::default());
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        let options = BlockOptions::new("i_content", "html", "", false);
        attach_block(
            &document,
            editor.clone(),
            &options,
            Some(Rc::new(move || *counter.borrow_mut() += 1)),
        );
        editor.type_text();
        editor.type_text();
        assert_eq!(*hits.borrow(), 2);
    }
}
