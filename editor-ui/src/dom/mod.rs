//! The document seam every component drives.
//!
//! Components receive an `Rc<D: Document>` at construction and never reach
//! for globals. The browser implementation lives in `crate::web`, the
//! in-memory one in [`memory`].

pub mod memory;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use editor_types::FormControl;

use crate::error::Result;

pub use memory::{MemoryDocument, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Change,
    Submit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
        }
    }
}

/// Event handed to listeners; bubbles from the target to its ancestors
#[derive(Debug)]
pub struct DomEvent {
    kind: EventKind,
    default_prevented: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            default_prevented: Cell::new(false),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type Listener = Rc<dyn Fn(&DomEvent)>;

pub trait Document {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn body(&self) -> Self::Node;
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// Attached elements carrying `class`, in document order
    fn elements_by_class(&self, class: &str) -> Vec<Self::Node>;
    fn elements_by_class_within(&self, root: &Self::Node, class: &str) -> Vec<Self::Node>;

    /// Fails only when the host refuses to create the element
    fn create_element(&self, tag: &str) -> Result<Self::Node>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Detach `node`; returns `false` when it was already detached
    fn remove(&self, node: &Self::Node) -> bool;
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn class_name(&self, node: &Self::Node) -> String;
    fn set_class_name(&self, node: &Self::Node, class_name: &str);
    fn add_class(&self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);
    fn set_inner_html(&self, node: &Self::Node, html: &str);
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Current value of an input, textarea or select
    fn value(&self, node: &Self::Node) -> String;
    fn set_value(&self, node: &Self::Node, value: &str);
    /// Label of the selected option of a select
    fn selected_option_text(&self, node: &Self::Node) -> Option<String>;
    /// Select the text of an input so a legacy copy command picks it up
    fn select_text(&self, node: &Self::Node);

    fn offset_height(&self, node: &Self::Node) -> f64;
    fn viewport_height(&self) -> f64;

    /// Named and unnamed `input`, `select` and `textarea` controls of a form,
    /// in document order
    fn form_controls(&self, form: &Self::Node) -> Vec<FormControl>;

    fn add_event_listener(&self, node: &Self::Node, kind: EventKind, listener: Listener);
}
