//! In-memory document used by native tests and tooling.
//!
//! Covers the slice of DOM behavior the components rely on: an element tree
//! with attributes, a forgiving fragment parser for `set_inner_html`, bubbling
//! event dispatch, form control state and a configurable layout height.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use editor_types::{ControlState, FormControl, SelectOption};

use super::{Document, DomEvent, EventKind, Listener};
use crate::error::Result;

const TEXT_TAG: &str = "#text";
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    style: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(EventKind, Listener)>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            style: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }
}

struct Tree {
    nodes: Vec<NodeData>,
    class_heights: Vec<(String, f64)>,
    selection: Option<NodeId>,
}

impl Tree {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn alloc_text(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(TEXT_TAG);
        data.text = text.to_string();
        self.alloc(data)
    }

    fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|child| *child != id);
        self.node_mut(id).parent = None;
        true
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    /// Element descendants of `root` (excluding it) in document order
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(root).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.is_text() {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    fn text_content(&self, id: NodeId) -> String {
        let node = self.node(id);
        if node.is_text() {
            return node.text.clone();
        }
        node.children
            .iter()
            .map(|child| self.text_content(*child))
            .collect()
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|id| self.node(*id).tag == "option")
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        self.node(option)
            .attribute("value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option))
    }

    /// Selected options; a single select with nothing marked selects its first option
    fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        let options = self.options(select);
        let selected: Vec<NodeId> = options
            .iter()
            .copied()
            .filter(|id| self.node(*id).attribute("selected").is_some())
            .collect();
        let multiple = self.node(select).attribute("multiple").is_some();
        if selected.is_empty() && !multiple {
            return options.into_iter().take(1).collect();
        }
        if multiple {
            selected
        } else {
            selected.into_iter().take(1).collect()
        }
    }

    fn outer_html(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.is_text() {
            out.push_str(&node.text);
            return;
        }
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        if VOID_TAGS.contains(&node.tag.as_str()) {
            return;
        }
        for child in &node.children {
            self.outer_html(*child, out);
        }
        out.push_str(&format!("</{}>", node.tag));
    }

    fn parse_fragment(&mut self, container: NodeId, html: &str) {
        let mut open = vec![container];
        let mut rest = html;

        while !rest.is_empty() {
            let current = *open.last().unwrap_or(&container);

            if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').unwrap_or(after.len());
                let tag = after[..end].trim().to_ascii_lowercase();
                if let Some(pos) = open.iter().rposition(|id| self.node(*id).tag == tag) {
                    if pos > 0 {
                        open.truncate(pos);
                    }
                }
                rest = after.get(end + 1..).unwrap_or("");
                continue;
            }

            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
                continue;
            }

            let opens_tag = rest.starts_with('<')
                && rest[1..]
                    .chars()
                    .next()
                    .map(|c| c.is_ascii_alphabetic())
                    .unwrap_or(false);

            if opens_tag {
                if let Some(end) = find_tag_end(rest) {
                    let inner = rest[1..end].trim();
                    let self_closing = inner.ends_with('/');
                    let (tag, attributes) = parse_tag(inner.trim_end_matches('/'));
                    let mut data = NodeData::new(&tag);
                    data.attributes = attributes;
                    let id = self.alloc(data);
                    self.append(current, id);
                    rest = &rest[end + 1..];

                    if RAW_TEXT_TAGS.contains(&tag.as_str()) {
                        let closing = format!("</{tag}");
                        let body_end = rest
                            .to_ascii_lowercase()
                            .find(&closing)
                            .unwrap_or(rest.len());
                        if body_end > 0 {
                            let text = self.alloc_text(&rest[..body_end]);
                            self.append(id, text);
                        }
                        rest = &rest[body_end..];
                        open.push(id);
                    } else if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
                        open.push(id);
                    }
                    continue;
                }
            }

            // Plain text up to the next tag; a stray '<' is kept as text.
            let skip = usize::from(rest.starts_with('<'));
            let end = rest[skip..]
                .find('<')
                .map(|pos| pos + skip)
                .unwrap_or(rest.len());
            let text = &rest[..end];
            if !text.is_empty() {
                let id = self.alloc_text(text);
                self.append(current, id);
            }
            rest = &rest[end..];
        }
    }
}

fn find_tag_end(source: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (index, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(index),
            _ => {}
        }
    }
    None
}

fn parse_tag(inner: &str) -> (String, Vec<(String, String)>) {
    let inner = inner.trim();
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let tag = inner[..name_end].to_ascii_lowercase();
    let mut attributes = Vec::new();
    let mut rest = inner[name_end..].trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let mut value = String::new();
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            match after.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after[1..];
                    let close = body.find(q).unwrap_or(body.len());
                    value = body[..close].to_string();
                    rest = body.get(close + 1..).unwrap_or("");
                }
                _ => {
                    let end = after
                        .find(|c: char| c.is_whitespace())
                        .unwrap_or(after.len());
                    value = after[..end].to_string();
                    rest = &after[end..];
                }
            }
        }
        if !key.is_empty() {
            attributes.push((key, value));
        }
        rest = rest.trim_start();
    }

    (tag, attributes)
}

pub struct MemoryDocument {
    tree: RefCell<Tree>,
    root: NodeId,
    body: NodeId,
    viewport_height: Cell<f64>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            class_heights: Vec::new(),
            selection: None,
        };
        let root = tree.alloc(NodeData::new("html"));
        let body = tree.alloc(NodeData::new("body"));
        tree.append(root, body);
        Self {
            tree: RefCell::new(tree),
            root,
            body,
            viewport_height: Cell::new(768.0),
        }
    }

    /// A document whose `<body>` holds `html`
    pub fn with_body(html: &str) -> Self {
        let document = Self::new();
        document.set_inner_html(&document.body, html);
        document
    }

    pub fn set_viewport_height(&self, height: f64) {
        self.viewport_height.set(height);
    }

    /// Every attached element carrying `class` reports `height` as its offset height
    pub fn set_class_height(&self, class: &str, height: f64) {
        self.tree
            .borrow_mut()
            .class_heights
            .push((class.to_string(), height));
    }

    /// Fire `kind` at `node` and bubble it through the ancestors
    pub fn dispatch(&self, node: &NodeId, kind: EventKind) -> DomEvent {
        let event = DomEvent::new(kind);
        let mut path = Vec::new();
        {
            let tree = self.tree.borrow();
            let mut current = Some(*node);
            while let Some(id) = current {
                path.push(id);
                current = tree.node(id).parent;
            }
        }
        for id in path {
            let listeners: Vec<Listener> = self
                .tree
                .borrow()
                .node(id)
                .listeners
                .iter()
                .filter(|(listens_to, _)| *listens_to == kind)
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in listeners {
                listener(&event);
            }
        }
        event
    }

    pub fn click(&self, node: &NodeId) -> DomEvent {
        self.dispatch(node, EventKind::Click)
    }

    /// Replace the value of a text control the way typing does
    pub fn type_text(&self, node: &NodeId, value: &str) -> DomEvent {
        self.set_value(node, value);
        self.dispatch(node, EventKind::Input)
    }

    /// Pick a value in a select or toggle a choice; fires `input` then `change`
    pub fn choose(&self, node: &NodeId, value: &str) -> DomEvent {
        self.set_value(node, value);
        self.dispatch(node, EventKind::Input);
        self.dispatch(node, EventKind::Change)
    }

    pub fn set_checked(&self, node: &NodeId, checked: bool) {
        let mut tree = self.tree.borrow_mut();
        let data = tree.node_mut(*node);
        if checked {
            data.set_attribute("checked", "");
        } else {
            data.remove_attribute("checked");
        }
    }

    pub fn submit(&self, form: &NodeId) -> DomEvent {
        self.dispatch(form, EventKind::Submit)
    }

    /// Node whose text was last selected for copying
    pub fn selection(&self) -> Option<NodeId> {
        self.tree.borrow().selection
    }

    pub fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.tree.borrow().node(*node).style.get(property).cloned()
    }

    pub fn count_class(&self, class: &str) -> usize {
        self.elements_by_class(class).len()
    }

    pub fn outer_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.tree.borrow().outer_html(*node, &mut out);
        out
    }

    pub fn tag(&self, node: &NodeId) -> String {
        self.tree.borrow().node(*node).tag.clone()
    }

    pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.node(*node)
            .children
            .iter()
            .copied()
            .filter(|id| !tree.node(*id).is_text())
            .collect()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn body(&self) -> NodeId {
        self.body
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(self.root)
            .into_iter()
            .find(|node| tree.node(*node).attribute("id") == Some(id))
    }

    fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.elements_by_class_within(&self.root, class)
    }

    fn elements_by_class_within(&self, root: &NodeId, class: &str) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        tree.descendants(*root)
            .into_iter()
            .filter(|node| tree.node(*node).has_class(class))
            .collect()
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        Ok(self.tree.borrow_mut().alloc(NodeData::new(tag)))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.tree.borrow_mut().append(*parent, *child);
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        let mut tree = self.tree.borrow_mut();
        tree.detach(*child);
        let siblings = &tree.node(*parent).children;
        let position = siblings
            .iter()
            .position(|id| id == reference)
            .unwrap_or(siblings.len());
        tree.node_mut(*parent).children.insert(position, *child);
        tree.node_mut(*child).parent = Some(*parent);
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.borrow().node(*node).parent
    }

    fn remove(&self, node: &NodeId) -> bool {
        self.tree.borrow_mut().detach(*node)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let tree = self.tree.borrow();
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = tree.node(id).parent;
        }
        false
    }

    fn class_name(&self, node: &NodeId) -> String {
        self.attribute(node, "class").unwrap_or_default()
    }

    fn set_class_name(&self, node: &NodeId, class_name: &str) {
        self.set_attribute(node, "class", class_name);
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let current = self.class_name(node);
        let next = format!("{current} {class}");
        self.set_class_name(node, next.trim());
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.tree.borrow().node(*node).has_class(class)
    }

    fn text(&self, node: &NodeId) -> String {
        self.tree.borrow().text_content(*node)
    }

    fn set_text(&self, node: &NodeId, text: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.clear_children(*node);
        if !text.is_empty() {
            let id = tree.alloc_text(text);
            tree.append(*node, id);
        }
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let mut tree = self.tree.borrow_mut();
        tree.clear_children(*node);
        tree.parse_fragment(*node, html);
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.tree
            .borrow()
            .node(*node)
            .attribute(name)
            .map(str::to_string)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.tree.borrow_mut().node_mut(*node).set_attribute(name, value);
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.tree
            .borrow_mut()
            .node_mut(*node)
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn value(&self, node: &NodeId) -> String {
        let tree = self.tree.borrow();
        let data = tree.node(*node);
        match data.tag.as_str() {
            "select" => tree
                .selected_options(*node)
                .first()
                .map(|option| tree.option_value(*option))
                .unwrap_or_default(),
            "textarea" => data
                .attribute("value")
                .map(str::to_string)
                .unwrap_or_else(|| tree.text_content(*node)),
            _ => data.attribute("value").unwrap_or_default().to_string(),
        }
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        let mut tree = self.tree.borrow_mut();
        if tree.node(*node).tag != "select" {
            tree.node_mut(*node).set_attribute("value", value);
            return;
        }
        for option in tree.options(*node) {
            let matches = tree.option_value(option) == value;
            let data = tree.node_mut(option);
            if matches {
                data.set_attribute("selected", "");
            } else {
                data.remove_attribute("selected");
            }
        }
    }

    fn selected_option_text(&self, node: &NodeId) -> Option<String> {
        let tree = self.tree.borrow();
        tree.selected_options(*node)
            .first()
            .map(|option| tree.text_content(*option))
    }

    fn select_text(&self, node: &NodeId) {
        self.tree.borrow_mut().selection = Some(*node);
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        if !self.is_connected(node) {
            return 0.0;
        }
        let tree = self.tree.borrow();
        let data = tree.node(*node);
        tree.class_heights
            .iter()
            .find(|(class, _)| data.has_class(class))
            .map(|(_, height)| *height)
            .unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height.get()
    }

    fn form_controls(&self, form: &NodeId) -> Vec<FormControl> {
        let tree = self.tree.borrow();
        let mut controls = Vec::new();
        for id in tree.descendants(*form) {
            let data = tree.node(id);
            let state = match data.tag.as_str() {
                "input" => {
                    let kind = data
                        .attribute("type")
                        .unwrap_or("text")
                        .to_ascii_lowercase();
                    let value = data.attribute("value").unwrap_or("on").to_string();
                    let checked = data.attribute("checked").is_some();
                    match kind.as_str() {
                        "checkbox" => ControlState::Checkbox { value, checked },
                        "radio" => ControlState::Radio { value, checked },
                        "file" => ControlState::File {
                            value: data.attribute("value").unwrap_or_default().to_string(),
                        },
                        _ => ControlState::Text {
                            value: data.attribute("value").unwrap_or_default().to_string(),
                        },
                    }
                }
                "textarea" => ControlState::Text {
                    value: data
                        .attribute("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| tree.text_content(id)),
                },
                "select" => {
                    let selected = tree.selected_options(id);
                    let options = tree
                        .options(id)
                        .into_iter()
                        .map(|option| {
                            SelectOption::new(
                                tree.option_value(option),
                                tree.text_content(option),
                                selected.contains(&option),
                            )
                        })
                        .collect();
                    ControlState::Select {
                        options,
                        multiple: data.attribute("multiple").is_some(),
                    }
                }
                _ => continue,
            };
            controls.push(FormControl {
                name: data.attribute("name").unwrap_or_default().to_string(),
                disabled: data.attribute("disabled").is_some(),
                state,
            });
        }
        controls
    }

    fn add_event_listener(&self, node: &NodeId, kind: EventKind, listener: Listener) {
        self.tree
            .borrow_mut()
            .node_mut(*node)
            .listeners
            .push((kind, listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_parse_nested_fragment() {
        let doc = MemoryDocument::with_body(
            r#"<div id="messages"><div class="system-message success">Saved<br>ok</div><script>editor.messages();</script></div>"#,
        );
        let region = doc.element_by_id("messages").unwrap();
        let messages = doc.elements_by_class("system-message");
        assert_eq!(messages.len(), 1);
        assert_eq!(doc.text(&messages[0]), "Savedok");
        assert_eq!(doc.parent(&messages[0]), Some(region));
        assert_eq!(doc.children(&region).len(), 2);
    }

    #[test]
    fn test_unquoted_and_flag_attributes() {
        let doc = MemoryDocument::with_body(r#"<select id=s name='tags' multiple><option value=a selected>A</option><option>B</option></select>"#);
        let select = doc.element_by_id("s").unwrap();
        assert_eq!(doc.attribute(&select, "name").as_deref(), Some("tags"));
        assert_eq!(doc.attribute(&select, "multiple").as_deref(), Some(""));
        assert_eq!(doc.value(&select), "a");
    }

    #[test]
    fn test_single_select_defaults_to_first_option() {
        let doc = MemoryDocument::with_body(
            r#"<select id="t"><option value="html">HTML</option><option value="md">Markdown</option></select>"#,
        );
        let select = doc.element_by_id("t").unwrap();
        assert_eq!(doc.value(&select), "html");
        doc.set_value(&select, "md");
        assert_eq!(doc.value(&select), "md");
        assert_eq!(doc.selected_option_text(&select).as_deref(), Some("Markdown"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let doc = MemoryDocument::with_body(r#"<p id="p">x</p>"#);
        let p = doc.element_by_id("p").unwrap();
        assert!(doc.remove(&p));
        assert!(!doc.remove(&p));
        assert!(!doc.is_connected(&p));
        assert!(doc.element_by_id("p").is_none());
    }

    #[test]
    fn test_events_bubble_to_ancestors() {
        let doc = MemoryDocument::with_body(r#"<form id="f"><input id="i" name="title"></form>"#);
        let form = doc.element_by_id("f").unwrap();
        let input = doc.element_by_id("i").unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        doc.add_event_listener(
            &form,
            EventKind::Input,
            Rc::new(move |event: &DomEvent| {
                counter.set(counter.get() + 1);
                event.prevent_default();
            }),
        );
        let event = doc.type_text(&input, "Home");
        assert_eq!(seen.get(), 1);
        assert!(event.default_prevented());
        assert_eq!(doc.value(&input), "Home");
    }

    #[test]
    fn test_insert_before_reference() {
        let doc = MemoryDocument::with_body(r#"<div id="box"><input id="field"></div>"#);
        let parent = doc.element_by_id("box").unwrap();
        let field = doc.element_by_id("field").unwrap();
        let marker = doc.create_element("span").unwrap();
        doc.insert_before(&parent, &marker, &field);
        assert_eq!(doc.children(&parent), vec![marker, field]);
    }
}
