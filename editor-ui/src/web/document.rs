use std::cell::RefCell;

use editor_types::{ControlState, FormControl, SelectOption};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlCollection, HtmlElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

use crate::dom::{Document, DomEvent, EventKind, Listener};
use crate::error::{Result, UiError};

use super::js_error;

/// The live browser document
pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
    body: Element,
    // Listeners stay attached until this document is dropped.
    listeners: RefCell<Vec<AttachedListener>>,
}

struct AttachedListener {
    target: Element,
    kind: EventKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl WebDocument {
    pub fn from_window() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| UiError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| UiError::MissingElement("document".into()))?;
        let body: Element = document
            .body()
            .ok_or_else(|| UiError::MissingElement("body".into()))?
            .into();
        Ok(Self {
            window,
            document,
            body,
            listeners: RefCell::new(Vec::new()),
        })
    }

    pub fn window(&self) -> &web_sys::Window {
        &self.window
    }

    pub fn raw(&self) -> &web_sys::Document {
        &self.document
    }

    /// Listeners attached through this document and not yet removed
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

fn collect(collection: HtmlCollection) -> Vec<Element> {
    (0..collection.length())
        .filter_map(|index| collection.item(index))
        .collect()
}

fn select_options(select: &HtmlSelectElement) -> Vec<SelectOption> {
    let options = select.options();
    (0..options.length())
        .filter_map(|index| options.item(index))
        .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
        .map(|option| SelectOption::new(option.value(), option.text(), option.selected()))
        .collect()
}

impl Document for WebDocument {
    type Node = Element;

    fn body(&self) -> Element {
        self.body.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn elements_by_class(&self, class: &str) -> Vec<Element> {
        collect(self.document.get_elements_by_class_name(class))
    }

    fn elements_by_class_within(&self, root: &Element, class: &str) -> Vec<Element> {
        collect(root.get_elements_by_class_name(class))
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_error)
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            log::warn!("append_child failed: {:?}", e);
        }
    }

    fn insert_before(&self, parent: &Element, child: &Element, reference: &Element) {
        let reference: &web_sys::Node = reference;
        if let Err(e) = parent.insert_before(child, Some(reference)) {
            log::warn!("insert_before failed: {:?}", e);
        }
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn remove(&self, node: &Element) -> bool {
        if node.parent_node().is_none() {
            return false;
        }
        node.remove();
        true
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn class_name(&self, node: &Element) -> String {
        node.class_name()
    }

    fn set_class_name(&self, node: &Element, class_name: &str) {
        node.set_class_name(class_name);
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else {
            let _ = node.set_attribute("value", value);
        }
    }

    fn selected_option_text(&self, node: &Element) -> Option<String> {
        let select = node.dyn_ref::<HtmlSelectElement>()?;
        let index = u32::try_from(select.selected_index()).ok()?;
        select
            .options()
            .item(index)
            .and_then(|option| option.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| option.text())
    }

    fn select_text(&self, node: &Element) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.select();
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.select();
        }
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| f64::from(element.offset_height()))
            .unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or(0.0)
    }

    fn form_controls(&self, form: &Element) -> Vec<FormControl> {
        let Ok(nodes) = form.query_selector_all("input,select,textarea") else {
            return Vec::new();
        };
        let mut controls = Vec::new();
        for index in 0..nodes.length() {
            let Some(node) = nodes.item(index) else {
                continue;
            };
            if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
                let value = input.value();
                let state = match input.type_().to_ascii_lowercase().as_str() {
                    "checkbox" => ControlState::Checkbox {
                        value,
                        checked: input.checked(),
                    },
                    "radio" => ControlState::Radio {
                        value,
                        checked: input.checked(),
                    },
                    "file" => ControlState::File { value },
                    _ => ControlState::Text { value },
                };
                controls.push(FormControl {
                    name: input.name(),
                    disabled: input.disabled(),
                    state,
                });
            } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
                controls.push(FormControl {
                    name: select.name(),
                    disabled: select.disabled(),
                    state: ControlState::Select {
                        options: select_options(select),
                        multiple: select.multiple(),
                    },
                });
            } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
                controls.push(FormControl {
                    name: textarea.name(),
                    disabled: textarea.disabled(),
                    state: ControlState::Text {
                        value: textarea.value(),
                    },
                });
            }
        }
        controls
    }

    fn add_event_listener(&self, node: &Element, kind: EventKind, listener: Listener) {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let dom_event = DomEvent::new(kind);
            listener(&dom_event);
            if dom_event.default_prevented() {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        if let Err(e) =
            node.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to add {} listener: {:?}", kind.as_str(), e);
            return;
        }
        self.listeners.borrow_mut().push(AttachedListener {
            target: node.clone(),
            kind,
            closure,
        });
    }
}

impl Drop for WebDocument {
    // A closure freed while still attached throws when the event fires,
    // e.g. after the page comes back from the back/forward cache.
    fn drop(&mut self) {
        for listener in self.listeners.get_mut().drain(..) {
            if let Err(e) = listener.target.remove_event_listener_with_callback(
                listener.kind.as_str(),
                listener.closure.as_ref().unchecked_ref(),
            ) {
                log::warn!("Failed to remove {} listener: {:?}", listener.kind.as_str(), e);
            }
        }
    }
}
