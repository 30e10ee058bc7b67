use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlTextAreaElement};

use crate::code_block::CodeEditor;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = CodeMirror)]
    pub type CodeMirrorInstance;

    #[wasm_bindgen(js_namespace = CodeMirror, js_name = fromTextArea)]
    fn from_text_area(textarea: &HtmlTextAreaElement, options: &JsValue) -> CodeMirrorInstance;

    #[wasm_bindgen(method)]
    fn on(this: &CodeMirrorInstance, event: &str, callback: &Closure<dyn FnMut()>);

    #[wasm_bindgen(method, js_name = setOption)]
    fn set_option(this: &CodeMirrorInstance, option: &str, value: &JsValue);

    #[wasm_bindgen(method)]
    fn focus(this: &CodeMirrorInstance);
}

/// A CodeMirror 5 instance replacing a textarea
pub struct CodeMirrorEditor {
    instance: CodeMirrorInstance,
    listeners: RefCell<Vec<Closure<dyn FnMut()>>>,
}

impl CodeMirrorEditor {
    pub fn from_textarea(textarea: &HtmlTextAreaElement) -> Self {
        let width = textarea.offset_width();
        let options = js_sys::Object::new();
        for (key, value) in [
            ("lineNumbers", JsValue::TRUE),
            ("lineWrapping", JsValue::TRUE),
            ("indentWithTabs", JsValue::FALSE),
            ("tabSize", JsValue::from_f64(2.0)),
        ] {
            let _ = js_sys::Reflect::set(&options, &JsValue::from_str(key), &value);
        }
        let instance = from_text_area(textarea, &options);

        // The editor wrapper is inserted right after the textarea.
        if let Some(wrapper) = textarea
            .next_element_sibling()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        {
            let _ = wrapper.style().set_property("width", &format!("{width}px"));
        }

        Self {
            instance,
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl CodeEditor for CodeMirrorEditor {
    fn on_change(&self, listener: Rc<dyn Fn()>) {
        let closure = Closure::wrap(Box::new(move || listener()) as Box<dyn FnMut()>);
        self.instance.on("change", &closure);
        self.listeners.borrow_mut().push(closure);
    }

    fn set_mode(&self, mode: Option<&str>) {
        let value = mode.map(JsValue::from_str).unwrap_or(JsValue::NULL);
        self.instance.set_option("mode", &value);
    }

    fn focus(&self) {
        self.instance.focus();
    }
}
