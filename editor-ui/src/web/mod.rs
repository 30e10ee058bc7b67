//! Browser bindings and the functions exported to page scripts.
//!
//! Server-rendered pages call the exports from inline `<script>` tags. All
//! components for the current page live in one [`PageController`] kept in a
//! thread-local and dropped on `pagehide`, unless the page is kept in the
//! back/forward cache.

mod clipboard;
mod code_mirror;
mod document;
mod runtime;
mod transport;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlFormElement, HtmlTextAreaElement, PageTransitionEvent};

use crate::clipboard::CopyFields;
use crate::code_block::{attach_block, BlockOptions};
use crate::config::UiConfig;
use crate::coordinator::SaveCoordinator;
use crate::dom::Document;
use crate::error::{Result, UiError};
use crate::messages::MessageBoard;
use crate::overlay::OverlayStack;
use crate::scheduler::Scheduler;

pub use clipboard::{platform_clipboard, LegacyClipboard, NavigatorClipboard};
pub use code_mirror::CodeMirrorEditor;
pub use document::WebDocument;
pub use runtime::{BrowserScheduler, BrowserSpawner};
pub use transport::FetchTransport;

/// Body attribute holding JSON overrides for [`UiConfig`]
pub const CONFIG_ATTRIBUTE: &str = "data-editor-config";

impl From<UiError> for JsValue {
    fn from(error: UiError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

pub(crate) fn js_error(value: JsValue) -> UiError {
    UiError::Js(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// Everything attached to the current page
pub struct PageController {
    document: Rc<WebDocument>,
    scheduler: Rc<dyn Scheduler>,
    config: Rc<UiConfig>,
    overlays: OverlayStack<WebDocument>,
    coordinator: Option<SaveCoordinator<WebDocument>>,
    _messages: Option<MessageBoard<WebDocument>>,
    _copy_fields: Option<CopyFields<WebDocument>>,
    _editors: Vec<Rc<CodeMirrorEditor>>,
}

impl PageController {
    pub fn new() -> Result<Self> {
        let document = Rc::new(WebDocument::from_window()?);
        let raw_config = document
            .attribute(&document.body(), CONFIG_ATTRIBUTE)
            .unwrap_or_default();
        let config = Rc::new(UiConfig::from_json(&raw_config)?);
        let scheduler: Rc<dyn Scheduler> = Rc::new(BrowserScheduler);
        let overlays = OverlayStack::new(document.clone(), scheduler.clone(), config.clone());
        Ok(Self {
            document,
            scheduler,
            config,
            overlays,
            coordinator: None,
            _messages: None,
            _copy_fields: None,
            _editors: Vec::new(),
        })
    }

    fn init_edit_page(&mut self) {
        if self.coordinator.is_some() {
            log::debug!("Edit page already initialised");
            return;
        }
        // The browser encodes the form itself so file inputs are sent.
        let transport = self
            .document
            .element_by_id(&self.config.form_id)
            .and_then(|form| form.dyn_into::<HtmlFormElement>().ok())
            .map(FetchTransport::for_form)
            .unwrap_or_default();
        self.coordinator = SaveCoordinator::attach(
            self.document.clone(),
            self.scheduler.clone(),
            Rc::new(transport),
            Rc::new(BrowserSpawner),
            self.config.clone(),
        );
    }

    fn init_messages(&mut self) {
        let board = MessageBoard::new(
            self.document.clone(),
            self.scheduler.clone(),
            self.config.clone(),
        );
        let scheduled = board.schedule_batch();
        log::debug!("Scheduled removal of {} system messages", scheduled);
        self._messages = Some(board);
    }

    fn init_copy(&mut self) -> Result<()> {
        let clipboard = platform_clipboard(self.document.window())?;
        self._copy_fields = Some(CopyFields::attach(
            self.document.clone(),
            self.scheduler.clone(),
            Rc::new(BrowserSpawner),
            clipboard,
            self.config.clone(),
        ));
        Ok(())
    }

    fn init_block(&mut self, options: &BlockOptions) -> Result<()> {
        let textarea = self
            .document
            .element_by_id(&options.textarea_id)
            .and_then(|element| element.dyn_into::<HtmlTextAreaElement>().ok())
            .ok_or_else(|| UiError::MissingElement(format!("textarea#{}", options.textarea_id)))?;
        let editor = Rc::new(CodeMirrorEditor::from_textarea(&textarea));
        // Blocks may be initialised before the edit form, so resolve the
        // coordinator when the change happens.
        let on_change: Rc<dyn Fn()> = Rc::new(|| {
            if let Err(e) = with_page(|page| page.mark_dirty()) {
                log::warn!("Code block change not recorded: {}", e);
            }
        });
        attach_block(&self.document, editor.clone(), options, Some(on_change));
        self._editors.push(editor);
        Ok(())
    }

    fn mark_dirty(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.mark_dirty();
        }
    }
}

thread_local! {
    static PAGE: RefCell<Option<PageController>> = const { RefCell::new(None) };
    static UNLOAD_WATCHED: Cell<bool> = const { Cell::new(false) };
}

fn with_page<R>(f: impl FnOnce(&mut PageController) -> R) -> Result<R> {
    PAGE.with(|page| {
        let mut page = page
            .try_borrow_mut()
            .map_err(|_| UiError::Js("page controller is busy".into()))?;
        if page.is_none() {
            *page = Some(PageController::new()?);
            watch_unload();
        }
        match page.as_mut() {
            Some(controller) => Ok(f(controller)),
            None => Err(UiError::Js("page controller unavailable".into())),
        }
    })
}

/// Register the `pagehide` teardown once per window
fn watch_unload() {
    if UNLOAD_WATCHED.with(|watched| watched.replace(true)) {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };
    let on_pagehide = Closure::wrap(Box::new(move |event: web_sys::Event| {
        // A page entering the back/forward cache keeps its listeners alive.
        let persisted = event
            .dyn_ref::<PageTransitionEvent>()
            .map(PageTransitionEvent::persisted)
            .unwrap_or(false);
        if persisted {
            log::debug!("Page kept in the back/forward cache");
            return;
        }
        let dropped = PAGE.with(|page| page.try_borrow_mut().ok().and_then(|mut page| page.take()));
        drop(dropped);
        log::debug!("Page controller dropped");
    }) as Box<dyn FnMut(web_sys::Event)>);
    if let Err(e) =
        window.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref())
    {
        log::warn!("Failed to watch pagehide: {:?}", e);
        UNLOAD_WATCHED.with(|watched| watched.set(false));
        return;
    }
    on_pagehide.forget();
}

#[wasm_bindgen(start)]
pub fn init_logging() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Editor UI loaded");
}

#[wasm_bindgen]
pub fn init_edit_page() -> std::result::Result<(), JsValue> {
    with_page(|page| page.init_edit_page())?;
    Ok(())
}

#[wasm_bindgen]
pub fn init_messages() -> std::result::Result<(), JsValue> {
    with_page(|page| page.init_messages())?;
    Ok(())
}

#[wasm_bindgen]
pub fn init_copy() -> std::result::Result<(), JsValue> {
    with_page(|page| page.init_copy())??;
    Ok(())
}

#[wasm_bindgen]
pub fn init_block(
    element_id: &str,
    mode: &str,
    extension: &str,
    focus: bool,
) -> std::result::Result<(), JsValue> {
    let options = BlockOptions::new(element_id, mode, extension, focus);
    with_page(|page| page.init_block(&options))??;
    Ok(())
}

#[wasm_bindgen]
pub fn open_modal(content: &str, class_name: Option<String>) -> std::result::Result<(), JsValue> {
    with_page(|page| page.overlays.open_modal(content, class_name.as_deref()))??;
    Ok(())
}

#[wasm_bindgen]
pub fn open_loader(status: bool) -> std::result::Result<(), JsValue> {
    with_page(|page| page.overlays.loader(status))?;
    Ok(())
}

#[wasm_bindgen]
pub fn close_overlays() -> std::result::Result<(), JsValue> {
    with_page(|page| {
        page.overlays.dismiss();
    })?;
    Ok(())
}
