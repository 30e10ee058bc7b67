use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlDocument;

use crate::clipboard::ClipboardBackend;
use crate::error::{Result, UiError};

/// The async Clipboard API
pub struct NavigatorClipboard {
    clipboard: web_sys::Clipboard,
}

#[async_trait(?Send)]
impl ClipboardBackend for NavigatorClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        JsFuture::from(self.clipboard.write_text(text))
            .await
            .map(|_| ())
            .map_err(|e| UiError::Clipboard(format!("{:?}", e)))
    }
}

/// `document.execCommand("copy")` on the current selection, for pages
/// served without a secure context
pub struct LegacyClipboard {
    document: HtmlDocument,
}

#[async_trait(?Send)]
impl ClipboardBackend for LegacyClipboard {
    async fn write_text(&self, _text: &str) -> Result<()> {
        match self.document.exec_command("copy") {
            Ok(true) => Ok(()),
            Ok(false) => Err(UiError::Clipboard("copy command was rejected".into())),
            Err(e) => Err(UiError::Clipboard(format!("{:?}", e))),
        }
    }
}

pub fn platform_clipboard(window: &web_sys::Window) -> Result<Rc<dyn ClipboardBackend>> {
    let navigator = window.navigator();
    let available = js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .map(|value| !value.is_undefined() && !value.is_null())
        .unwrap_or(false);
    if available {
        return Ok(Rc::new(NavigatorClipboard {
            clipboard: navigator.clipboard(),
        }));
    }

    log::debug!("Clipboard API unavailable, using execCommand");
    let document = window
        .document()
        .ok_or_else(|| UiError::MissingElement("document".into()))?
        .dyn_into::<HtmlDocument>()
        .map_err(|_| UiError::Clipboard("document is not an HTML document".into()))?;
    Ok(Rc::new(LegacyClipboard { document }))
}
