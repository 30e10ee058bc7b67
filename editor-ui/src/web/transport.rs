use async_trait::async_trait;
use gloo_net::http::Request;
use web_sys::{FormData, HtmlFormElement};

use crate::error::{Result, UiError};
use crate::transport::{SaveRequest, SaveTransport};

use super::js_error;

/// Posts the edit form with `fetch`
///
/// With a form attached the body is the browser's own `FormData` of that
/// form, so file inputs and every native submission rule apply. Without one
/// the entries of the request are sent.
#[derive(Debug, Default, Clone)]
pub struct FetchTransport {
    form: Option<HtmlFormElement>,
}

impl FetchTransport {
    pub fn for_form(form: HtmlFormElement) -> Self {
        Self { form: Some(form) }
    }

    fn form_data(&self, request: &SaveRequest) -> Result<FormData> {
        if let Some(form) = &self.form {
            return FormData::new_with_form(form).map_err(js_error);
        }
        let body = FormData::new().map_err(js_error)?;
        for (name, value) in request.body.pairs() {
            body.append_with_str(name, value).map_err(js_error)?;
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl SaveTransport for FetchTransport {
    async fn submit(&self, request: SaveRequest) -> Result<String> {
        let response = if request.method == "get" {
            Request::get(&request.url)
                .query(request.body.pairs())
                .send()
                .await
        } else {
            let body = self.form_data(&request)?;
            Request::post(&request.url)
                .body(body)
                .map_err(|e| UiError::Transport(format!("Failed to build request: {e}")))?
                .send()
                .await
        }
        .map_err(|e| UiError::Transport(format!("Request failed: {e}")))?;

        if response.status() != 200 {
            return Err(UiError::HttpStatus(response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| UiError::Transport(format!("Failed to read response: {e}")))
    }
}
