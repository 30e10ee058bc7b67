//! Transient system messages and their removal timers.

use std::rc::Rc;

use crate::config::UiConfig;
use crate::dom::Document;
use crate::scheduler::{Scheduler, TaskGroup};

pub struct MessageBoard<D: Document + 'static> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    config: Rc<UiConfig>,
    tasks: TaskGroup,
}

impl<D: Document + 'static> MessageBoard<D> {
    pub fn new(document: Rc<D>, scheduler: Rc<dyn Scheduler>, config: Rc<UiConfig>) -> Self {
        Self {
            document,
            scheduler,
            config,
            tasks: TaskGroup::new(),
        }
    }

    /// Schedule every displayed message for removal, one every stagger
    /// interval: message `i` goes after `delay + i * stagger`.
    pub fn schedule_batch(&self) -> usize {
        let messages = self.document.elements_by_class(&self.config.message_class);
        for (index, message) in messages.iter().enumerate() {
            self.remove_later(message.clone(), self.config.message_removal_delay(index));
        }
        log::debug!("Scheduled {} system messages for staggered removal", messages.len());
        messages.len()
    }

    /// Replace the message region with a server fragment and remove the new
    /// messages together after the saved-message delay.
    ///
    /// Returns `false` when the page has no message region.
    pub fn replace_region(&self, html: &str) -> bool {
        let Some(region) = self.document.element_by_id(&self.config.message_region_id) else {
            log::debug!(
                "No message region #{}; dropping server fragment",
                self.config.message_region_id
            );
            return false;
        };
        self.document.set_inner_html(&region, html);
        self.schedule_region(&region);
        true
    }

    /// Render a single error message into the message region
    pub fn push_error(&self, text: &str) -> bool {
        let Some(region) = self.document.element_by_id(&self.config.message_region_id) else {
            return false;
        };
        let message = match self.document.create_element("div") {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Failed to render error message: {}", e);
                return false;
            }
        };
        self.document
            .set_class_name(&message, &format!("{} error", self.config.message_class));
        self.document.set_text(&message, text);
        self.document.append_child(&region, &message);
        self.remove_later(message, self.config.saved_message_delay_ms);
        true
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn cancel_all(&self) {
        self.tasks.cancel_all();
    }

    fn schedule_region(&self, region: &D::Node) {
        let messages = self
            .document
            .elements_by_class_within(region, &self.config.message_class);
        for message in messages {
            self.remove_later(message, self.config.saved_message_delay_ms);
        }
    }

    fn remove_later(&self, message: D::Node, delay_ms: u32) {
        let document = self.document.clone();
        let handle = self.scheduler.schedule(
            delay_ms,
            Box::new(move || {
                if !document.remove(&message) {
                    log::debug!("System message already removed");
                }
            }),
        );
        self.tasks.push(handle);
    }
}
