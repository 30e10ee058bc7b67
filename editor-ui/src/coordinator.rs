//! Dirty tracking and save strategy for the edit form.
//!
//! The coordinator owns the [`EditingSession`] of one form. Form `input`
//! events and code editor changes latch it dirty; submits either pass through
//! as a full page save or turn into a background save that only refreshes
//! the message region.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::UiConfig;
use crate::dom::{Document, DomEvent, EventKind};
use crate::error::Result;
use crate::form::submit_body;
use crate::messages::MessageBoard;
use crate::scheduler::Scheduler;
use crate::session::{EditingSession, SubmitDecision};
use crate::transport::{SaveRequest, SaveTransport};

pub struct SaveCoordinator<D: Document + 'static> {
    inner: Rc<CoordinatorInner<D>>,
}

struct CoordinatorInner<D: Document + 'static> {
    document: Rc<D>,
    form: D::Node,
    session: RefCell<EditingSession>,
    transport: Rc<dyn SaveTransport>,
    spawner: Rc<dyn LocalSpawn>,
    messages: MessageBoard<D>,
    config: Rc<UiConfig>,
}

impl<D: Document + 'static> SaveCoordinator<D> {
    /// Attach to the configured edit form.
    ///
    /// Returns `None` when the page has no edit form.
    pub fn attach(
        document: Rc<D>,
        scheduler: Rc<dyn Scheduler>,
        transport: Rc<dyn SaveTransport>,
        spawner: Rc<dyn LocalSpawn>,
        config: Rc<UiConfig>,
    ) -> Option<Self> {
        let Some(form) = document.element_by_id(&config.form_id) else {
            log::debug!("No #{} form on this page", config.form_id);
            return None;
        };
        let is_new_resource = document
            .attribute(&form, &config.new_resource_attribute)
            .map(|value| value.trim() != "0")
            .unwrap_or(true);

        let inner = Rc::new(CoordinatorInner {
            messages: MessageBoard::new(document.clone(), scheduler, config.clone()),
            document,
            form,
            session: RefCell::new(EditingSession::new(is_new_resource)),
            transport,
            spawner,
            config,
        });

        let weak = Rc::downgrade(&inner);
        inner.document.add_event_listener(
            &inner.form,
            EventKind::Input,
            Rc::new(move |_event: &DomEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.mark_dirty();
                }
            }),
        );

        if !is_new_resource {
            CoordinatorInner::watch_reload_fields(&inner);
            let weak = Rc::downgrade(&inner);
            inner.document.add_event_listener(
                &inner.form,
                EventKind::Submit,
                Rc::new(move |event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        CoordinatorInner::on_submit(&inner, event);
                    }
                }),
            );
        }

        log::info!(
            "Editing session started (new resource: {})",
            is_new_resource
        );
        Some(Self { inner })
    }

    /// Latch the session dirty; used for sub-editor change notifications
    pub fn mark_dirty(&self) {
        self.inner.mark_dirty();
    }

    /// A change callback for embedded editors that does not keep the
    /// coordinator alive
    pub fn dirty_listener(&self) -> Rc<dyn Fn()> {
        let weak: Weak<CoordinatorInner<D>> = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.mark_dirty();
            }
        })
    }

    pub fn session(&self) -> EditingSession {
        self.inner.session.borrow().clone()
    }

    pub fn form(&self) -> &D::Node {
        &self.inner.form
    }

    pub fn messages(&self) -> &MessageBoard<D> {
        &self.inner.messages
    }
}

impl<D: Document + 'static> CoordinatorInner<D> {
    fn mark_dirty(&self) {
        if !self.session.borrow_mut().record_mutation() {
            return;
        }
        log::debug!("Editing session is dirty");
        match self.document.element_by_id(&self.config.warning_id) {
            Some(warning) => self.document.set_text(&warning, &self.config.unsaved_notice),
            None => log::debug!("No #{} region for the unsaved notice", self.config.warning_id),
        }
    }

    fn watch_reload_fields(this: &Rc<Self>) {
        let fields = this
            .document
            .elements_by_class_within(&this.form, &this.config.reload_class);
        for field in &fields {
            let weak = Rc::downgrade(this);
            this.document.add_event_listener(
                field,
                EventKind::Change,
                Rc::new(move |_event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        inner.session.borrow_mut().record_reload_required();
                        log::debug!("Reload-required field changed; next save reloads the page");
                    }
                }),
            );
        }
    }

    fn on_submit(this: &Rc<Self>, event: &DomEvent) {
        let decision = this.session.borrow_mut().begin_submit();
        match decision {
            SubmitDecision::Navigate => {
                log::info!("Saving with a full page submit");
            }
            SubmitDecision::Suppressed => {
                event.prevent_default();
                log::warn!("Background save already in flight; ignoring submit");
            }
            SubmitDecision::Background => {
                event.prevent_default();
                let request = this.build_request();
                log::info!("Saving in the background to {}", request.url);
                let weak = Rc::downgrade(this);
                let transport = this.transport.clone();
                let spawned = this.spawner.spawn_local(async move {
                    let result = transport.submit(request).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.complete_save(result);
                    }
                });
                if let Err(e) = spawned {
                    log::warn!("Failed to spawn background save: {}", e);
                    this.session.borrow_mut().fail_save();
                }
            }
        }
    }

    fn build_request(&self) -> SaveRequest {
        let action = self
            .document
            .attribute(&self.form, "action")
            .unwrap_or_default();
        let method = self.document.attribute(&self.form, "method");
        SaveRequest::new(
            &action,
            method.as_deref(),
            submit_body(&*self.document, &self.form),
        )
    }

    fn complete_save(&self, result: Result<String>) {
        match result {
            Ok(fragment) => {
                self.session.borrow_mut().acknowledge_save();
                if let Some(warning) = self.document.element_by_id(&self.config.warning_id) {
                    self.document.set_text(&warning, "");
                }
                self.messages.replace_region(&fragment);
                log::info!("Background save acknowledged");
            }
            Err(e) => {
                self.session.borrow_mut().fail_save();
                log::warn!("Background save failed: {}", e);
                self.messages.push_error(&self.config.save_failed_notice);
            }
        }
    }
}
