//! Overlay stack: one backdrop plus any number of modal and loader layers.
//!
//! Every overlay element carries the overlay tag. Dismissal removes all of
//! them in one synchronous pass and cancels pending overlay timers, so no
//! frame ever shows a partially torn down stack.
//!
//! Opening a modal while one is open stacks a second modal on the same
//! backdrop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::UiConfig;
use crate::dom::{Document, DomEvent, EventKind};
use crate::error::Result;
use crate::scheduler::{Scheduler, TaskGroup};

pub struct OverlayStack<D: Document + 'static> {
    inner: Rc<OverlayInner<D>>,
}

impl<D: Document + 'static> Clone for OverlayStack<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct OverlayInner<D: Document + 'static> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    config: Rc<UiConfig>,
    tasks: TaskGroup,
    /// Close triggers and backdrops that already carry a dismissal listener
    wired: RefCell<Vec<D::Node>>,
}

impl<D: Document + 'static> OverlayStack<D> {
    pub fn new(document: Rc<D>, scheduler: Rc<dyn Scheduler>, config: Rc<UiConfig>) -> Self {
        Self {
            inner: Rc::new(OverlayInner {
                document,
                scheduler,
                config,
                tasks: TaskGroup::new(),
                wired: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Open a modal holding `content`, optionally with an extra variant class
    pub fn open_modal(&self, content: &str, variant: Option<&str>) -> Result<D::Node> {
        let inner = &self.inner;
        let document = &inner.document;
        let config = &inner.config;
        inner.ensure_backdrop()?;

        let modal = document.create_element("div")?;
        let mut class_name = format!("{} {}", config.modal_class, config.overlay_tag);
        if let Some(variant) = variant.map(str::trim).filter(|v| !v.is_empty()) {
            class_name.push(' ');
            class_name.push_str(variant);
        }
        document.set_class_name(&modal, &class_name);

        let close = document.create_element("a")?;
        document.set_class_name(&close, &format!("modal-close {}", config.close_tag));
        document.set_inner_html(&close, "<span>Close</span>");
        document.set_attribute(&close, "href", "#");

        let content_layer = document.create_element("div")?;
        document.set_class_name(&content_layer, "modal-inner");
        document.set_inner_html(&content_layer, content);

        document.append_child(&modal, &close);
        document.append_child(&modal, &content_layer);
        document.append_child(&document.body(), &modal);

        // Applied a frame later so the CSS transition runs.
        let target = modal.clone();
        let weak_document = Rc::downgrade(document);
        let active_class = config.modal_active_class.clone();
        let handle = inner.scheduler.schedule(
            config.modal_activation_ms,
            Box::new(move || {
                if let Some(document) = weak_document.upgrade() {
                    if document.is_connected(&target) {
                        document.add_class(&target, &active_class);
                    }
                }
            }),
        );
        inner.tasks.push(handle);

        inner.center(&modal);
        OverlayInner::wire_close_triggers(inner);

        log::debug!("Opened modal ({})", class_name);
        Ok(modal)
    }

    /// Show the loading indicator over the backdrop
    pub fn open_loader(&self) -> Result<D::Node> {
        let inner = &self.inner;
        inner.ensure_backdrop()?;
        let loader = inner.document.create_element("div")?;
        inner.document.set_class_name(
            &loader,
            &format!("{} {}", inner.config.loader_class, inner.config.overlay_tag),
        );
        inner
            .document
            .append_child(&inner.document.body(), &loader);
        log::debug!("Opened loader");
        Ok(loader)
    }

    /// `true` shows the loader, `false` dismisses the whole stack
    pub fn loader(&self, status: bool) {
        if status {
            if let Err(e) = self.open_loader() {
                log::warn!("Failed to open loader: {}", e);
            }
        } else {
            self.close_loader();
        }
    }

    pub fn close_loader(&self) -> usize {
        self.dismiss()
    }

    /// Remove every overlay element; returns how many were removed
    pub fn dismiss(&self) -> usize {
        OverlayInner::dismiss(&self.inner)
    }

    pub fn is_open(&self) -> bool {
        !self
            .inner
            .document
            .elements_by_class(&self.inner.config.overlay_tag)
            .is_empty()
    }
}

impl<D: Document + 'static> OverlayInner<D> {
    fn backdrop(&self) -> Option<D::Node> {
        self.document
            .elements_by_class(&self.config.backdrop_class)
            .into_iter()
            .find(|node| self.document.has_class(node, &self.config.overlay_tag))
    }

    /// Reuse the backdrop already on the page (server-rendered or ours) or
    /// create one. Either way it dismisses the stack when clicked.
    fn ensure_backdrop(self: &Rc<Self>) -> Result<D::Node> {
        let backdrop = match self.backdrop() {
            Some(existing) => existing,
            None => {
                let backdrop = self.document.create_element("div")?;
                self.document.set_class_name(
                    &backdrop,
                    &format!("{} {}", self.config.backdrop_class, self.config.overlay_tag),
                );
                self.document.append_child(&self.document.body(), &backdrop);
                backdrop
            }
        };
        let mut wired = self.wired.borrow_mut();
        if !wired.contains(&backdrop) {
            let weak = Rc::downgrade(self);
            self.document.add_event_listener(
                &backdrop,
                EventKind::Click,
                Rc::new(move |_event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        OverlayInner::dismiss(&inner);
                    }
                }),
            );
            wired.push(backdrop.clone());
        }
        Ok(backdrop)
    }

    /// Center vertically, or pin with fixed margins when taller than the viewport
    fn center(&self, modal: &D::Node) {
        let height = (self.document.offset_height(modal) * 100.0).round() / 100.0;
        if height >= self.document.viewport_height() {
            let margin = format!("{}px", self.config.modal_margin_px);
            self.document.set_style(modal, "top", &margin);
            self.document.set_style(modal, "bottom", &margin);
        } else {
            let top = format!("calc(50% - {}px)", height / 2.0);
            self.document.set_style(modal, "top", &top);
        }
    }

    fn wire_close_triggers(this: &Rc<Self>) {
        let triggers = this.document.elements_by_class(&this.config.close_tag);
        let mut wired = this.wired.borrow_mut();
        wired.retain(|node| this.document.is_connected(node));
        for trigger in triggers {
            if wired.contains(&trigger) {
                continue;
            }
            let weak: Weak<Self> = Rc::downgrade(this);
            this.document.add_event_listener(
                &trigger,
                EventKind::Click,
                Rc::new(move |event: &DomEvent| {
                    event.prevent_default();
                    if let Some(inner) = weak.upgrade() {
                        OverlayInner::dismiss(&inner);
                    }
                }),
            );
            wired.push(trigger);
        }
    }

    fn dismiss(this: &Rc<Self>) -> usize {
        this.tasks.cancel_all();
        let removed = this
            .document
            .elements_by_class(&this.config.overlay_tag)
            .iter()
            .filter(|node| this.document.remove(node))
            .count();
        this.wired
            .borrow_mut()
            .retain(|node| this.document.is_connected(node));
        if removed > 0 {
            log::debug!("Dismissed {} overlay elements", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::scheduler::ManualScheduler;

    fn stack() -> (Rc<MemoryDocument>, Rc<ManualScheduler>, OverlayStack<MemoryDocument>) {
        let document = Rc::new(MemoryDocument::new());
        let scheduler = Rc::new(ManualScheduler::new());
        let overlays = OverlayStack::new(
            document.clone(),
            scheduler.clone(),
            Rc::new(UiConfig::default()),
        );
        (document, scheduler, overlays)
    }

    #[test]
    fn test_modal_markup() {
        let (document, _scheduler, overlays) = stack();
        let modal = overlays.open_modal("<p>Delete?</p>", Some("confirm")).unwrap();
        assert_eq!(
            document.class_name(&modal),
            "modal to-close confirm"
        );
        assert_eq!(
            document.outer_html(&modal),
            r##"<div class="modal to-close confirm"><a class="modal-close close-modal-event" href="#"><span>Close</span></a><div class="modal-inner"><p>Delete?</p></div></div>"##
        );
    }

    #[test]
    fn test_blank_variant_is_ignored() {
        let (document, _scheduler, overlays) = stack();
        let modal = overlays.open_modal("x", Some("  ")).unwrap();
        assert_eq!(document.class_name(&modal), "modal to-close");
    }

    #[test]
    fn test_activation_waits_one_frame() {
        let (document, scheduler, overlays) = stack();
        let modal = overlays.open_modal("x", None).unwrap();
        assert!(!document.has_class(&modal, "modal-active"));
        scheduler.advance(9);
        assert!(!document.has_class(&modal, "modal-active"));
        scheduler.advance(1);
        assert!(document.has_class(&modal, "modal-active"));
    }

    #[test]
    fn test_dismiss_cancels_pending_activation() {
        let (_document, scheduler, overlays) = stack();
        overlays.open_modal("x", None).unwrap();
        overlays.dismiss();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_short_modal_is_centered() {
        let (document, _scheduler, overlays) = stack();
        document.set_viewport_height(800.0);
        document.set_class_height("modal", 300.5);
        let modal = overlays.open_modal("x", None).unwrap();
        assert_eq!(
            document.style(&modal, "top").as_deref(),
            Some("calc(50% - 150.25px)")
        );
        assert!(document.style(&modal, "bottom").is_none());
    }

    #[test]
    fn test_tall_modal_is_pinned() {
        let (document, _scheduler, overlays) = stack();
        document.set_viewport_height(600.0);
        document.set_class_height("modal", 600.0);
        let modal = overlays.open_modal("x", None).unwrap();
        assert_eq!(document.style(&modal, "top").as_deref(), Some("20px"));
        assert_eq!(document.style(&modal, "bottom").as_deref(), Some("20px"));
    }

    #[test]
    fn test_loader_shares_backdrop() {
        let (document, _scheduler, overlays) = stack();
        overlays.loader(true);
        overlays.open_loader().unwrap();
        assert_eq!(document.count_class("overlay"), 1);
        assert_eq!(document.count_class("loader"), 2);
        assert!(document.elements_by_class("close-modal-event").is_empty());
        overlays.loader(false);
        assert!(!overlays.is_open());
    }
}
