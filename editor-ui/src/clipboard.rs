//! Click-to-copy fields with a transient confirmation next to them.

use std::rc::{Rc, Weak};

use async_trait::async_trait;
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::UiConfig;
use crate::dom::{Document, DomEvent, EventKind};
use crate::error::Result;
use crate::scheduler::{Scheduler, TaskGroup};

/// Writes text to the system clipboard
#[async_trait(?Send)]
pub trait ClipboardBackend {
    async fn write_text(&self, text: &str) -> Result<()>;
}

pub struct CopyFields<D: Document + 'static> {
    inner: Rc<CopyInner<D>>,
}

struct CopyInner<D: Document + 'static> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    spawner: Rc<dyn LocalSpawn>,
    clipboard: Rc<dyn ClipboardBackend>,
    config: Rc<UiConfig>,
    tasks: TaskGroup,
}

impl<D: Document + 'static> CopyFields<D> {
    /// Wire every copyable element currently in the document
    pub fn attach(
        document: Rc<D>,
        scheduler: Rc<dyn Scheduler>,
        spawner: Rc<dyn LocalSpawn>,
        clipboard: Rc<dyn ClipboardBackend>,
        config: Rc<UiConfig>,
    ) -> Self {
        let inner = Rc::new(CopyInner {
            document,
            scheduler,
            spawner,
            clipboard,
            config,
            tasks: TaskGroup::new(),
        });

        let fields = inner.document.elements_by_class(&inner.config.copy_class);
        for field in &fields {
            let weak = Rc::downgrade(&inner);
            let target = field.clone();
            inner.document.add_event_listener(
                field,
                EventKind::Click,
                Rc::new(move |_event: &DomEvent| {
                    if let Some(inner) = weak.upgrade() {
                        CopyInner::copy(&inner, &target);
                    }
                }),
            );
        }
        log::debug!("Wired {} copyable fields", fields.len());

        Self { inner }
    }

    /// Pending indicator removals
    pub fn pending(&self) -> usize {
        self.inner.tasks.len()
    }
}

impl<D: Document + 'static> CopyInner<D> {
    fn copy(this: &Rc<Self>, field: &D::Node) {
        this.document.select_text(field);
        let text = this.document.value(field);
        let weak: Weak<Self> = Rc::downgrade(this);
        let clipboard = this.clipboard.clone();
        let field = field.clone();

        let spawned = this.spawner.spawn_local(async move {
            let result = clipboard.write_text(&text).await;
            if let Some(inner) = weak.upgrade() {
                inner.show_indicator(&field, result);
            }
        });
        if let Err(e) = spawned {
            log::warn!("Failed to spawn clipboard copy: {}", e);
        }
    }

    fn show_indicator(&self, field: &D::Node, result: Result<()>) {
        let Some(parent) = self.document.parent(field) else {
            log::debug!("Copied field is no longer attached");
            return;
        };
        let (class_name, text) = match result {
            Ok(()) => (
                self.config.copied_class.clone(),
                self.config.copied_notice.as_str(),
            ),
            Err(e) => {
                log::warn!("Clipboard copy failed: {}", e);
                (
                    format!("{} copy-failed", self.config.copied_class),
                    self.config.copy_failed_notice.as_str(),
                )
            }
        };

        let indicator = match self.document.create_element("div") {
            Ok(indicator) => indicator,
            Err(e) => {
                log::warn!("Failed to show copy indicator: {}", e);
                return;
            }
        };
        self.document.set_class_name(&indicator, &class_name);
        self.document.set_text(&indicator, text);
        self.document.insert_before(&parent, &indicator, field);

        let document = self.document.clone();
        let handle = self.scheduler.schedule(
            self.config.copied_indicator_ms,
            Box::new(move || {
                document.remove(&indicator);
            }),
        );
        self.tasks.push(handle);
    }
}
