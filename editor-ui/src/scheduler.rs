//! Cancellable timers.
//!
//! Every delayed DOM mutation goes through a [`Scheduler`]. The returned
//! [`TaskHandle`] cancels the task when dropped, so a component that keeps its
//! handles in a [`TaskGroup`] takes its pending timers down with it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle;
}

/// Cancels its task on drop unless detached
#[must_use = "dropping a TaskHandle cancels the task"]
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Let the task run even after the handle is gone
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Timers owned by one component
#[derive(Debug, Default)]
pub struct TaskGroup {
    handles: RefCell<Vec<TaskHandle>>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, handle: TaskHandle) {
        self.handles.borrow_mut().push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.borrow().is_empty()
    }

    pub fn cancel_all(&self) {
        let handles = std::mem::take(&mut *self.handles.borrow_mut());
        drop(handles);
    }
}

type Queue = RefCell<BTreeMap<(u64, u64), Task>>;

/// Virtual clock scheduler; time only moves when [`ManualScheduler::advance`] is called
#[derive(Default)]
pub struct ManualScheduler {
    queue: Rc<Queue>,
    now: Cell<u64>,
    next_seq: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every task due up to `now + ms`, in due order, including tasks
    /// scheduled by the tasks themselves.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get().saturating_add(ms);
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.keys().next().copied() {
                    Some(key) if key.0 <= target => queue.remove(&key).map(|task| (key.0, task)),
                    _ => None,
                }
            };
            let Some((due, task)) = next else {
                break;
            };
            self.now.set(due);
            task();
        }
        self.now.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let key = (self.now.get() + u64::from(delay_ms), seq);
        self.queue.borrow_mut().insert(key, task);

        let queue: Weak<Queue> = Rc::downgrade(&self.queue);
        TaskHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.borrow_mut().remove(&key);
            }
        })
    }
}
