//! Browser timers and the local executor.

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use gloo_timers::callback::Timeout;

use crate::scheduler::{Scheduler, Task, TaskHandle};

/// `setTimeout` backed scheduler
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TaskHandle {
        let timeout = Timeout::new(delay_ms, task);
        // Dropping the timeout clears it.
        TaskHandle::new(move || drop(timeout))
    }
}

/// Runs futures on the page's microtask queue
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}
