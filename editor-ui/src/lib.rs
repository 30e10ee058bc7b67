//! Browser behavior layer of the admin page editor.
//!
//! - [`coordinator`]: dirty tracking and full-page vs background saves
//! - [`overlay`]: backdrop, modal and loader stack
//! - [`messages`], [`clipboard`], [`code_block`]: smaller page behaviors
//!
//! Components are generic over [`dom::Document`] and take their timers from a
//! [`scheduler::Scheduler`]. The `web` module binds both to the browser.

pub mod clipboard;
pub mod code_block;
pub mod config;
pub mod coordinator;
pub mod dom;
pub mod error;
pub mod form;
pub mod messages;
pub mod overlay;
pub mod scheduler;
pub mod session;
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clipboard::{ClipboardBackend, CopyFields};
pub use code_block::{attach_block, BlockOptions, CodeEditor};
pub use config::UiConfig;
pub use coordinator::SaveCoordinator;
pub use dom::{Document, DomEvent, EventKind, Listener, MemoryDocument};
pub use error::{Result, UiError};
pub use form::{form_data, submit_body};
pub use messages::MessageBoard;
pub use overlay::OverlayStack;
pub use scheduler::{ManualScheduler, Scheduler, TaskGroup, TaskHandle};
pub use session::{EditingSession, SubmitDecision};
pub use transport::{SaveRequest, SaveTransport};
