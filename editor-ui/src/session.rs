//! Editing session state: the dirty latch and the save-transport decision.
//!
//! Pure state, no DOM. The coordinator owns one session per edit form and
//! feeds it every recognized event.

use editor_types::{DirtyState, TransportMode};

/// What a submit should turn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDecision {
    /// Let the browser submit the form and load the next page
    Navigate,
    /// Cancel navigation and send the form in the background
    Background,
    /// Cancel navigation and send nothing; a background save is already running
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingSession {
    state: DirtyState,
    is_new_resource: bool,
    reload_required: bool,
    save_in_flight: bool,
}

impl EditingSession {
    pub fn new(is_new_resource: bool) -> Self {
        Self {
            state: DirtyState::Clean,
            is_new_resource,
            reload_required: false,
            save_in_flight: false,
        }
    }

    pub fn state(&self) -> DirtyState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DirtyState::Dirty
    }

    pub fn is_new_resource(&self) -> bool {
        self.is_new_resource
    }

    pub fn save_in_flight(&self) -> bool {
        self.save_in_flight
    }

    /// Transport the next submit will use
    pub fn transport_mode(&self) -> TransportMode {
        if self.is_new_resource || self.reload_required {
            TransportMode::Navigational
        } else {
            TransportMode::Background
        }
    }

    /// Record an edit. Returns `true` only on the `Clean -> Dirty` transition.
    pub fn record_mutation(&mut self) -> bool {
        if self.is_dirty() {
            return false;
        }
        self.state = DirtyState::Dirty;
        true
    }

    /// A reload-required field changed; every later save navigates
    pub fn record_reload_required(&mut self) {
        self.reload_required = true;
    }

    pub fn begin_submit(&mut self) -> SubmitDecision {
        match self.transport_mode() {
            TransportMode::Navigational => SubmitDecision::Navigate,
            TransportMode::Background if self.save_in_flight => SubmitDecision::Suppressed,
            TransportMode::Background => {
                self.save_in_flight = true;
                SubmitDecision::Background
            }
        }
    }

    /// The server acknowledged a background save
    pub fn acknowledge_save(&mut self) {
        self.save_in_flight = false;
        self.state = DirtyState::Clean;
    }

    /// The background save failed; edits remain unsaved
    pub fn fail_save(&mut self) {
        self.save_in_flight = false;
    }
}
