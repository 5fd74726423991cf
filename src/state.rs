//! Session state machine.
//!
//! ```text
//!            batch submitted              batch finished, photos loaded
//!   Start ─────────────────────▶ Loading ─────────────────────────────▶ Editing
//!     ▲                            │  ▲                                  │  │
//!     └─── batch finished, ────────┘  └────── batch submitted ───────────┘  │
//!          nothing loaded                                                   │
//!                                      Saving ◀──── export requested ───────┘
//!                                        └───────── export finished ──────▶ Editing
//! ```
//!
//! There is no terminal state. An empty batch never reaches the machine.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing loaded; only loading is possible.
    #[default]
    Start,
    /// A batch is being ingested.
    Loading,
    /// At least one photo is loaded and selected.
    Editing,
    /// An export is running.
    Saving,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Start => "start",
            SessionState::Loading => "loading",
            SessionState::Editing => "editing",
            SessionState::Saving => "saving",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BatchSubmitted,
    /// `has_photos`: whether the store holds any record after the batch.
    BatchFinished { has_photos: bool },
    ExportRequested,
    ExportFinished,
}

/// User-facing actions gated by the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    SelectPhoto,
    SetOption,
    Export,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Load => "load",
            Action::SelectPhoto => "select photo",
            Action::SetOption => "set option",
            Action::Export => "export",
        };
        f.write_str(name)
    }
}

impl SessionState {
    pub fn allows(self, action: Action) -> bool {
        match self {
            SessionState::Start => action == Action::Load,
            SessionState::Editing => true,
            SessionState::Loading | SessionState::Saving => false,
        }
    }

    /// Target state of `event`, or `None` if `event` is not valid here.
    pub fn next(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Start | Editing, BatchSubmitted) => Some(Loading),
            (Loading, BatchFinished { has_photos: true }) => Some(Editing),
            (Loading, BatchFinished { has_photos: false }) => Some(Start),
            (Editing, ExportRequested) => Some(Saving),
            (Saving, ExportFinished) => Some(Editing),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{event:?} is not valid while {from}")]
pub struct TransitionError {
    pub from: SessionState,
    pub event: SessionEvent,
}

/// Holds the current state and applies events to it.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn allows(&self, action: Action) -> bool {
        self.state.allows(action)
    }

    /// Apply `event`. An invalid event leaves the state unchanged.
    pub fn fire(&mut self, event: SessionEvent) -> Result<SessionState, TransitionError> {
        let from = self.state;
        let to = from.next(event).ok_or(TransitionError { from, event })?;
        info!(%from, %to, ?event, "session state");
        self.state = to;
        Ok(to)
    }
}
