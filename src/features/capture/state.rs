//! Capture session state and its reducer
//!
//! The state is an immutable value; every transition produces a new one
//! through `reduce`. Once a session is dismissed it ignores all further
//! events, so results that arrive late are dropped.

use crate::core::MatchError;
use crate::features::lookup::{DrugEvent, LookupUpdate};
use crate::features::matching::MatchResult;

/// Shown when the OCR call itself failed
pub const TRANSCRIPTION_ERROR_MESSAGE: &str = "Error analyzing image for text.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapturePhase {
    #[default]
    Idle,
    /// Image chosen, analysis not started
    Selected,
    /// Waiting on OCR
    Analyzing,
    /// Lookups in flight
    LookingUp,
    Done,
    Failed,
    Dismissed,
}

impl CapturePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CapturePhase::Done | CapturePhase::Failed | CapturePhase::Dismissed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    ImageSelected(String),
    AnalysisStarted,
    TranscriptionFailed(String),
    MatchFailed(MatchError),
    TextMatched(MatchResult),
    EventsReceived { drug: String, events: Vec<DrugEvent> },
    LookupEmpty { drug: String },
    LookupFailed { drug: String, reason: String },
    LookupsFinished,
    Dismissed,
}

impl From<LookupUpdate> for CaptureEvent {
    fn from(update: LookupUpdate) -> Self {
        match update {
            LookupUpdate::Events { drug, events } => CaptureEvent::EventsReceived { drug, events },
            LookupUpdate::Empty { drug } => CaptureEvent::LookupEmpty { drug },
            LookupUpdate::Failed { drug, reason } => CaptureEvent::LookupFailed { drug, reason },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSessionState {
    pub phase: CapturePhase,
    pub image_uri: Option<String>,
    /// Every matched name, including those past the lookup cap
    pub tags: Vec<String>,
    /// Names sent to drug-event lookup
    pub lookup_targets: Vec<String>,
    /// Accumulated events in arrival order
    pub events: Vec<DrugEvent>,
    /// Names whose lookup returned nothing
    pub empty_lookups: Vec<String>,
    /// (name, reason) for lookups that failed
    pub lookup_failures: Vec<(String, String)>,
    /// User-visible blocking error
    pub error: Option<String>,
}

impl CaptureSessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, CapturePhase::Analyzing | CapturePhase::LookingUp)
    }
}

/// Apply one event, returning the next state
pub fn reduce(state: CaptureSessionState, event: CaptureEvent) -> CaptureSessionState {
    if state.phase == CapturePhase::Dismissed {
        return state;
    }

    match event {
        CaptureEvent::ImageSelected(uri) => CaptureSessionState {
            phase: CapturePhase::Selected,
            image_uri: Some(uri),
            ..CaptureSessionState::default()
        },
        CaptureEvent::AnalysisStarted => CaptureSessionState {
            phase: CapturePhase::Analyzing,
            tags: Vec::new(),
            lookup_targets: Vec::new(),
            events: Vec::new(),
            empty_lookups: Vec::new(),
            lookup_failures: Vec::new(),
            error: None,
            ..state
        },
        CaptureEvent::TranscriptionFailed(_) => CaptureSessionState {
            phase: CapturePhase::Failed,
            error: Some(TRANSCRIPTION_ERROR_MESSAGE.to_string()),
            ..state
        },
        CaptureEvent::MatchFailed(e) => CaptureSessionState {
            phase: CapturePhase::Failed,
            error: Some(e.to_string()),
            ..state
        },
        CaptureEvent::TextMatched(result) => CaptureSessionState {
            phase: if result.is_empty() {
                CapturePhase::Done
            } else {
                CapturePhase::LookingUp
            },
            tags: result.all_tags(),
            lookup_targets: result.matches,
            ..state
        },
        CaptureEvent::EventsReceived { events, .. } => {
            let mut all = state.events;
            all.extend(events);
            CaptureSessionState {
                events: all,
                ..state
            }
        }
        CaptureEvent::LookupEmpty { drug } => {
            let mut empty = state.empty_lookups;
            empty.push(drug);
            CaptureSessionState {
                empty_lookups: empty,
                ..state
            }
        }
        CaptureEvent::LookupFailed { drug, reason } => {
            let mut failures = state.lookup_failures;
            failures.push((drug, reason));
            CaptureSessionState {
                lookup_failures: failures,
                ..state
            }
        }
        CaptureEvent::LookupsFinished => CaptureSessionState {
            phase: CapturePhase::Done,
            ..state
        },
        CaptureEvent::Dismissed => CaptureSessionState {
            phase: CapturePhase::Dismissed,
            ..state
        },
    }
}
