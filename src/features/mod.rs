//! # Features
//!
//! Each feature is self-contained and depends only on `core` and on the
//! features it composes.
//!
//! | Feature   | Purpose                                         |
//! |-----------|-------------------------------------------------|
//! | matching  | OCR text to known medication names              |
//! | ocr       | Image text extraction (OCR.space)               |
//! | lookup    | openFDA drug-event lookups and fan-out          |
//! | capture   | Capture session state and analysis pipeline     |
//! | reminders | Reminder schedules and local notifications      |

pub mod capture;
pub mod lookup;
pub mod matching;
pub mod ocr;
pub mod reminders;

// Capture
pub use capture::{CaptureEvent, CapturePhase, CapturePipeline, CaptureSession, CaptureSessionState};
// Lookup
pub use lookup::{lookup_all, spawn_lookups, DrugEvent, DrugEventLookup, FanOutReport, LookupUpdate, OpenFdaClient};
// Matching
pub use matching::{MatchResult, MedicationTextMatcher, MedicationVocabulary};
// OCR
pub use ocr::{OcrSpaceClient, TextExtractor};
// Reminders
pub use reminders::{
    compute_schedule, LocalNotifier, NotificationSink, ReminderPlan, ReminderScheduler, ReminderSpec,
    ScheduleReport, ScheduledNotification,
};
