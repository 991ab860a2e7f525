// Core layer - shared types, configuration and errors
pub mod core;

// Features layer - matching, OCR, lookup, capture and reminders
pub mod features;

pub use core::{Config, MatchError, MedScanError};

pub use features::{
    // Capture
    CapturePipeline, CaptureSession, CaptureSessionState,
    // Lookup
    DrugEvent, DrugEventLookup, OpenFdaClient,
    // Matching
    MatchResult, MedicationTextMatcher, MedicationVocabulary,
    // OCR
    OcrSpaceClient, TextExtractor,
    // Reminders
    LocalNotifier, NotificationSink, ReminderPlan, ReminderScheduler, ReminderSpec,
};
