//! # Capture Feature
//!
//! Label capture sessions: an immutable session state folded by a pure
//! reducer, and the pipeline that feeds it OCR, matching and lookup events.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Dismissal support
//! - 1.0.0: Initial release

pub mod pipeline;
pub mod state;

pub use pipeline::{CapturePipeline, CaptureSession};
pub use state::{reduce, CaptureEvent, CapturePhase, CaptureSessionState};
