//! # OCR Feature
//!
//! Image-to-text extraction through the OCR.space API.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod ocr_space;

pub use ocr_space::{OcrSpaceClient, TextExtractor};
