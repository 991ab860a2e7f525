//! # Feature: Capture Pipeline
//!
//! Drives one label capture end to end: OCR, medication matching, then a
//! concurrent drug-event fan-out. Work runs on a background task that
//! posts `CaptureEvent`s to the session; the session folds them through
//! `reduce` on a single loop, so state is only ever touched in one place.
//! Dismissing the session drops the receiver and anything still in
//! flight is discarded.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: External dismissal through `CaptureSession::sender`
//! - 1.0.0: Initial release

use crate::features::capture::state::{reduce, CaptureEvent, CaptureSessionState};
use crate::features::lookup::{spawn_lookups, DrugEventLookup};
use crate::features::matching::MedicationTextMatcher;
use crate::features::ocr::TextExtractor;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Event loop owning a single `CaptureSessionState`
pub struct CaptureSession {
    sender: mpsc::UnboundedSender<CaptureEvent>,
    receiver: mpsc::UnboundedReceiver<CaptureEvent>,
    state: CaptureSessionState,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        CaptureSession {
            sender,
            receiver,
            state: CaptureSessionState::default(),
        }
    }

    /// Handle for posting events (e.g. `Dismissed`) into the loop
    pub fn sender(&self) -> mpsc::UnboundedSender<CaptureEvent> {
        self.sender.clone()
    }

    pub fn state(&self) -> &CaptureSessionState {
        &self.state
    }

    /// Fold events until the session reaches a terminal phase.
    /// `on_change` sees every intermediate state.
    pub async fn run<F>(self, mut on_change: F) -> CaptureSessionState
    where
        F: FnMut(&CaptureSessionState) + Send,
    {
        let CaptureSession {
            sender,
            mut receiver,
            mut state,
        } = self;
        // Only outside senders keep the loop alive
        drop(sender);

        while let Some(event) = receiver.recv().await {
            debug!("Capture event: {:?}", event);
            state = reduce(state, event);
            on_change(&state);

            if state.phase.is_terminal() {
                break;
            }
        }
        state
    }
}

#[derive(Clone)]
pub struct CapturePipeline {
    extractor: Arc<dyn TextExtractor>,
    lookup: Arc<dyn DrugEventLookup>,
    matcher: MedicationTextMatcher,
    language: String,
}

impl CapturePipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        lookup: Arc<dyn DrugEventLookup>,
        matcher: MedicationTextMatcher,
        language: impl Into<String>,
    ) -> Self {
        CapturePipeline {
            extractor,
            lookup,
            matcher,
            language: language.into(),
        }
    }

    /// Start analysis in the background, posting progress to `events`
    pub fn start(
        &self,
        image_uri: &str,
        image: Vec<u8>,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let pipeline = self.clone();
        let image_uri = image_uri.to_string();

        tokio::spawn(async move {
            pipeline.produce(image_uri, image, events).await;
        })
    }

    /// Analyze one image and return the finished session state
    pub async fn analyze(&self, image_uri: &str, image: &[u8]) -> CaptureSessionState {
        self.analyze_with(image_uri, image, |_| {}).await
    }

    /// Like `analyze`, reporting every intermediate state to `on_change`
    pub async fn analyze_with<F>(
        &self,
        image_uri: &str,
        image: &[u8],
        on_change: F,
    ) -> CaptureSessionState
    where
        F: FnMut(&CaptureSessionState) + Send,
    {
        let session = CaptureSession::new();
        self.start(image_uri, image.to_vec(), session.sender());
        session.run(on_change).await
    }

    async fn produce(
        &self,
        image_uri: String,
        image: Vec<u8>,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) {
        // A send error means the session was dismissed; stop quietly
        macro_rules! post {
            ($event:expr) => {
                if events.send($event).is_err() {
                    debug!("Capture session closed, abandoning analysis");
                    return;
                }
            };
        }

        post!(CaptureEvent::ImageSelected(image_uri.clone()));
        post!(CaptureEvent::AnalysisStarted);

        let text = match self.extractor.extract_text(&image, &self.language).await {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                error!("Error analyzing {image_uri} for text: {e}");
                post!(CaptureEvent::TranscriptionFailed(e.to_string()));
                return;
            }
        };

        let result = match self.matcher.match_text(&text) {
            Ok(result) => result,
            Err(e) => {
                warn!("No medication matched in {image_uri}: {e}");
                post!(CaptureEvent::MatchFailed(e));
                return;
            }
        };

        info!(
            "Matched {} medication(s) in {image_uri}: {}",
            result.matches.len() + result.overflow.len(),
            result.all_tags().join(", ")
        );

        let targets = result.matches.clone();
        post!(CaptureEvent::TextMatched(result));

        if targets.is_empty() {
            return;
        }

        let mut updates = spawn_lookups(self.lookup.clone(), &targets);
        while let Some(update) = updates.recv().await {
            post!(update.into());
        }

        post!(CaptureEvent::LookupsFinished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MedScanError;
    use crate::features::capture::state::{CapturePhase, TRANSCRIPTION_ERROR_MESSAGE};
    use crate::features::lookup::fanout::tests::FakeLookup;
    use crate::features::matching::MedicationVocabulary;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    /// Returns canned OCR text, or fails when `text` is `Err`
    struct FakeExtractor {
        text: Result<Option<String>, String>,
    }

    impl FakeExtractor {
        fn returning(text: &str) -> Self {
            FakeExtractor {
                text: Ok(Some(text.to_string())),
            }
        }
    }

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract_text(
            &self,
            _image: &[u8],
            _language: &str,
        ) -> Result<Option<String>, MedScanError> {
            self.text.clone().map_err(MedScanError::Transcription)
        }
    }

    fn pipeline(extractor: FakeExtractor, lookup: Arc<FakeLookup>) -> CapturePipeline {
        let matcher = MedicationTextMatcher::new(Arc::new(MedicationVocabulary::default()));
        CapturePipeline::new(Arc::new(extractor), lookup, matcher, "eng")
    }

    #[tokio::test]
    async fn test_full_capture() {
        let lookup = Arc::new(
            FakeLookup::default()
                .with("Ibuprofen", vec!["10", "11"])
                .failing("Metformin"),
        );
        let pipeline = pipeline(
            FakeExtractor::returning("IBUPROFEN 200mg\nmetformin tablets\nLisinopril"),
            lookup.clone(),
        );

        let state = pipeline.analyze("file:///label.jpg", b"jpeg").await;

        assert_eq!(state.phase, CapturePhase::Done);
        assert_eq!(state.tags, vec!["Ibuprofen", "Metformin", "Lisinopril"]);
        let ids: HashSet<&str> = state.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["10", "11"]));
        assert!(state.events.iter().all(|e| e.source_drug == "Ibuprofen"));
        assert_eq!(state.lookup_failures.len(), 1);
        assert_eq!(state.lookup_failures[0].0, "Metformin");
        assert_eq!(state.empty_lookups, vec!["Lisinopril"]);
        assert!(state.error.is_none());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_text_skips_lookup() {
        let lookup = Arc::new(FakeLookup::default());
        let pipeline = pipeline(FakeExtractor { text: Ok(None) }, lookup.clone());

        let state = pipeline.analyze("a", b"").await;

        assert_eq!(state.phase, CapturePhase::Failed);
        assert_eq!(state.error.as_deref(), Some("No text detected."));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_text() {
        let lookup = Arc::new(FakeLookup::default());
        let pipeline = pipeline(FakeExtractor::returning("Take with food"), lookup.clone());

        let state = pipeline.analyze("a", b"").await;

        assert_eq!(
            state.error.as_deref(),
            Some("No valid medication names found in extracted text.")
        );
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcription_failure() {
        let lookup = Arc::new(FakeLookup::default());
        let pipeline = pipeline(
            FakeExtractor {
                text: Err("HTTP 403".to_string()),
            },
            lookup,
        );

        let state = pipeline.analyze("a", b"").await;

        assert_eq!(state.phase, CapturePhase::Failed);
        assert_eq!(state.error.as_deref(), Some(TRANSCRIPTION_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_reports_intermediate_states() {
        let lookup = Arc::new(FakeLookup::default().with("Albuterol", vec!["1"]));
        let pipeline = pipeline(FakeExtractor::returning("Albuterol inhaler"), lookup);
        let mut phases = Vec::new();

        pipeline
            .analyze_with("a", b"", |state| phases.push(state.phase))
            .await;

        assert_eq!(
            phases,
            vec![
                CapturePhase::Selected,
                CapturePhase::Analyzing,
                CapturePhase::LookingUp,
                CapturePhase::LookingUp,
                CapturePhase::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_discards_late_results() {
        let lookup = Arc::new(
            FakeLookup::default()
                .with("Omeprazole", vec!["1"])
                .delayed("Omeprazole", 5_000),
        );
        let pipeline = pipeline(FakeExtractor::returning("Omeprazole"), lookup);
        let session = CaptureSession::new();
        let dismiss = session.sender();

        let handle = pipeline.start("a", Vec::new(), session.sender());
        let state = session
            .run(move |state| {
                if state.phase == CapturePhase::LookingUp {
                    let _ = dismiss.send(CaptureEvent::Dismissed);
                }
            })
            .await;

        assert_eq!(state.phase, CapturePhase::Dismissed);
        assert!(state.events.is_empty());
        assert_eq!(state.tags, vec!["Omeprazole"]);

        // Producer notices the closed session and exits
        handle.await.unwrap();
    }
}
