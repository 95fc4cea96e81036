//! Hushtype transcription crate - remote speech-to-text with cooperative
//! cancellation.
//!
//! Provides a trait-based abstraction for converting a finished WAV
//! recording into text, the real Whisper API client built on reqwest, and a
//! mock implementation for testing without network access.
//!
//! The cancellation contract: `cancel()` fires the in-flight request's
//! token and returns immediately; the pending `transcribe` call unwinds on
//! its own, removes the source file best-effort, and reports `Cancelled`
//! rather than a remote failure.

use std::future::Future;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use hushtype_core::config::TranscriptionConfig;
use hushtype_core::error::{HushError, Result};
use hushtype_core::types::LanguageHint;

// =============================================================================
// Trait
// =============================================================================

/// Service for transcribing a recorded WAV file to text.
///
/// At most one transcription runs at a time per instance; the caller is
/// responsible for not overlapping calls.
pub trait TranscriptionService: Send + Sync {
    /// Transcribe the WAV file at `audio_path`.
    ///
    /// On success the source file is deleted and the transcript returned.
    /// Fails with `NotConfigured` when no credential is available,
    /// `Remote` on a non-2xx response, or `Cancelled` when `cancel` fired
    /// while the request was in flight.
    fn transcribe(
        &self,
        audio_path: &Path,
        hint: LanguageHint,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Signal the in-flight transcription to unwind. Returns immediately;
    /// a no-op when nothing is in flight.
    fn cancel(&self);
}

// =============================================================================
// Whisper API client
// =============================================================================

/// Remote transcription client for a Whisper-style HTTP API.
///
/// Uploads the recording as multipart form data and reads the transcript
/// back as plain text.
pub struct WhisperApiClient {
    http: reqwest::Client,
    config: TranscriptionConfig,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl WhisperApiClient {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            in_flight: Mutex::new(None),
        }
    }

    async fn upload(&self, audio_path: &Path, hint: LanguageHint) -> Result<String> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording.wav".to_string());

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| HushError::Transcription(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "text");
        // The language field is omitted entirely for auto-detect.
        if let Some(code) = hint.code() {
            form = form.text("language", code);
        }

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| HushError::Transcription(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HushError::Transcription(e.to_string()))?;

        if !status.is_success() {
            return Err(HushError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        if let Err(e) = tokio::fs::remove_file(audio_path).await {
            tracing::debug!(error = %e, "Failed to remove transcribed recording");
        }

        tracing::info!(text_len = body.len(), "Transcription succeeded");
        Ok(body)
    }
}

impl TranscriptionService for WhisperApiClient {
    async fn transcribe(&self, audio_path: &Path, hint: LanguageHint) -> Result<String> {
        if !self.config.is_configured() {
            return Err(HushError::NotConfigured);
        }

        let token = CancellationToken::new();
        *self.in_flight.lock().expect("token mutex poisoned") = Some(token.clone());

        tracing::info!(
            path = %audio_path.display(),
            language = %hint,
            "Uploading recording for transcription"
        );

        let result = tokio::select! {
            _ = token.cancelled() => {
                if let Err(e) = tokio::fs::remove_file(audio_path).await {
                    tracing::debug!(error = %e, "Failed to remove cancelled recording");
                }
                tracing::info!("Transcription cancelled");
                Err(HushError::Cancelled)
            }
            res = self.upload(audio_path, hint) => res,
        };

        self.in_flight.lock().expect("token mutex poisoned").take();
        result
    }

    fn cancel(&self) {
        if let Some(token) = self.in_flight.lock().expect("token mutex poisoned").take() {
            token.cancel();
        }
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Outcome a `MockTranscriptionService` produces for each call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this transcript (the source file is deleted, like the real
    /// client).
    Text(String),
    /// Fail with `Remote { status, body }`.
    Remote { status: u16, body: String },
    /// Fail with `NotConfigured`.
    NotConfigured,
}

/// Mock transcription service for testing without network access.
///
/// Honors the cancellation contract: a `cancel` during the configured
/// delay yields `Cancelled` and removes the source file.
pub struct MockTranscriptionService {
    outcome: Mutex<MockOutcome>,
    delay: Duration,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl Default for MockTranscriptionService {
    fn default() -> Self {
        Self::new(MockOutcome::Text("[mock transcript]".to_string()))
    }
}

impl MockTranscriptionService {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            delay: Duration::ZERO,
            in_flight: Mutex::new(None),
        }
    }

    /// Delay each call by `delay` before resolving, so tests can cancel
    /// mid-flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the outcome for subsequent calls.
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock().expect("outcome mutex poisoned") = outcome;
    }
}

impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(&self, audio_path: &Path, _hint: LanguageHint) -> Result<String> {
        let token = CancellationToken::new();
        *self.in_flight.lock().expect("token mutex poisoned") = Some(token.clone());

        let cancelled = tokio::select! {
            _ = token.cancelled() => true,
            _ = tokio::time::sleep(self.delay) => false,
        };
        self.in_flight.lock().expect("token mutex poisoned").take();

        if cancelled {
            let _ = tokio::fs::remove_file(audio_path).await;
            return Err(HushError::Cancelled);
        }

        let outcome = self.outcome.lock().expect("outcome mutex poisoned").clone();
        match outcome {
            MockOutcome::Text(text) => {
                let _ = tokio::fs::remove_file(audio_path).await;
                Ok(text)
            }
            MockOutcome::Remote { status, body } => Err(HushError::Remote { status, body }),
            MockOutcome::NotConfigured => Err(HushError::NotConfigured),
        }
    }

    fn cancel(&self) {
        if let Some(token) = self.in_flight.lock().expect("token mutex poisoned").take() {
            token.cancel();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
