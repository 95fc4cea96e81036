//! Hushtype application binary - composition root.
//!
//! Ties together all Hushtype crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the recorder on the platform capture backend
//! 3. Build the Whisper API client from the transcription config
//! 4. Wire the orchestrator and start the recorder event pump
//! 5. Read trigger commands from stdin until shutdown
//!
//! The stdin protocol stands in for a global hotkey: an empty line toggles
//! recording on/off, `c` cancels the current cycle, `q` quits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use hushtype_audio::{CaptureBackend, Recorder, RecorderSettings};
use hushtype_core::config::HushConfig;
use hushtype_dictation::{
    AppState, NoopFocusTracker, NullInjector, Orchestrator, StateController,
};
use hushtype_transcribe::{TranscriptionService, WhisperApiClient};

/// Pick the capture backend for this platform.
fn capture_backend() -> Arc<dyn CaptureBackend> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(hushtype_audio::CpalBackend::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        tracing::warn!("No capture device support on this platform, recordings will be silent");
        Arc::new(hushtype_audio::MockCaptureBackend::new())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Hushtype v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = HushConfig::default_path();
    let config = HushConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if !config.transcription.is_configured() {
        tracing::warn!(
            path = %config_file.display(),
            "No API key configured, transcription requests will be rejected"
        );
    }

    // Recorder on the platform backend.
    let settings = RecorderSettings {
        max_duration: config.recording.timeout().as_duration(),
        device: config.recording.device.clone(),
        ..RecorderSettings::default()
    };
    let recorder = Arc::new(Recorder::new(capture_backend(), settings));

    // State machine with a logging observer.
    let controller = Arc::new(StateController::new());
    controller.subscribe(|state: AppState| {
        tracing::info!(state = %state, "State changed");
    });

    let transcriber = Arc::new(WhisperApiClient::new(config.transcription.clone()));
    let language = config.transcription.language_hint();

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&controller),
        Arc::clone(&recorder),
        Arc::clone(&transcriber),
        Arc::new(NullInjector),
        Arc::new(NoopFocusTracker),
        language,
    ));

    // Recorder event pump.
    let pump = Arc::clone(&orchestrator);
    let events = recorder.subscribe();
    tokio::spawn(async move {
        pump.run(events).await;
    });

    tracing::info!("Ready. Press Enter to toggle recording, 'c' to cancel, 'q' to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => orchestrator.handle_trigger().await,
                    "c" | "cancel" => orchestrator.handle_cancel().await,
                    "q" | "quit" => break,
                    other => tracing::debug!(input = other, "Unknown command"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received");
                break;
            }
        }
    }

    // Unwind any in-flight work before exit.
    recorder.cancel();
    transcriber.cancel();
    tracing::info!("Hushtype stopped");

    Ok(())
}
