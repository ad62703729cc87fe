pub mod host;
pub mod identity;
mod ingest;
pub mod lifecycle;
pub mod ping;
pub mod session;
pub mod settings;
pub mod stall;
pub mod telemetry;
pub mod watchdog;

use std::path::Path;
use std::sync::{Arc, Mutex};

pub use host::{
    AnimationNotice, BasicAttackNotice, DamageNotice, GameEventId, GameObjectRef, LevelUpNotice,
    MatchEventHandler, MatchHost, ObjectKind, PrincipalSnapshot, SpellCastNotice, SpellSlotState,
    StructureDamageNotice, StructureKind, StructureSnapshot,
};
pub use identity::EntityId;
pub use lifecycle::{EndSignal, LifecycleState};
pub use session::MatchRecorder;
pub use settings::RecorderSettings;
pub use telemetry::{FieldValue, Position, TelemetryEvent};
pub use watchdog::{spawn_watchdog, WatchdogHandle};

struct ActiveRecording {
    recorder: Arc<MatchRecorder>,
    watchdog: WatchdogHandle,
}

lazy_static::lazy_static! {
    static ref ACTIVE_RECORDING: Mutex<Option<ActiveRecording>> = Mutex::new(None);
}

/// Installs the fmt subscriber, honoring `RUST_LOG` and defaulting to info.
/// Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Starts recording into `data_directory` and arms the watchdog. The host
/// forwards its callbacks to the returned recorder.
pub fn start_recording(
    host: Arc<dyn MatchHost>,
    data_directory: &Path,
) -> Result<Arc<MatchRecorder>, String> {
    let mut active = ACTIVE_RECORDING.lock().map_err(|error| error.to_string())?;

    if let Some(existing) = active.as_ref() {
        if !existing.recorder.is_ended() {
            return Err("A match recording is already active".to_string());
        }
    }

    let settings = RecorderSettings::load(data_directory)?;
    let recorder = Arc::new(MatchRecorder::new(host, settings)?);
    let watchdog = spawn_watchdog(recorder.clone());

    tracing::info!(
        data_directory = %data_directory.display(),
        "Match recording started"
    );

    let previous = active.replace(ActiveRecording {
        recorder: recorder.clone(),
        watchdog,
    });
    drop(active);

    // The previous watchdog may still be inside the host's quit_session,
    // which is free to call back into this slot.
    if let Some(previous) = previous {
        previous.watchdog.stop();
    }

    Ok(recorder)
}

/// Stops the watchdog and releases the recorder without finalizing. A match
/// that never concluded leaves only the temporary log behind.
pub fn stop_recording() -> Result<(), String> {
    let previous = ACTIVE_RECORDING
        .lock()
        .map_err(|error| error.to_string())?
        .take();

    let Some(previous) = previous else {
        return Err("No match recording is active".to_string());
    };

    previous.watchdog.stop();
    tracing::info!(
        concluded = previous.recorder.is_ended(),
        "Match recording stopped"
    );

    Ok(())
}

pub fn active_recorder() -> Option<Arc<MatchRecorder>> {
    match ACTIVE_RECORDING.lock() {
        Ok(active) => active.as_ref().map(|recording| recording.recorder.clone()),
        Err(error) => {
            tracing::error!(lock_error = %error, "Failed to lock active recording");
            None
        }
    }
}
