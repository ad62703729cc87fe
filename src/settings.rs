use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lifecycle::EndThresholds;

pub const SETTINGS_FILE_NAME: &str = "recorder.json";

/// Recorder configuration. Everything except the data directory has a
/// default; `recorder.json` in the data directory may override any field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecorderSettings {
    pub data_directory: PathBuf,
    pub temp_log_name: String,
    pub final_log_name: String,
    /// Simulation-time units between PING passes.
    pub ping_interval: f64,
    /// Simulation-time units between end-condition evaluations.
    pub end_check_interval: f64,
    pub attack_stall_threshold: f64,
    pub position_stall_threshold: f64,
    pub watchdog_poll_interval_ms: u64,
    pub watchdog_stall_window_ms: u64,
    pub watchdog_no_combat_ceiling_ms: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("."),
            temp_log_name: "tmp-events.txt".to_string(),
            final_log_name: "raw-events.txt".to_string(),
            ping_interval: 0.5,
            end_check_interval: 10.0,
            attack_stall_threshold: 180.0,
            position_stall_threshold: 30.0,
            watchdog_poll_interval_ms: 1_000,
            watchdog_stall_window_ms: 10_000,
            watchdog_no_combat_ceiling_ms: 180_000,
        }
    }
}

impl RecorderSettings {
    pub fn for_data_directory(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
            ..Self::default()
        }
    }

    /// Defaults for `data_directory`, overridden by its `recorder.json` when
    /// present. The directory itself always wins over the file's value.
    pub fn load(data_directory: &Path) -> Result<Self, String> {
        let settings_path = data_directory.join(SETTINGS_FILE_NAME);
        let raw_json = match std::fs::read_to_string(&settings_path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(Self::for_data_directory(data_directory));
            }
            Err(error) => {
                return Err(format!(
                    "Failed to read recorder settings '{}': {error}",
                    settings_path.display()
                ));
            }
        };

        let mut settings = serde_json::from_str::<RecorderSettings>(&raw_json).map_err(|error| {
            format!(
                "Failed to parse recorder settings '{}': {error}",
                settings_path.display()
            )
        })?;
        settings.data_directory = data_directory.to_path_buf();

        tracing::info!(
            settings_path = %settings_path.display(),
            ping_interval = settings.ping_interval,
            end_check_interval = settings.end_check_interval,
            "Loaded recorder settings override"
        );

        Ok(settings)
    }

    pub fn temp_log_path(&self) -> PathBuf {
        self.data_directory.join(&self.temp_log_name)
    }

    pub fn final_log_path(&self) -> PathBuf {
        self.data_directory.join(&self.final_log_name)
    }

    pub fn end_thresholds(&self) -> EndThresholds {
        EndThresholds {
            attack_stall: self.attack_stall_threshold,
            position_stall: self.position_stall_threshold,
        }
    }

    pub fn watchdog_poll_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_poll_interval_ms)
    }

    pub fn watchdog_stall_window(&self) -> Duration {
        Duration::from_millis(self.watchdog_stall_window_ms)
    }

    pub fn watchdog_no_combat_ceiling(&self) -> Duration {
        Duration::from_millis(self.watchdog_no_combat_ceiling_ms)
    }
}
