//! Heuristic "nothing is happening" tracking shared by the tick path and the
//! watchdog.

use crate::host::PrincipalSnapshot;

/// Concatenated positions of every principal, in host order.
pub fn position_digest(principals: &[PrincipalSnapshot]) -> String {
    principals
        .iter()
        .map(|principal| principal.position.to_string())
        .collect()
}

#[derive(Debug, Default)]
pub struct StallDetector {
    last_combat_time: f64,
    last_position_digest: Option<String>,
    last_position_digest_time: f64,
    same_position_duration: f64,
}

impl StallDetector {
    pub fn record_combat(&mut self, time: f64) {
        self.last_combat_time = time;
    }

    pub fn last_combat_time(&self) -> f64 {
        self.last_combat_time
    }

    pub fn has_seen_combat(&self) -> bool {
        self.last_combat_time > 0.0
    }

    /// Feeds one position sample taken at simulation time `time`.
    pub fn observe_positions(&mut self, digest: String, time: f64) {
        match self.last_position_digest.as_deref() {
            Some(previous) if previous == digest => {
                self.same_position_duration += time - self.last_position_digest_time;
            }
            _ => {
                self.same_position_duration = 0.0;
            }
        }

        self.last_position_digest = Some(digest);
        self.last_position_digest_time = time;
    }

    pub fn same_position_duration(&self) -> f64 {
        self.same_position_duration
    }

    /// Returns the last combat time when combat has gone quiet for longer
    /// than `threshold`.
    pub fn attack_stall(&self, now: f64, threshold: f64) -> Option<f64> {
        (self.has_seen_combat() && now - self.last_combat_time > threshold)
            .then_some(self.last_combat_time)
    }

    pub fn position_stall(&self, threshold: f64) -> Option<f64> {
        (self.same_position_duration > threshold).then_some(self.same_position_duration)
    }
}
