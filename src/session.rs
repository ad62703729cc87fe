//! The recording session: one object owning every piece of derived state,
//! shared by the host's callback thread and the watchdog.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::host::{MatchHost, PrincipalSnapshot, StructureKind};
use crate::identity::{DeathStates, IdentityCache};
use crate::lifecycle::{evaluate_end_conditions, game_end_event, EndSignal, MatchLifecycle};
use crate::ping::{build_ping_event, PingScheduler};
use crate::settings::RecorderSettings;
use crate::stall::{position_digest, StallDetector};
use crate::telemetry::event::{EVENT_ID_BARRACKS, EVENT_ID_HERO, EVENT_ID_TURRET};
use crate::telemetry::{encode_event, EventLogSink, TelemetryEvent};

pub(crate) struct SessionState {
    pub(crate) identities: IdentityCache,
    pub(crate) deaths: DeathStates,
    pub(crate) stall: StallDetector,
    ping: PingScheduler,
    lifecycle: MatchLifecycle,
    sink: EventLogSink,
    event_counts: BTreeMap<&'static str, u64>,
}

impl SessionState {
    /// Encodes and appends one event. Events arriving after the match ended
    /// are dropped.
    pub(crate) fn record(&mut self, event: TelemetryEvent) {
        if self.lifecycle.is_ended() {
            tracing::trace!(event = event.name(), "Dropping event after match end");
            return;
        }

        let line = encode_event(&event);
        if let Err(error) = self.sink.append(&line) {
            tracing::error!(
                event = event.name(),
                sink_error = %error,
                "Event log is no longer writable; aborting"
            );
            std::process::abort();
        }

        *self.event_counts.entry(event.name()).or_insert(0) += 1;
    }

    fn conclude(&mut self, signals: &[EndSignal], game_time: f64) -> bool {
        if self.lifecycle.is_ended() {
            return false;
        }

        for signal in signals {
            tracing::info!(reason = signal.reason(), game_time, "Match end condition met");
            if let Some(event) = signal.to_event(game_time) {
                self.record(event);
            }
        }

        let reason = signals
            .first()
            .map(EndSignal::reason)
            .unwrap_or("unknown");
        self.record(game_end_event(game_time, reason));
        self.lifecycle.mark_ended();

        tracing::info!(
            reason,
            game_time,
            event_counts = ?self.event_counts,
            "Match recording concluded"
        );

        if let Err(error) = self.sink.finalize() {
            tracing::error!(sink_error = %error, "Failed to finalize event log; aborting");
            std::process::abort();
        }

        true
    }
}

pub struct MatchRecorder {
    host: Arc<dyn MatchHost>,
    settings: RecorderSettings,
    state: Mutex<SessionState>,
}

impl MatchRecorder {
    pub fn new(host: Arc<dyn MatchHost>, settings: RecorderSettings) -> Result<Self, String> {
        let sink = EventLogSink::create(&settings.temp_log_path(), &settings.final_log_path())?;

        let state = SessionState {
            identities: IdentityCache::default(),
            deaths: DeathStates::default(),
            stall: StallDetector::default(),
            ping: PingScheduler::new(settings.ping_interval),
            lifecycle: MatchLifecycle::new(settings.end_check_interval),
            sink,
            event_counts: BTreeMap::new(),
        };

        Ok(Self {
            host,
            settings,
            state: Mutex::new(state),
        })
    }

    pub fn host(&self) -> &Arc<dyn MatchHost> {
        &self.host
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Runs `action` under the session lock. A poisoned lock drops the
    /// action and returns `None`.
    pub(crate) fn with_state<T>(&self, action: impl FnOnce(&mut SessionState) -> T) -> Option<T> {
        match self.state.lock() {
            Ok(mut state) => Some(action(&mut state)),
            Err(error) => {
                tracing::error!(
                    lock_error = %error,
                    "Failed to lock match recorder state; dropping callback"
                );
                None
            }
        }
    }

    pub fn is_ended(&self) -> bool {
        self.with_state(|state| state.lifecycle.is_ended())
            .unwrap_or(true)
    }

    pub fn has_seen_combat(&self) -> bool {
        self.with_state(|state| state.stall.has_seen_combat())
            .unwrap_or(false)
    }

    pub fn event_counts(&self) -> BTreeMap<&'static str, u64> {
        self.with_state(|state| state.event_counts.clone())
            .unwrap_or_default()
    }

    /// Primary-context periodic work: pings on their cadence, end checks on
    /// theirs.
    pub fn handle_tick(&self, game_time: f64) {
        let signals = self
            .with_state(|state| {
                if state.lifecycle.is_ended() {
                    return Vec::new();
                }

                if state.ping.poll(game_time) {
                    self.ping_pass(state, game_time);
                }

                if !state.lifecycle.end_check_due(game_time) {
                    return Vec::new();
                }

                let terminal_structures = self.host.structures(StructureKind::Nexus);
                evaluate_end_conditions(
                    game_time,
                    &state.stall,
                    &terminal_structures,
                    self.settings.end_thresholds(),
                )
            })
            .unwrap_or_default();

        if !signals.is_empty() {
            self.conclude(signals, game_time);
        }
    }

    /// The single transition to Ended, reachable from both contexts. Writes
    /// the announcement lines, finalizes the log and asks the host to quit.
    /// Returns false when another caller already concluded the match.
    pub fn conclude(&self, signals: Vec<EndSignal>, game_time: f64) -> bool {
        let concluded = self
            .with_state(|state| state.conclude(&signals, game_time))
            .unwrap_or(false);

        if concluded {
            self.host.quit_session();
        }

        concluded
    }

    fn ping_pass(&self, state: &mut SessionState, game_time: f64) {
        let principals = self.host.principals();

        if !state.identities.has_principals() && !principals.is_empty() {
            self.register_identities(state, &principals, game_time);
        }

        state
            .stall
            .observe_positions(position_digest(&principals), game_time);

        for principal in &principals {
            let display_name = state.identities.resolve(principal.id, &principal.name);
            state.record(build_ping_event(principal, display_name, game_time));
        }

        for principal in &principals {
            state.deaths.record(principal.id, principal.is_dead);
        }
    }

    fn register_identities(
        &self,
        state: &mut SessionState,
        principals: &[PrincipalSnapshot],
        game_time: f64,
    ) {
        for principal in principals {
            let registered_name = state
                .identities
                .register_principal(principal.id, &principal.name)
                .map(str::to_string);
            if let Some(name) = registered_name {
                state.record(
                    TelemetryEvent::new(EVENT_ID_HERO, game_time)
                        .field("name", name)
                        .field("network_id", principal.id.raw()),
                );
            }
        }

        let mut structure_count = 0usize;
        for (kind, event_name) in [
            (StructureKind::Turret, EVENT_ID_TURRET),
            (StructureKind::Barracks, EVENT_ID_BARRACKS),
        ] {
            for structure in self.host.structures(kind) {
                state
                    .identities
                    .register_structure(structure.id, &structure.name);
                state.record(
                    TelemetryEvent::new(event_name, game_time)
                        .field("name", structure.name.as_str())
                        .field("network_id", structure.id.raw()),
                );
                structure_count += 1;
            }
        }

        tracing::info!(
            principal_count = principals.len(),
            structure_count,
            game_time,
            "Registered match identities"
        );
    }
}
