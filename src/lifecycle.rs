//! Termination rules for an observed match.
//!
//! No single signal is trustworthy on its own: a conceded match never
//! destroys a nexus, neutral monsters can keep attacking forever after a
//! surrender, and replays can freeze with everyone standing still. Any one
//! condition is enough to end the recording.

use std::time::Duration;

use crate::host::StructureSnapshot;
use crate::stall::StallDetector;
use crate::telemetry::event::{
    EVENT_GAME_END, EVENT_GAME_STALL, EVENT_NEXUS_DESTROYED,
};
use crate::telemetry::TelemetryEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndSignal {
    AttackStall { last_combat_time: f64 },
    PositionStall { same_positions_time: f64 },
    TerminalStructureDestroyed { name: String },
    MatchEndNotified,
    WatchdogPositionsFrozen { window: Duration },
    WatchdogNoCombat { waited: Duration },
}

impl EndSignal {
    pub fn reason(&self) -> &'static str {
        match self {
            EndSignal::AttackStall { .. } => "attack_stall",
            EndSignal::PositionStall { .. } => "position_stall",
            EndSignal::TerminalStructureDestroyed { .. } => "nexus_destroyed",
            EndSignal::MatchEndNotified => "match_end_notified",
            EndSignal::WatchdogPositionsFrozen { .. } => "watchdog_positions_frozen",
            EndSignal::WatchdogNoCombat { .. } => "watchdog_no_combat",
        }
    }

    /// The log line announcing this signal, if it has one of its own.
    /// Watchdog ends are carried by the `GAME_END` reason alone.
    pub fn to_event(&self, game_time: f64) -> Option<TelemetryEvent> {
        let event = match self {
            EndSignal::AttackStall { last_combat_time } => {
                TelemetryEvent::new(EVENT_GAME_STALL, game_time)
                    .field("last_attack_time", *last_combat_time)
            }
            EndSignal::PositionStall {
                same_positions_time,
            } => TelemetryEvent::new(EVENT_GAME_STALL, game_time)
                .field("same_positions_time", *same_positions_time),
            EndSignal::TerminalStructureDestroyed { name } => {
                TelemetryEvent::new(EVENT_NEXUS_DESTROYED, game_time).field("nexus", name.as_str())
            }
            EndSignal::MatchEndNotified
            | EndSignal::WatchdogPositionsFrozen { .. }
            | EndSignal::WatchdogNoCombat { .. } => return None,
        };

        Some(event)
    }
}

pub fn game_end_event(game_time: f64, reason: &'static str) -> TelemetryEvent {
    TelemetryEvent::new(EVENT_GAME_END, game_time).field("reason", reason)
}

#[derive(Debug, Clone, Copy)]
pub struct EndThresholds {
    pub attack_stall: f64,
    pub position_stall: f64,
}

/// Every end condition that currently holds, in evaluation order.
pub fn evaluate_end_conditions(
    game_time: f64,
    stall: &StallDetector,
    terminal_structures: &[StructureSnapshot],
    thresholds: EndThresholds,
) -> Vec<EndSignal> {
    let mut signals = Vec::new();

    if let Some(last_combat_time) = stall.attack_stall(game_time, thresholds.attack_stall) {
        signals.push(EndSignal::AttackStall { last_combat_time });
    }

    if let Some(same_positions_time) = stall.position_stall(thresholds.position_stall) {
        signals.push(EndSignal::PositionStall {
            same_positions_time,
        });
    }

    signals.extend(
        terminal_structures
            .iter()
            .filter(|structure| structure.is_destroyed())
            .map(|structure| EndSignal::TerminalStructureDestroyed {
                name: structure.name.clone(),
            }),
    );

    signals
}

/// Active until the first end signal, then Ended for good.
#[derive(Debug)]
pub struct MatchLifecycle {
    state: LifecycleState,
    end_check_interval: f64,
    next_end_check_time: f64,
}

impl MatchLifecycle {
    pub fn new(end_check_interval: f64) -> Self {
        Self {
            state: LifecycleState::Active,
            end_check_interval,
            next_end_check_time: 0.0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == LifecycleState::Ended
    }

    /// True when the end conditions should be evaluated at `game_time`.
    pub fn end_check_due(&mut self, game_time: f64) -> bool {
        if self.is_ended() || game_time <= self.next_end_check_time {
            return false;
        }

        self.next_end_check_time = game_time + self.end_check_interval;
        true
    }

    /// Returns true only for the call that performs the transition.
    pub fn mark_ended(&mut self) -> bool {
        if self.is_ended() {
            return false;
        }

        self.state = LifecycleState::Ended;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        evaluate_end_conditions, game_end_event, EndSignal, EndThresholds, LifecycleState,
        MatchLifecycle,
    };
    use crate::host::fake::structure;
    use crate::host::StructureKind;
    use crate::stall::StallDetector;
    use crate::telemetry::encode_event;

    const THRESHOLDS: EndThresholds = EndThresholds {
        attack_stall: 180.0,
        position_stall: 30.0,
    };

    #[test]
    fn end_check_fires_at_most_once_per_interval() {
        let mut lifecycle = MatchLifecycle::new(10.0);
        assert!(!lifecycle.end_check_due(0.0));
        assert!(lifecycle.end_check_due(0.5));
        assert!(!lifecycle.end_check_due(5.0));
        assert!(!lifecycle.end_check_due(10.5));
        assert!(lifecycle.end_check_due(10.75));
    }

    #[test]
    fn transition_to_ended_happens_once() {
        let mut lifecycle = MatchLifecycle::new(10.0);
        assert_eq!(lifecycle.state(), LifecycleState::Active);

        assert!(lifecycle.mark_ended());
        assert!(!lifecycle.mark_ended());
        assert_eq!(lifecycle.state(), LifecycleState::Ended);
        assert!(
            !lifecycle.end_check_due(1_000.0),
            "No evaluation happens once ended"
        );
    }

    #[test]
    fn quiet_match_without_combat_or_movement_keeps_running() {
        let stall = StallDetector::default();
        let signals = evaluate_end_conditions(500.0, &stall, &[], THRESHOLDS);
        assert!(signals.is_empty());
    }

    #[test]
    fn reports_every_condition_that_holds() {
        let mut stall = StallDetector::default();
        stall.record_combat(10.0);
        stall.observe_positions("frozen".to_string(), 150.0);
        stall.observe_positions("frozen".to_string(), 200.0);

        let mut nexus = structure(77, "HQ_T2", StructureKind::Nexus);
        nexus.is_dead = true;
        let standing = structure(78, "HQ_T1", StructureKind::Nexus);

        let signals = evaluate_end_conditions(200.0, &stall, &[standing, nexus], THRESHOLDS);
        assert_eq!(
            signals,
            vec![
                EndSignal::AttackStall {
                    last_combat_time: 10.0
                },
                EndSignal::PositionStall {
                    same_positions_time: 50.0
                },
                EndSignal::TerminalStructureDestroyed {
                    name: "HQ_T2".to_string()
                },
            ]
        );
    }

    #[test]
    fn signals_render_their_announcement_lines() {
        let stall_line = EndSignal::AttackStall {
            last_combat_time: 12.5,
        }
        .to_event(200.0)
        .map(|event| encode_event(&event));
        assert_eq!(
            stall_line.as_deref(),
            Some("GAME_STALL\ttime\t200\tlast_attack_time\t12.5")
        );

        let nexus_line = EndSignal::TerminalStructureDestroyed {
            name: "HQ_T1".to_string(),
        }
        .to_event(900.0)
        .map(|event| encode_event(&event));
        assert_eq!(
            nexus_line.as_deref(),
            Some("NEXUS_DESTROYED\ttime\t900\tnexus\tHQ_T1")
        );

        assert_eq!(EndSignal::MatchEndNotified.to_event(1.0), None);
    }

    #[test]
    fn watchdog_signals_only_surface_as_game_end_reason() {
        let frozen = EndSignal::WatchdogPositionsFrozen {
            window: Duration::from_secs(10),
        };
        let no_combat = EndSignal::WatchdogNoCombat {
            waited: Duration::from_secs(181),
        };

        assert_eq!(frozen.to_event(30.0), None);
        assert_eq!(no_combat.to_event(30.0), None);
        assert_eq!(
            encode_event(&game_end_event(30.0, frozen.reason())),
            "GAME_END\ttime\t30\treason\twatchdog_positions_frozen"
        );
    }
}
