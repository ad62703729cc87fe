use crate::host::PrincipalSnapshot;
use crate::telemetry::event::EVENT_PING;
use crate::telemetry::TelemetryEvent;

/// Fires on a fixed simulation-time cadence no matter how irregularly ticks
/// arrive. Late ticks fire once and skip the missed slots.
#[derive(Debug)]
pub struct PingScheduler {
    interval: f64,
    next_ping_time: f64,
}

impl PingScheduler {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_ping_time: 0.0,
        }
    }

    pub fn poll(&mut self, game_time: f64) -> bool {
        if game_time < self.next_ping_time {
            return false;
        }

        if self.interval <= 0.0 {
            self.next_ping_time = game_time;
            return true;
        }

        while game_time >= self.next_ping_time {
            self.next_ping_time += self.interval;
        }
        true
    }

    pub fn next_ping_time(&self) -> f64 {
        self.next_ping_time
    }
}

const SPELL_FIELD_NAMES: [[&str; 3]; 6] = [
    ["q_level", "q_cooldown", "q_exp"],
    ["w_level", "w_cooldown", "w_exp"],
    ["e_level", "e_cooldown", "e_exp"],
    ["r_level", "r_cooldown", "r_exp"],
    ["s1_level", "s1_cooldown", "s1_exp"],
    ["s2_level", "s2_cooldown", "s2_exp"],
];

pub fn build_ping_event(
    principal: &PrincipalSnapshot,
    display_name: String,
    game_time: f64,
) -> TelemetryEvent {
    let health = if principal.is_dead {
        0.0
    } else {
        principal.health
    };

    let mut event = TelemetryEvent::new(EVENT_PING, game_time)
        .field("index", principal.index)
        .field("network_id", principal.id.raw())
        .field("name", display_name)
        .field("level", principal.level)
        .field("position", principal.position)
        .field("in_grass", principal.in_grass)
        .field("gold", principal.gold)
        .field("dead", principal.is_dead)
        .field("under_turret", principal.under_turret)
        .field("under_enemy_turret", principal.under_enemy_turret)
        .field("health", health)
        .field("health_max", principal.health_max)
        .field("mana", principal.mana)
        .field("mana_max", principal.mana_max);

    for (spell, [level_field, cooldown_field, expiry_field]) in
        principal.spells.iter().zip(SPELL_FIELD_NAMES)
    {
        event = event
            .field(level_field, spell.level)
            .field(cooldown_field, spell.on_cooldown)
            .field(expiry_field, spell.cooldown_expires);
    }

    event
}
