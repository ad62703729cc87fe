//! Host callbacks into log lines: filter the noise, resolve names, keep the
//! combat clock current.

use crate::host::{
    AnimationNotice, BasicAttackNotice, DamageNotice, GameEventId, GameObjectRef, LevelUpNotice,
    MatchEventHandler, SpellCastNotice, StructureDamageNotice,
};
use crate::identity::EntityId;
use crate::lifecycle::EndSignal;
use crate::session::MatchRecorder;
use crate::telemetry::event::{
    EVENT_ANIMATION, EVENT_BASIC_ATTACK, EVENT_CHAMP_DIE, EVENT_CHAMP_KILL, EVENT_CHAMP_LEVEL_UP,
    EVENT_DAMAGE, EVENT_DAMPENER_RESPAWN, EVENT_DAMPENER_RESPAWN_SOON, EVENT_DIE, EVENT_END_GAME,
    EVENT_HERO_DEATH, EVENT_KILL, EVENT_LEVEL_UP, EVENT_ON_CREATE, EVENT_ON_DELETE,
    EVENT_SPELL_CAST, EVENT_STRUCTURE_DAMAGE, EVENT_SURRENDER_AGREED, EVENT_SURRENDER_VOTE,
};
use crate::telemetry::TelemetryEvent;

const EFFECT_OBJECT_SUFFIX: &str = ".troy";

/// Sentinel ids and particle-effect objects never reach the log.
fn is_ignored(object: &GameObjectRef) -> bool {
    !object.id.is_trackable() || object.name.ends_with(EFFECT_OBJECT_SUFFIX)
}

fn notify_event_name(event_id: GameEventId) -> Option<&'static str> {
    let name = match event_id {
        GameEventId::ChampionDie => EVENT_CHAMP_DIE,
        GameEventId::ChampionKill => EVENT_CHAMP_KILL,
        GameEventId::ChampionLevelUp => EVENT_CHAMP_LEVEL_UP,
        GameEventId::DampenerRespawnSoon => EVENT_DAMPENER_RESPAWN_SOON,
        GameEventId::DampenerRespawn => EVENT_DAMPENER_RESPAWN,
        GameEventId::Die => EVENT_DIE,
        GameEventId::EndGame => EVENT_END_GAME,
        GameEventId::Kill => EVENT_KILL,
        GameEventId::SurrenderVote => EVENT_SURRENDER_VOTE,
        GameEventId::SurrenderAgreed => EVENT_SURRENDER_AGREED,
        GameEventId::Other(_) => return None,
    };

    Some(name)
}

impl MatchRecorder {
    fn object_event(&self, event_name: &'static str, object: &GameObjectRef, register: bool) {
        if is_ignored(object) {
            tracing::trace!(event = event_name, object = %object.name, "Ignoring effect object");
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            if register && object.is_structure() {
                state.identities.register_structure(object.id, &object.name);
            }

            let sender = state.identities.resolve(object.id, &object.name);
            state.record(
                TelemetryEvent::new(event_name, game_time)
                    .field("sender", sender)
                    .field("team_id", object.team)
                    .field("network_id", object.id.raw())
                    .field("position", object.position),
            );
        });
    }
}

impl MatchEventHandler for MatchRecorder {
    fn on_tick(&self, game_time: f64) {
        self.handle_tick(game_time);
    }

    fn on_create(&self, object: &GameObjectRef) {
        self.object_event(EVENT_ON_CREATE, object, true);
    }

    fn on_delete(&self, object: &GameObjectRef) {
        self.object_event(EVENT_ON_DELETE, object, false);
    }

    fn on_damage(&self, notice: &DamageNotice) {
        if is_ignored(&notice.sender) || !notice.target.is_principal() {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            let sender = state
                .identities
                .resolve(notice.sender.id, &notice.sender.name);
            let target = state
                .identities
                .resolve(notice.target.id, &notice.target.name);
            state.record(
                TelemetryEvent::new(EVENT_DAMAGE, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.sender.id.raw())
                    .field("damage", notice.damage)
                    .field("target", target)
                    .field("target_network_id", notice.target.id.raw())
                    .field("hit_type", notice.hit_type.as_str())
                    .field("type", notice.damage_type),
            );
        });
    }

    fn on_basic_attack(&self, notice: &BasicAttackNotice) {
        let Some(target) = notice.target.as_ref() else {
            return;
        };
        if is_ignored(&notice.sender) || notice.sender.is_minion() {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            state.stall.record_combat(game_time);

            let sender = state
                .identities
                .resolve(notice.sender.id, &notice.sender.name);
            let target_name = state.identities.resolve(target.id, &target.name);
            state.record(
                TelemetryEvent::new(EVENT_BASIC_ATTACK, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.sender.id.raw())
                    .field("target", target_name)
                    .field("target_network_id", target.id.raw())
                    .field("target_position", target.position),
            );
        });
    }

    fn on_spell_cast(&self, notice: &SpellCastNotice) {
        if is_ignored(&notice.sender) {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            state.stall.record_combat(game_time);

            if !notice.sender.is_principal() {
                return;
            }

            let sender = state
                .identities
                .resolve(notice.sender.id, &notice.sender.name);
            let target_name = notice
                .target
                .as_ref()
                .map(|target| state.identities.resolve(target.id, &target.name));
            let target_network_id = notice
                .target
                .as_ref()
                .map_or(EntityId::SENTINEL, |target| target.id);

            state.record(
                TelemetryEvent::new(EVENT_SPELL_CAST, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.sender.id.raw())
                    .field("name", notice.spell_name.as_str())
                    .field("slot", format!("\"{}\"", notice.slot))
                    .field("level", notice.level)
                    .field("start_position", notice.start)
                    .field("end_position", notice.end)
                    .field("target", target_name)
                    .field("target_network_id", target_network_id.raw()),
            );
        });
    }

    fn on_level_up(&self, notice: &LevelUpNotice) {
        if is_ignored(&notice.sender) {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            let sender = state
                .identities
                .resolve(notice.sender.id, &notice.sender.name);
            state.record(
                TelemetryEvent::new(EVENT_LEVEL_UP, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.sender.id.raw())
                    .field("level", notice.level),
            );
        });
    }

    fn on_death(&self, object: &GameObjectRef) {
        if is_ignored(object) || !object.is_principal() {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            state.deaths.record(object.id, true);

            let sender = state.identities.resolve(object.id, &object.name);
            state.record(
                TelemetryEvent::new(EVENT_HERO_DEATH, game_time)
                    .field("sender", sender)
                    .field("network_id", object.id.raw()),
            );
        });
    }

    fn on_animation(&self, notice: &AnimationNotice) {
        if is_ignored(&notice.sender) || !notice.sender.is_principal() {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            let sender = state
                .identities
                .resolve(notice.sender.id, &notice.sender.name);
            state.record(
                TelemetryEvent::new(EVENT_ANIMATION, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.sender.id.raw())
                    .field("animation", notice.animation.as_str()),
            );
        });
    }

    fn on_structure_damage(&self, notice: &StructureDamageNotice) {
        if is_ignored(&notice.structure) {
            return;
        }

        let game_time = self.host().game_time();
        self.with_state(|state| {
            let sender = state
                .identities
                .resolve(notice.structure.id, &notice.structure.name);
            state.record(
                TelemetryEvent::new(EVENT_STRUCTURE_DAMAGE, game_time)
                    .field("sender", sender)
                    .field("network_id", notice.structure.id.raw())
                    .field("health", notice.health),
            );
        });
    }

    fn on_notify(&self, event_id: GameEventId, network_id: EntityId) {
        let Some(event_name) = notify_event_name(event_id) else {
            tracing::debug!(?event_id, "Ignoring unclassified match notification");
            return;
        };

        let game_time = self.host().game_time();
        let mut event = TelemetryEvent::new(event_name, game_time);
        if event_id != GameEventId::EndGame {
            event = event.field("network_id", network_id.raw());
        }

        self.with_state(|state| state.record(event));
    }

    fn on_match_end(&self) {
        let game_time = self.host().game_time();
        tracing::info!(game_time, "Host reported match end");
        self.conclude(vec![EndSignal::MatchEndNotified], game_time);
    }
}
