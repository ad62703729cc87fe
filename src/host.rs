//! Boundary with the simulation host: what the recorder can ask the host,
//! and the callbacks the host delivers.

use crate::identity::EntityId;
use crate::telemetry::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Principal,
    Minion,
    Turret,
    Barracks,
    Nexus,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Turret,
    Barracks,
    Nexus,
}

/// The acting or targeted object of a callback.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObjectRef {
    pub id: EntityId,
    pub name: String,
    pub kind: ObjectKind,
    pub team: i32,
    pub position: Position,
}

impl GameObjectRef {
    pub fn is_principal(&self) -> bool {
        self.kind == ObjectKind::Principal
    }

    pub fn is_minion(&self) -> bool {
        self.kind == ObjectKind::Minion
    }

    pub fn is_structure(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Turret | ObjectKind::Barracks | ObjectKind::Nexus
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpellSlotState {
    pub level: i32,
    pub on_cooldown: bool,
    pub cooldown_expires: f32,
}

/// Live attributes of one player-controlled entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrincipalSnapshot {
    pub id: EntityId,
    pub index: i32,
    pub name: String,
    pub level: i32,
    pub position: Position,
    pub in_grass: bool,
    pub gold: f32,
    pub is_dead: bool,
    pub under_turret: bool,
    pub under_enemy_turret: bool,
    pub health: f32,
    pub health_max: f32,
    pub mana: f32,
    pub mana_max: f32,
    /// Q, W, E, R, then the two auxiliary slots.
    pub spells: [SpellSlotState; 6],
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureSnapshot {
    pub id: EntityId,
    pub name: String,
    pub kind: StructureKind,
    pub health: f32,
    pub is_dead: bool,
}

impl StructureSnapshot {
    pub fn is_destroyed(&self) -> bool {
        self.health == 0.0 || self.is_dead
    }
}

/// Query side of the host. Called from both the callback thread and the
/// watchdog thread.
pub trait MatchHost: Send + Sync {
    fn game_time(&self) -> f64;

    fn principals(&self) -> Vec<PrincipalSnapshot>;

    fn structures(&self, kind: StructureKind) -> Vec<StructureSnapshot>;

    fn quit_session(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageNotice {
    pub sender: GameObjectRef,
    pub target: GameObjectRef,
    pub damage: f32,
    pub hit_type: String,
    pub damage_type: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicAttackNotice {
    pub sender: GameObjectRef,
    pub target: Option<GameObjectRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpellCastNotice {
    pub sender: GameObjectRef,
    pub spell_name: String,
    pub slot: String,
    pub level: i32,
    pub start: Option<Position>,
    pub end: Option<Position>,
    pub target: Option<GameObjectRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpNotice {
    pub sender: GameObjectRef,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationNotice {
    pub sender: GameObjectRef,
    pub animation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureDamageNotice {
    pub structure: GameObjectRef,
    pub health: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEventId {
    ChampionDie,
    ChampionKill,
    ChampionLevelUp,
    DampenerRespawnSoon,
    DampenerRespawn,
    Die,
    EndGame,
    Kill,
    SurrenderVote,
    SurrenderAgreed,
    Other(i32),
}

/// One method per callback category the host delivers. The host guarantees
/// calls never overlap.
pub trait MatchEventHandler {
    fn on_tick(&self, game_time: f64);

    fn on_create(&self, object: &GameObjectRef);

    fn on_delete(&self, object: &GameObjectRef);

    fn on_damage(&self, notice: &DamageNotice);

    fn on_basic_attack(&self, notice: &BasicAttackNotice);

    fn on_spell_cast(&self, notice: &SpellCastNotice);

    fn on_level_up(&self, notice: &LevelUpNotice);

    fn on_death(&self, object: &GameObjectRef);

    fn on_animation(&self, notice: &AnimationNotice);

    fn on_structure_damage(&self, notice: &StructureDamageNotice);

    fn on_notify(&self, event_id: GameEventId, network_id: EntityId);

    fn on_match_end(&self);
}
