use std::fmt;

pub(crate) const EVENT_PING: &str = "PING";
pub(crate) const EVENT_ID_HERO: &str = "ID_HERO";
pub(crate) const EVENT_ID_TURRET: &str = "ID_TURRET";
pub(crate) const EVENT_ID_BARRACKS: &str = "ID_BARRACKS";
pub(crate) const EVENT_ON_CREATE: &str = "ON_CREATE";
pub(crate) const EVENT_ON_DELETE: &str = "ON_DELETE";
pub(crate) const EVENT_BASIC_ATTACK: &str = "BASIC_ATTACK";
pub(crate) const EVENT_DAMAGE: &str = "DAMAGE";
pub(crate) const EVENT_SPELL_CAST: &str = "SPELL_CAST";
pub(crate) const EVENT_LEVEL_UP: &str = "LEVEL_UP";
pub(crate) const EVENT_HERO_DEATH: &str = "HERO_DEATH";
pub(crate) const EVENT_ANIMATION: &str = "ANIMATION";
pub(crate) const EVENT_STRUCTURE_DAMAGE: &str = "STRUCTURE_DAMAGE";
pub(crate) const EVENT_GAME_STALL: &str = "GAME_STALL";
pub(crate) const EVENT_NEXUS_DESTROYED: &str = "NEXUS_DESTROYED";
pub(crate) const EVENT_GAME_END: &str = "GAME_END";
pub(crate) const EVENT_CHAMP_DIE: &str = "CHAMP_DIE";
pub(crate) const EVENT_CHAMP_KILL: &str = "CHAMP_KILL";
pub(crate) const EVENT_CHAMP_LEVEL_UP: &str = "CHAMP_LEVEL_UP";
pub(crate) const EVENT_DAMPENER_RESPAWN_SOON: &str = "DAMPENER_RESPAWN_SOON";
pub(crate) const EVENT_DAMPENER_RESPAWN: &str = "DAMPENER_RESPAWN";
pub(crate) const EVENT_DIE: &str = "DIE";
pub(crate) const EVENT_END_GAME: &str = "END_GAME";
pub(crate) const EVENT_KILL: &str = "KILL";
pub(crate) const EVENT_SURRENDER_VOTE: &str = "SURRENDER_VOTE";
pub(crate) const EVENT_SURRENDER_AGREED: &str = "SURRENDER_AGREED";

/// A single field value as it appears in the event log.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float32(f32),
    Float(f64),
    Text(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float32(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// World-space position reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X:{} Y:{} Z:{}",
            super::encoder::format_float32(self.x),
            super::encoder::format_float32(self.y),
            super::encoder::format_float32(self.z)
        )
    }
}

impl From<Position> for FieldValue {
    fn from(value: Position) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One line of telemetry. Built once, encoded once.
///
/// Field names may repeat; order is preserved exactly as pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    name: &'static str,
    timestamp: f64,
    fields: Vec<(&'static str, FieldValue)>,
}

impl TelemetryEvent {
    pub fn new(name: &'static str, timestamp: f64) -> Self {
        Self {
            name,
            timestamp,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field_name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((field_name, value.into()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }

    pub fn value_of(&self, field_name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field_name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Position, TelemetryEvent};

    #[test]
    fn keeps_duplicate_fields_in_insertion_order() {
        let event = TelemetryEvent::new("DAMAGE", 12.0)
            .field("target", "\"A\"")
            .field("damage", 30.5_f32)
            .field("target", "\"B\"");

        let names = event
            .fields()
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["target", "damage", "target"]);
        assert_eq!(
            event.value_of("target"),
            Some(&FieldValue::Text("\"A\"".to_string())),
            "Lookup should return the first occurrence"
        );
    }

    #[test]
    fn optional_values_collapse_to_null() {
        let missing: Option<Position> = None;
        let event = TelemetryEvent::new("SPELL_CAST", 1.0)
            .field("start_position", missing)
            .field("end_position", Some(Position::new(1.0, 2.5, -3.0)));

        assert_eq!(event.value_of("start_position"), Some(&FieldValue::Null));
        assert_eq!(
            event.value_of("end_position"),
            Some(&FieldValue::Text("X:1 Y:2.5 Z:-3".to_string()))
        );
    }
}
