use std::collections::HashMap;
use std::fmt;

/// Network-stable entity id. Zero means "not a trackable entity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const SENTINEL: EntityId = EntityId(0);

    pub fn is_trackable(self) -> bool {
        self != Self::SENTINEL
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display names keyed by entity id. First registration wins.
#[derive(Debug, Default)]
pub struct IdentityCache {
    names: HashMap<EntityId, String>,
    principal_count: usize,
}

impl IdentityCache {
    /// Cached name verbatim, or the raw host name wrapped in quotes.
    ///
    /// The host reuses ephemeral ids for decoys and effects that carry a
    /// principal's raw name, so a miss is never an error.
    pub fn resolve(&self, entity_id: EntityId, fallback_raw_name: &str) -> String {
        if let Some(name) = self.names.get(&entity_id) {
            return name.clone();
        }

        quote(fallback_raw_name)
    }

    pub fn register_principal(&mut self, entity_id: EntityId, raw_name: &str) -> Option<&str> {
        let inserted = self.register(entity_id, raw_name);
        if inserted {
            self.principal_count += 1;
        }
        self.names.get(&entity_id).map(String::as_str)
    }

    pub fn register_structure(&mut self, entity_id: EntityId, raw_name: &str) -> bool {
        self.register(entity_id, raw_name)
    }

    fn register(&mut self, entity_id: EntityId, raw_name: &str) -> bool {
        if !entity_id.is_trackable() || self.names.contains_key(&entity_id) {
            return false;
        }

        self.names
            .insert(entity_id, quote(&reinterpret_legacy_name(raw_name)));
        true
    }

    pub fn has_principals(&self) -> bool {
        self.principal_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Last sampled death flag per principal.
#[derive(Debug, Default)]
pub struct DeathStates {
    dead_by_id: HashMap<EntityId, bool>,
}

impl DeathStates {
    pub fn record(&mut self, entity_id: EntityId, is_dead: bool) {
        if entity_id.is_trackable() {
            self.dead_by_id.insert(entity_id, is_dead);
        }
    }

    pub fn is_dead(&self, entity_id: EntityId) -> Option<bool> {
        self.dead_by_id.get(&entity_id).copied()
    }
}

fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

/// The host hands out names whose UTF-8 bytes were decoded one byte per
/// character. Re-pack those characters into bytes and decode them again as
/// UTF-8; names that do not fit that shape are returned unchanged.
pub fn reinterpret_legacy_name(raw_name: &str) -> String {
    if raw_name.is_ascii() {
        return raw_name.to_string();
    }

    let bytes = raw_name
        .chars()
        .map(|character| u8::try_from(u32::from(character)).ok())
        .collect::<Option<Vec<u8>>>();

    match bytes.map(String::from_utf8) {
        Some(Ok(decoded)) => decoded,
        _ => raw_name.to_string(),
    }
}
