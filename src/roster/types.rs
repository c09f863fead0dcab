use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NpcId(pub Uuid);

impl NpcId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NpcId {
    fn default() -> Self {
        Self::new()
    }
}

/// A persona the gateway role-plays.
///
/// `name` is the correlation key between gateway answers and the roster.
/// Nothing enforces uniqueness; lookups resolve to the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcProfile {
    pub id: NpcId,
    pub name: String,
    pub prompt: String,
    pub avatar_color: String,
    #[serde(default)]
    pub is_default: bool,
}

impl NpcProfile {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: NpcId::new(),
            avatar_color: avatar_color_for(&name).to_string(),
            name,
            prompt: prompt.into(),
            is_default: false,
        }
    }
}

/// Partial update for `NpcStore::update`. `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct NpcPatch {
    pub name: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcGroup {
    pub id: GroupId,
    pub name: String,
    pub npc_ids: Vec<NpcId>,
    pub created_at: DateTime<Utc>,
}

pub const AVATAR_COLORS: [&str; 8] = [
    "sky", "amber", "emerald", "rose", "violet", "pink", "lime", "cyan",
];

/// Stable colour pick from a name (djb2-style rolling hash).
pub fn avatar_color_for(name: &str) -> &'static str {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    AVATAR_COLORS[(hash.unsigned_abs() as usize) % AVATAR_COLORS.len()]
}

/// First profile carrying `name`.
pub fn find_by_name<'a>(roster: &'a [NpcProfile], name: &str) -> Option<&'a NpcProfile> {
    roster.iter().find(|p| p.name == name)
}
