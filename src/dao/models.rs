use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version written into newly created documents. Read back but never checked,
/// so documents produced by older deployments keep loading unchanged.
pub const SCHEMA_VERSION: u32 = 1;

/// Lifecycle status of a game. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Signups are open; the game has not started.
    Prep,
    /// The game is in progress and cycling through day/night phases.
    Running,
    /// The game is over. Terminal.
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Prep => write!(f, "prep"),
            GameStatus::Running => write!(f, "running"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Phase within one game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Public discussion and voting.
    Day,
    /// Targeted night abilities.
    Night,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Day => write!(f, "day"),
            Phase::Night => write!(f, "night"),
        }
    }
}

/// Classifies a recorded action. Serialized as a bare string so documents stay
/// readable and tokens invented by moderators round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionToken {
    /// The default day-vote lane.
    Vote,
    /// First scum faction's night kill lane.
    Scum,
    /// Second scum faction's night kill lane.
    Scum2,
    /// Generic targeted night action.
    Target,
    /// Any other ability name.
    Custom(String),
}

impl From<String> for ActionToken {
    fn from(value: String) -> Self {
        match value.as_str() {
            "vote" => ActionToken::Vote,
            "scum" => ActionToken::Scum,
            "scum2" => ActionToken::Scum2,
            "target" => ActionToken::Target,
            _ => ActionToken::Custom(value),
        }
    }
}

impl From<ActionToken> for String {
    fn from(value: ActionToken) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionToken::Vote => write!(f, "vote"),
            ActionToken::Scum => write!(f, "scum"),
            ActionToken::Scum2 => write!(f, "scum2"),
            ActionToken::Target => write!(f, "target"),
            ActionToken::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Property a moderator can attach to a player. The named ones alter voting
/// arithmetic; anything else is carried verbatim for house rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayerProperty {
    /// Takes one extra vote to lynch.
    Loved,
    /// Takes one fewer vote to lynch.
    Hated,
    /// Their vote counts twice.
    Doublevoter,
    /// Mod-defined property with no engine semantics.
    Custom(String),
}

impl From<String> for PlayerProperty {
    fn from(value: String) -> Self {
        match value.as_str() {
            "loved" => PlayerProperty::Loved,
            "hated" => PlayerProperty::Hated,
            "doublevoter" => PlayerProperty::Doublevoter,
            _ => PlayerProperty::Custom(value),
        }
    }
}

impl From<PlayerProperty> for String {
    fn from(value: PlayerProperty) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PlayerProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerProperty::Loved => write!(f, "loved"),
            PlayerProperty::Hated => write!(f, "hated"),
            PlayerProperty::Doublevoter => write!(f, "doublevoter"),
            PlayerProperty::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Participant tracked for aliveness and properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Username as originally provided; preserved case-sensitively.
    pub username: String,
    /// Whether the player is still alive. Killing clears this; the record stays.
    pub alive: bool,
    /// Properties attached by moderators.
    #[serde(default)]
    pub properties: Vec<PlayerProperty>,
}

impl PlayerRecord {
    /// A fresh, living player with no properties.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            alive: true,
            properties: Vec::new(),
        }
    }

    /// Whether the player currently holds `property`.
    pub fn has_property(&self, property: &PlayerProperty) -> bool {
        self.properties.contains(property)
    }
}

/// User authorized to run the game. Separate namespace from players; the same
/// username may appear in both lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorRecord {
    /// Username as originally provided.
    pub username: String,
    /// Always true for stored instances.
    pub is_moderator: bool,
}

impl ModeratorRecord {
    /// A stored moderator entry.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_moderator: true,
        }
    }
}

/// One submitted vote or targeted ability use. Never deleted, only superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Username of the player who acted.
    pub actor: String,
    /// Target of the action. `None` marks a revocation (unvote).
    pub target: Option<String>,
    /// Lane this action belongs to.
    pub token: ActionToken,
    /// Day the action was submitted in.
    pub day: u32,
    /// Phase the action was submitted in.
    pub phase: Phase,
    /// Whether this is the most recent action in its (day, phase, actor, token)
    /// scope. Only current actions are tallied.
    pub is_current: bool,
}

/// Persisted aggregate for one game. The store document is an ordered sequence
/// of these records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Primary key: the thread the game runs in.
    pub topic_id: u64,
    /// Unique human-readable name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current day number; 0 until the game starts.
    pub day: u32,
    /// Current phase.
    pub phase: Phase,
    /// Users authorized to moderate this game.
    #[serde(default)]
    pub moderators: Vec<ModeratorRecord>,
    /// Participants.
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    /// Threads sanctioned as part of the game.
    #[serde(default)]
    pub topics: Vec<u64>,
    /// Private chats sanctioned as part of the game.
    #[serde(default)]
    pub chats: Vec<u64>,
    /// Arbitrary moderator-set options, insertion-ordered for stable diffs.
    #[serde(default)]
    pub values: IndexMap<String, String>,
    /// Append-only action ledger.
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
    /// Document schema version; written for new games, ignored on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
}

impl GameRecord {
    /// Minimal record for a freshly created game in signups.
    pub fn new(topic_id: u64, name: impl Into<String>) -> Self {
        Self {
            topic_id,
            name: name.into(),
            status: GameStatus::Prep,
            day: 0,
            phase: Phase::Day,
            moderators: Vec::new(),
            players: Vec::new(),
            topics: vec![topic_id],
            chats: Vec::new(),
            values: IndexMap::new(),
            actions: Vec::new(),
            schema_version: Some(SCHEMA_VERSION),
        }
    }

    /// Whether the game is currently running.
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Running
    }

    /// Look up a player. Usernames are stored case-sensitively but matched
    /// case-insensitively, the way chat mentions resolve.
    pub fn find_player(&self, username: &str) -> Option<&PlayerRecord> {
        self.players
            .iter()
            .find(|player| player.username.eq_ignore_ascii_case(username))
    }

    /// Mutable variant of [`GameRecord::find_player`].
    pub fn find_player_mut(&mut self, username: &str) -> Option<&mut PlayerRecord> {
        self.players
            .iter_mut()
            .find(|player| player.username.eq_ignore_ascii_case(username))
    }

    /// Look up a moderator, case-insensitively.
    pub fn find_moderator(&self, username: &str) -> Option<&ModeratorRecord> {
        self.moderators
            .iter()
            .find(|moderator| moderator.username.eq_ignore_ascii_case(username))
    }

    /// Players still alive, in join order.
    pub fn living_players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(|player| player.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_strings() {
        for token in [
            ActionToken::Vote,
            ActionToken::Scum,
            ActionToken::Scum2,
            ActionToken::Target,
            ActionToken::Custom("cop-check".into()),
        ] {
            let text = String::from(token.clone());
            assert_eq!(ActionToken::from(text), token);
        }
    }

    #[test]
    fn player_lookup_is_case_insensitive() {
        let mut record = GameRecord::new(12, "testMafia");
        record.players.push(PlayerRecord::new("Yamikuronue"));

        let found = record.find_player("yamikuronue").expect("player");
        assert_eq!(found.username, "Yamikuronue");
        assert!(record.find_player("accalia").is_none());
    }

    #[test]
    fn new_record_starts_in_prep_with_its_topic_linked() {
        let record = GameRecord::new(42, "foobar");
        assert_eq!(record.status, GameStatus::Prep);
        assert_eq!(record.day, 0);
        assert_eq!(record.topics, vec![42]);
        assert_eq!(record.schema_version, Some(SCHEMA_VERSION));
    }

    #[test]
    fn properties_parse_known_names_and_keep_custom_ones() {
        assert_eq!(
            PlayerProperty::from("loved".to_string()),
            PlayerProperty::Loved
        );
        assert_eq!(
            PlayerProperty::from("bulletproof".to_string()),
            PlayerProperty::Custom("bulletproof".into())
        );
    }
}
