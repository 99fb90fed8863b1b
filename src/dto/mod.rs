//! Serialize-only payloads handed to the transport's template renderer.

use serde::Serialize;

/// Payload for the `modSuccess` template confirming a moderator action.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModSuccess {
    /// Which command succeeded.
    pub command: String,
    /// Human-readable result line.
    pub results: String,
    /// Name of the game acted on.
    pub game: String,
}

/// Payload for the `newDay` template announcing a day rollover.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewDaySummary {
    /// The day that just began.
    pub day: u32,
    /// Living player count.
    pub num_players: usize,
    /// Votes needed to lynch today.
    pub to_execute: u32,
    /// Living players, in join order.
    pub names: Vec<String>,
    /// Whether a phase deadline should be shown.
    pub show_phase_end: bool,
    /// The deadline, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_end: Option<String>,
}

/// One row of the `listVotes` template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoteCount {
    /// Target username.
    pub target: String,
    /// Weighted current votes against them.
    pub votes: u32,
    /// Votes needed to lynch this target.
    pub threshold: u32,
    /// Who is voting for them, in submission order.
    pub voters: Vec<String>,
}

/// Payload for the `listVotes` template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    /// Day the tally covers.
    pub day: u32,
    /// Tally rows, descending by count.
    pub votes: Vec<VoteCount>,
    /// Living players without a current vote.
    pub not_voting: Vec<String>,
}

/// One recorded night action in the `listNightActions` template.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NightAction {
    /// Acting player.
    pub actor: String,
    /// Their target.
    pub target: String,
    /// Lane the action was submitted in.
    pub token: String,
}

/// One lane's worth of night actions.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NightActionGroup {
    /// Whether the group has anything to show.
    pub show: bool,
    /// Actions in the group.
    pub actions: Vec<NightAction>,
}

/// Payload for the `listNightActions` template, grouped the way moderators
/// read them.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NightActionsReport {
    /// First scum faction's kill lane.
    pub scum: NightActionGroup,
    /// Second scum faction's kill lane.
    pub scum2: NightActionGroup,
    /// Everything else.
    pub other: NightActionGroup,
}

/// One roster row for the player listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RosterEntry {
    /// Player username.
    pub username: String,
    /// Whether they are still alive.
    pub alive: bool,
}

/// Payload for the `listPlayers` / `gameEnd` templates.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    /// Name of the game.
    pub game: String,
    /// Every player with their aliveness.
    pub players: Vec<RosterEntry>,
    /// The game's moderators.
    pub moderators: Vec<String>,
}

/// Payload for the `lynched` template announcing an automatic elimination.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Lynched {
    /// Who was eliminated.
    pub target: String,
    /// The weighted vote count that crossed the line.
    pub votes: u32,
    /// The threshold that was crossed.
    pub threshold: u32,
    /// Day of the lynch.
    pub day: u32,
}
