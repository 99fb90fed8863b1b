//! The game aggregate: a handle bound to the repository whose operations
//! validate invariants, mutate the persisted record, and save.

use thiserror::Error;
use tracing::info;

use crate::{
    dao::{
        DaoError, MafiaDao,
        models::{
            ActionRecord, ActionToken, GameRecord, ModeratorRecord, PlayerProperty, PlayerRecord,
        },
    },
    state::{
        ledger,
        state_machine::{self, InvalidTransition, LifecycleEvent, LifecycleState},
    },
};

/// Error raised by game entity operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// The named user is not a player in this game.
    #[error("{username} is not a player in this game")]
    PlayerNotFound {
        /// The username that failed to resolve.
        username: String,
    },
    /// The named user already plays in this game.
    #[error("{username} is already a player in this game")]
    DuplicatePlayer {
        /// The username that was already present.
        username: String,
    },
    /// The named user already moderates this game.
    #[error("{username} is already a moderator of this game")]
    DuplicateModerator {
        /// The username that was already present.
        username: String,
    },
    /// The named user does not moderate this game.
    #[error("{username} is not a moderator of this game")]
    ModeratorNotFound {
        /// The username that failed to resolve.
        username: String,
    },
    /// The link is already attached and the caller asked for strict linking.
    #[error("{kind} {id} is already part of this game")]
    DuplicateLink {
        /// "thread" or "chat".
        kind: &'static str,
        /// The duplicate identifier.
        id: u64,
    },
    /// The lifecycle rejected the requested advance.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The repository or store failed underneath the entity.
    #[error(transparent)]
    Dao(#[from] DaoError),
}

/// Whether repeated topic/chat links are tolerated. The permissive default
/// matches historical behavior; strict linking is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    /// Re-linking an attached thread/chat is a no-op append.
    AllowDuplicates,
    /// Re-linking an attached thread/chat is an error.
    RejectDuplicates,
}

/// Result of a lifecycle advance, for rendering phase-change announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// Position before the advance.
    pub from: LifecycleState,
    /// Position after the advance.
    pub to: LifecycleState,
}

impl PhaseChange {
    /// Whether the advance crossed into a new day.
    pub fn started_new_day(&self) -> bool {
        self.to.day > self.from.day
    }
}

/// Handle to one persisted game, bound back to the repository so every
/// mutation runs load→validate→mutate→save under the repository's write gate.
#[derive(Clone, Debug)]
pub struct Game {
    dao: MafiaDao,
    topic_id: u64,
}

impl Game {
    pub(crate) fn bind(dao: MafiaDao, topic_id: u64) -> Self {
        Self { dao, topic_id }
    }

    /// The thread this game is keyed by.
    pub fn topic_id(&self) -> u64 {
        self.topic_id
    }

    /// Clone of the current persisted record, for reads and rendering.
    pub async fn snapshot(&self) -> Result<GameRecord, DaoError> {
        self.dao.read(self.topic_id, Clone::clone).await
    }

    /// Add a living player. Rejects a username already present in the game,
    /// matched case-insensitively.
    pub async fn add_player(&self, username: &str) -> Result<(), GameError> {
        let username = username.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                if record.find_player(&username).is_some() {
                    return Err(GameError::DuplicatePlayer { username });
                }
                record.players.push(PlayerRecord::new(username));
                Ok(())
            })
            .await
    }

    /// Register a moderator. Duplicates are rejected here; bulk registration
    /// paths catch the error and log it as a no-op.
    pub async fn add_moderator(&self, username: &str) -> Result<(), GameError> {
        let username = username.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                if record.find_moderator(&username).is_some() {
                    return Err(GameError::DuplicateModerator { username });
                }
                record.moderators.push(ModeratorRecord::new(username));
                Ok(())
            })
            .await
    }

    /// Mark a player dead. The record stays for history; killing an absent
    /// player is an error, and killing a dead one is rejected upstream where
    /// the target's liveness is checked.
    pub async fn kill_player(&self, username: &str) -> Result<(), GameError> {
        let username = username.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                let player = record
                    .find_player_mut(&username)
                    .ok_or(GameError::PlayerNotFound { username })?;
                player.alive = false;
                Ok(())
            })
            .await
    }

    /// Attach a property to a player.
    pub async fn add_player_property(
        &self,
        username: &str,
        property: PlayerProperty,
    ) -> Result<(), GameError> {
        let username = username.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                let player = record
                    .find_player_mut(&username)
                    .ok_or(GameError::PlayerNotFound { username })?;
                if !player.has_property(&property) {
                    player.properties.push(property);
                }
                Ok(())
            })
            .await
    }

    /// Set an arbitrary option, returning the previous value for echoing back
    /// to the moderator (`None` means it was unset).
    pub async fn set_value(&self, key: &str, value: &str) -> Result<Option<String>, GameError> {
        let key = key.to_string();
        let value = value.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                Ok::<_, GameError>(record.values.insert(key, value))
            })
            .await
    }

    /// Sanction a thread as part of the game.
    pub async fn add_topic(&self, topic_id: u64, policy: LinkPolicy) -> Result<(), GameError> {
        self.dao
            .mutate(self.topic_id, move |record| {
                if policy == LinkPolicy::RejectDuplicates && record.topics.contains(&topic_id) {
                    return Err(GameError::DuplicateLink {
                        kind: "thread",
                        id: topic_id,
                    });
                }
                record.topics.push(topic_id);
                Ok(())
            })
            .await
    }

    /// Sanction a chat as part of the game.
    pub async fn add_chat(&self, chat_id: u64, policy: LinkPolicy) -> Result<(), GameError> {
        self.dao
            .mutate(self.topic_id, move |record| {
                if policy == LinkPolicy::RejectDuplicates && record.chats.contains(&chat_id) {
                    return Err(GameError::DuplicateLink {
                        kind: "chat",
                        id: chat_id,
                    });
                }
                record.chats.push(chat_id);
                Ok(())
            })
            .await
    }

    /// Close signups and begin day 1.
    pub async fn start(&self) -> Result<PhaseChange, GameError> {
        self.advance(LifecycleEvent::Start).await
    }

    /// Toggle day/night; wrapping from night starts the next day.
    pub async fn next_phase(&self) -> Result<PhaseChange, GameError> {
        self.advance(LifecycleEvent::NextPhase).await
    }

    /// Jump to the next day's day phase. Previous days' actions drop out of
    /// tallies implicitly through the ledger's day scoping.
    pub async fn new_day(&self) -> Result<PhaseChange, GameError> {
        self.advance(LifecycleEvent::NewDay).await
    }

    /// End the game. Terminal.
    pub async fn finish(&self) -> Result<PhaseChange, GameError> {
        self.advance(LifecycleEvent::Finish).await
    }

    async fn advance(&self, event: LifecycleEvent) -> Result<PhaseChange, GameError> {
        let change = self
            .dao
            .mutate(self.topic_id, move |record| {
                let from = LifecycleState {
                    status: record.status,
                    day: record.day,
                    phase: record.phase,
                };
                let to = state_machine::advance(from, event)?;
                record.status = to.status;
                record.day = to.day;
                record.phase = to.phase;
                Ok::<_, GameError>(PhaseChange { from, to })
            })
            .await?;

        info!(
            topic_id = self.topic_id,
            day = change.to.day,
            phase = %change.to.phase,
            status = %change.to.status,
            "lifecycle advanced"
        );
        Ok(change)
    }

    /// Record a targeted action in the given lane, superseding the actor's
    /// previous current action in that lane for this day and phase.
    pub async fn record_action(
        &self,
        actor: &str,
        target: &str,
        token: ActionToken,
    ) -> Result<(), GameError> {
        let actor = actor.to_string();
        let target = target.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                ledger::add_action_with_target(record, &actor, &target, token);
                Ok::<_, GameError>(())
            })
            .await
    }

    /// Record a revocation in the given lane.
    pub async fn revoke_action(&self, actor: &str, token: ActionToken) -> Result<(), GameError> {
        let actor = actor.to_string();
        self.dao
            .mutate(self.topic_id, move |record| {
                ledger::revoke_action(record, &actor, token);
                Ok::<_, GameError>(())
            })
            .await
    }

    /// Ledger entries, optionally filtered to one lane, scoped to the current
    /// day. Callers narrow further to current entries for "active votes" views.
    pub async fn actions(&self, token: Option<ActionToken>) -> Result<Vec<ActionRecord>, DaoError> {
        self.dao
            .read(self.topic_id, move |record| {
                ledger::current_actions(record, token.as_ref())
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await
    }
}
