//! The handler-boundary error taxonomy.
//!
//! Core operations signal failure through the typed errors in `dao` and
//! `state`; everything converges here so the command dispatcher has exactly
//! one place that turns a failure into user-visible text.

use thiserror::Error;

use crate::{
    dao::{DaoError, models::Phase, store::StorageError},
    state::game::GameError,
    transport::TransportError,
};

/// Result alias for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;

/// Everything a command handler can fail with. Each variant's display text is
/// the denial message the invoking user sees.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No game is registered for the invoking thread, chat, or named target.
    #[error("no game matches that thread, chat, or name")]
    NoGame,
    /// Creation collided with an existing game.
    #[error("a game already exists with that topic id or name")]
    GameExists,
    /// The acting user is not a moderator of the target game.
    #[error("You are not a moderator")]
    NotModerator,
    /// The acting user is not a player in the target game.
    #[error("You are not a player in this game")]
    NotPlayer,
    /// The acting user is dead.
    #[error("You are no longer alive in this game")]
    NotAlive,
    /// The named target is not a player in the game.
    #[error("Target {username} is not in the game")]
    TargetNotInGame {
        /// The target that failed to resolve.
        username: String,
    },
    /// The named target is already dead.
    #[error("Target {username} is not alive")]
    TargetNotAlive {
        /// The dead target.
        username: String,
    },
    /// The game has not been started.
    #[error("Game not started. Try `!start`")]
    NotStarted,
    /// The action is not allowed in the current phase.
    #[error("That action cannot be taken during the {phase} phase")]
    WrongPhase {
        /// The phase the game is currently in.
        phase: Phase,
    },
    /// The command was malformed or missing arguments.
    #[error("{0}")]
    InvalidInput(String),
    /// An entity operation rejected the mutation.
    #[error(transparent)]
    Game(#[from] GameError),
    /// The persistence layer failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The host transport failed while the handler still needed it.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<DaoError> for CommandError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NoGame => CommandError::NoGame,
            DaoError::GameExists => CommandError::GameExists,
            DaoError::Storage(source) => CommandError::Storage(source),
        }
    }
}
