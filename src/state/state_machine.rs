//! Pure transition table for the game lifecycle.

use std::fmt;

use thiserror::Error;

use crate::dao::models::{GameStatus, Phase};

/// Lifecycle position of a game: status plus the day/phase counters that only
/// have meaning while the game is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current day number.
    pub day: u32,
    /// Current phase.
    pub phase: Phase,
}

impl LifecycleState {
    /// Lifecycle position of a freshly created game.
    pub fn prep() -> Self {
        Self {
            status: GameStatus::Prep,
            day: 0,
            phase: Phase::Day,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            GameStatus::Running => write!(f, "running ({} {})", self.phase, self.day),
            status => write!(f, "{status}"),
        }
    }
}

/// Events that can be applied to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Close signups and begin day 1.
    Start,
    /// Toggle day and night, wrapping from night into the next day.
    NextPhase,
    /// Jump to the next day's day phase.
    NewDay,
    /// End the game. Terminal.
    Finish,
}

/// Error returned when an event cannot be applied from the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {event:?} while the game is {from}")]
pub struct InvalidTransition {
    /// Position the lifecycle was in when the invalid event arrived.
    pub from: LifecycleState,
    /// The event that cannot be applied from this position.
    pub event: LifecycleEvent,
}

/// Compute the next lifecycle position, or reject the event. Status moves only
/// forward: `prep → running → finished`, with the day/night cycle internal to
/// `running`.
pub fn advance(
    from: LifecycleState,
    event: LifecycleEvent,
) -> Result<LifecycleState, InvalidTransition> {
    let next = match (from.status, from.phase, event) {
        (GameStatus::Prep, _, LifecycleEvent::Start) => LifecycleState {
            status: GameStatus::Running,
            day: 1,
            phase: Phase::Day,
        },
        (GameStatus::Running, Phase::Day, LifecycleEvent::NextPhase) => LifecycleState {
            phase: Phase::Night,
            ..from
        },
        (GameStatus::Running, Phase::Night, LifecycleEvent::NextPhase) => LifecycleState {
            day: from.day + 1,
            phase: Phase::Day,
            ..from
        },
        (GameStatus::Running, _, LifecycleEvent::NewDay) => LifecycleState {
            day: from.day + 1,
            phase: Phase::Day,
            ..from
        },
        (GameStatus::Running, _, LifecycleEvent::Finish) => LifecycleState {
            status: GameStatus::Finished,
            ..from
        },
        _ => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}
