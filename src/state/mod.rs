//! Game state: the lifecycle state machine, the aggregate handle, and the
//! action ledger.

pub mod game;
pub mod ledger;
pub mod state_machine;
