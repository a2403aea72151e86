//! Anti-nuke engine: attributes channel and role deletions to whoever
//! performed them, bans actors who delete too much too fast, and rebuilds the
//! guild from its last snapshot.

pub mod capture;
pub mod clock;
pub mod correlator;
pub mod counter;
pub mod engine;
pub mod gateway;
pub mod restore;
pub mod serenity_gateway;
pub mod store;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use clock::{Clock, SystemClock};
pub use counter::{CounterStore, InMemoryCounterStore, RedisCounterStore};
pub use engine::{AntiNuke, DeletionOutcome};
pub use gateway::{DeletionKind, GuildGateway};
pub use serenity_gateway::SerenityGateway;
