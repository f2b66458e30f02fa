//! `ar-core`: foundational types for the `arbiter` agent framework.
//!
//! This crate is a dependency of every other `ar-*` crate.  It has no `ar-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `NodeId`                                       |
//! | [`time`]   | `SimTime`, `SimClock`, `SimConfig`                        |
//! | [`timer`]  | `TimerQueue<E>`: deadline-ordered scheduled events        |
//! | [`rng`]    | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`token`]  | `TokenStatus`: per-agent token lifecycle state            |
//! | [`error`]  | `ArError`, `ArResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time and config.    |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod timer;
pub mod token;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{ArError, ArResult};
pub use ids::{AgentId, NodeId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, SimTime, secs};
pub use timer::TimerQueue;
pub use token::TokenStatus;
