//! `ar-token`: arbitration of a small pool of exclusive privilege tokens.
//!
//! Agents ask for a token when they could use one.  The scheduler grants free
//! tokens immediately, queues requests otherwise, and whenever a token comes
//! back into circulation hands it to the highest-priority queued requester.
//! Returning a token starts two cooldowns: the slot rejoins the pool after
//! the scheduler's delay, and the agent may ask again after its own.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`scheduler`] | `TokenScheduler`, `RequestOutcome`                           |
//! | [`client`]    | `TokenClient`, `TokenRoster`, `PriorityInputs`               |
//! | [`priority`]  | the grant-priority function                                  |
//! | [`config`]    | `TokenConfig`, `PriorityWeights`                             |
//! | [`error`]     | `TokenError`, `TokenResult<T>`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                 |
//! |---------|--------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on `TokenConfig` and weights |

pub mod client;
pub mod config;
pub mod error;
pub mod priority;
pub mod scheduler;


pub use client::{PriorityInputs, TokenClient, TokenRoster};
pub use config::{PriorityWeights, TokenConfig};
pub use error::{TokenError, TokenResult};
pub use priority::{attention_term, priority};
pub use scheduler::{RequestOutcome, TokenScheduler};
