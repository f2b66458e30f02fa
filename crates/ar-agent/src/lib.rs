//! `ar-agent`: agents that run a main decision tree every tick and switch
//! into a token tree whenever the scheduler grants them a token.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`agent`]     | `Agent`, `ActiveBehavior`, `TreeSlot`; the tick protocol  |
//! | [`builder`]   | `AgentBuilder`                                            |
//! | [`config`]    | `AgentConfig`                                             |
//! | [`observer`]  | `AgentObserver`, `SubscriptionId`                         |
//! | [`attention`] | `AttentionSignal` collaborator                            |
//! | [`error`]     | `AgentError`, `AgentResult<T>`                            |
//!
//! An `Agent` implements [`ar_token::TokenClient`], so it hands itself to the
//! scheduler when requesting or returning a token and receives grants as
//! callbacks.

pub mod agent;
pub mod attention;
pub mod builder;
pub mod config;
pub mod error;
pub mod observer;


pub use agent::{ActiveBehavior, Agent, TreeSlot};
pub use attention::AttentionSignal;
pub use builder::AgentBuilder;
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use observer::{AgentObserver, SubscriptionId};
