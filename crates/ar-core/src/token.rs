//! Per-agent token lifecycle state.

use std::fmt;

/// Where an agent sits in the token cycle:
///
/// ```text
/// None ──request──▶ Requested ──grant──▶ Held ──return──▶ Cooldown ──expiry──▶ None
///   └───────────── grant (token free at request time) ──────▶ Held
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenStatus {
    #[default]
    None,
    Requested,
    Held,
    Cooldown,
}

impl TokenStatus {
    /// `true` while the agent may not issue a new request.
    #[inline]
    pub fn blocks_request(self) -> bool {
        !matches!(self, TokenStatus::None)
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenStatus::None      => "none",
            TokenStatus::Requested => "requested",
            TokenStatus::Held      => "held",
            TokenStatus::Cooldown  => "cooldown",
        };
        f.write_str(s)
    }
}
