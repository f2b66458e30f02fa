//! Identifiers for agents and tree nodes.
//!
//! Both are plain `u32` newtypes: cheap to copy, hashable, and ordered so
//! they sort into registration or arena order.

use std::fmt;

macro_rules! id_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the owning `Vec`.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

id_type! {
    /// Spawn-order identifier of an agent.  Never reused after removal, so a
    /// stale timer or queued request can never reach a newer agent.
    AgentId
}

id_type! {
    /// Index of a node inside one `DecisionTree` arena.
    NodeId
}
