//! Interned identifiers for nodes and connections.
//!
//! Both id types are a `Spur` into one global interner: 4 bytes, `Copy`,
//! O(1) `Eq`/`Hash`, and resolvable back to the original string for the
//! JS bridge and for log output.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

static COUNTER: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a process-unique id of the form `<prefix>_<n>`.
            pub fn fresh() -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{}_{n}", $prefix))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a node on the canvas.
    NodeId,
    "node"
);

interned_id!(
    /// Identifier of a connection between two nodes.
    ConnectionId,
    "conn"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("source");
        let b = NodeId::intern("source");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "source");
        assert_eq!(a.to_string(), "source");
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        let c = ConnectionId::fresh();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node_"));
        assert!(c.as_str().starts_with("conn_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ConnectionId::intern("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
        let back: ConnectionId = serde_json::from_str("\"c1\"").unwrap();
        assert_eq!(back, id);
    }
}
