//! Newtype domain identifiers.
//!
//! Every concept the device directory addresses by identity is a distinct
//! newtype wrapping a primitive. This prevents accidentally passing a
//! [`ClientName`] where an [`ObjectTypeId`] is expected even though both are
//! strings on the wire.

use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::DirectoryError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, FromStr.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DirectoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s).ok_or_else(|| DirectoryError::InvalidArgument {
                    message: concat!(stringify!($name), " must not be empty").to_string(),
                })
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (server-assigned names and addresses)
// ---------------------------------------------------------------------------

string_id! {
    /// Name under which a device or application registered with the device
    /// server (e.g. `"app1"`).
    ClientName
}

string_id! {
    /// Identifies a category of manageable object exposed by a client.
    ///
    /// Usually the numeric LWM2M/IPSO object id rendered as text, e.g. `"3312"`
    /// for Power Control.
    ObjectTypeId
}

string_id! {
    /// A hypermedia reference as returned in a [`crate::Link`].
    ///
    /// May be absolute or relative to the device server base URL; resolving
    /// it is the session's job.
    Href
}

// ---------------------------------------------------------------------------
// Identifiers — integer-backed
// ---------------------------------------------------------------------------

/// Identifies one instance of an object type on a client.
///
/// The device server renders instance ids either as JSON numbers or as
/// numeric strings; both decode to the same value. Serialisation always
/// produces a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| DirectoryError::InvalidArgument {
                message: format!("instance id `{s}` is not a non-negative integer"),
            })
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(n) => Ok(Self(n)),
            Wire::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single invocation of a directory front end (one CLI run).
///
/// Propagated through the root span so all requests issued by one run can be
/// correlated in the trace backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
