//! Device directory domain.
//!
//! Typed access to the clients, object types and instances registered with a
//! device server. The [`DeviceDirectoryClient`] facade wraps a caller-supplied
//! [`DeviceServerSession`] and turns its raw documents into records, with one
//! uniform error channel ([`DirectoryError`]).
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a session must provide; transport crates (such as
//! `device-server`) define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ClientName`, `ObjectTypeId`, `InstanceId`, ...) |
//! | [`types`] | Records and hypermedia (`Client`, `ObjectType`, `Instance`, `Links`, ...) |
//! | [`errors`] | `DirectoryError` and `RetryPolicy` |
//! | [`session`] | The `DeviceServerSession` port |
//! | [`client`] | The `DeviceDirectoryClient` facade |
//! | [`power`] | Power Control payload helper |

pub mod client;
pub mod errors;
pub mod identifiers;
pub mod power;
pub mod session;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::DeviceDirectoryClient;
pub use errors::{DirectoryError, RetryPolicy};
pub use identifiers::{ClientName, Href, InstanceId, InvocationId, ObjectTypeId};
pub use power::{power_control_object_type, PowerState, POWER_CONTROL_OBJECT_TYPE};
pub use session::DeviceServerSession;
pub use types::{
    rel, Client, CollectionPage, Instance, InstanceData, Link, Links, ObjectType, PageInfo,
};
