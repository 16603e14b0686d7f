//! Device server session adapter.
//!
//! Implements the [`directory::DeviceServerSession`] port over the device
//! server's REST API: JSON documents navigated through hypermedia links,
//! authenticated with OAuth bearer tokens.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, token acquisition and renewal, URL
//! resolution and status-code mapping all live here. The [`directory`] crate
//! sees only [`directory::DeviceServerSession`].
//!
//! ## Authentication
//!
//! [`HttpSession::connect`] reads the entry-point document, follows its
//! `authenticate` link (falling back to `oauth/token`) and exchanges the
//! access key and secret for a token with the OAuth password grant. Tokens
//! close to expiry are renewed with the refresh grant before the next request.
//!
//! ## Error Mapping
//!
//! | Condition | [`directory::DirectoryError`] |
//! |-----------|-------------------------------|
//! | connect failure, timeout, broken body | `Transport` |
//! | 401 / 403 | `Authentication` |
//! | 404 | `NotFound` |
//! | 400 / 422 | `InvalidArgument` |
//! | any other non-2xx, undecodable JSON | `Protocol` |
//!
//! No request is ever retried here.

mod auth;
pub mod config;
mod error_mapping;
pub mod session;

pub use config::SessionConfig;
pub use session::HttpSession;
