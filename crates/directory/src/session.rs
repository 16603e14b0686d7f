//! The [`DeviceServerSession`] port.
//!
//! A session is an authenticated connection to a device server. The
//! directory borrows one as an opaque capability: it asks for the entry-point
//! links, reads documents, reads and writes instance payloads through it, and
//! never creates or tears it down. Transport, authentication, token lifetime
//! and payload encoding are the implementor's business.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{DirectoryError, Href, Links};

/// Authenticated access to a device server.
///
/// Implementations must be safe to call from several tasks at once; the
/// directory adds no locking of its own.
#[async_trait]
pub trait DeviceServerSession: Send + Sync {
    /// Returns the links advertised by the server's entry-point document.
    async fn entry_point(&self) -> Result<Links, DirectoryError>;

    /// Fetches the JSON document at `href`.
    async fn get(&self, href: &Href) -> Result<Value, DirectoryError>;

    /// Fetches the body at `href` without decoding it.
    ///
    /// Used for instance payloads: the bytes a [`put`](Self::put) stored must
    /// come back unchanged.
    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError>;

    /// Replaces the resource at `href` with `body`.
    ///
    /// `None` is sent as an empty body.
    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError>;
}

#[async_trait]
impl<'a, T> DeviceServerSession for &'a T
where
    T: DeviceServerSession + ?Sized,
{
    async fn entry_point(&self) -> Result<Links, DirectoryError> {
        (**self).entry_point().await
    }

    async fn get(&self, href: &Href) -> Result<Value, DirectoryError> {
        (**self).get(href).await
    }

    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError> {
        (**self).get_raw(href).await
    }

    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError> {
        (**self).put(href, body).await
    }
}

#[async_trait]
impl<T> DeviceServerSession for Arc<T>
where
    T: DeviceServerSession + ?Sized,
{
    async fn entry_point(&self) -> Result<Links, DirectoryError> {
        (**self).entry_point().await
    }

    async fn get(&self, href: &Href) -> Result<Value, DirectoryError> {
        (**self).get(href).await
    }

    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError> {
        (**self).get_raw(href).await
    }

    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError> {
        (**self).put(href, body).await
    }
}

#[async_trait]
impl<T> DeviceServerSession for Box<T>
where
    T: DeviceServerSession + ?Sized,
{
    async fn entry_point(&self) -> Result<Links, DirectoryError> {
        (**self).entry_point().await
    }

    async fn get(&self, href: &Href) -> Result<Value, DirectoryError> {
        (**self).get(href).await
    }

    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError> {
        (**self).get_raw(href).await
    }

    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError> {
        (**self).put(href, body).await
    }
}
