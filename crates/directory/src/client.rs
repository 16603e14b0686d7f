//! The [`DeviceDirectoryClient`] facade.
//!
//! Wraps a [`DeviceServerSession`] and exposes the four directory operations
//! plus lookup helpers built on them. Every operation is a fresh round trip
//! through the session: nothing is cached and no state is kept between calls.
//! Failures are returned, never retried.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::types::{rel, InstanceEntry};
use crate::{
    Client, ClientName, CollectionPage, DeviceServerSession, DirectoryError, Href, Instance,
    InstanceData, InstanceId, ObjectType, ObjectTypeId,
};

/// Typed access to the clients, object types and instances of a device
/// server, over a caller-supplied session.
///
/// The session is held by value. Pass `&session` or an `Arc` to keep
/// ownership on the caller's side.
#[derive(Debug, Clone)]
pub struct DeviceDirectoryClient<S> {
    session: S,
}

impl<S> DeviceDirectoryClient<S>
where
    S: DeviceServerSession,
{
    /// Wraps `session`.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Returns the wrapped session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Unwraps the facade, returning the session.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Lists the clients connected to the device server, in server order.
    ///
    /// Each returned [`Client`] is a valid argument to
    /// [`list_object_types`](Self::list_object_types).
    #[instrument(skip(self))]
    pub async fn list_clients(&self) -> Result<Vec<Client>, DirectoryError> {
        let entry = self.session.entry_point().await?;
        let href = entry.href(rel::CLIENTS).ok_or_else(|| {
            DirectoryError::protocol(format!(
                "entry point advertises no `{}` link",
                rel::CLIENTS
            ))
        })?;
        self.fetch_all(href).await
    }

    /// Lists the object types exposed by `client`.
    ///
    /// `client` must come from [`list_clients`](Self::list_clients); one
    /// without an object-type link fails with
    /// [`DirectoryError::InvalidArgument`] before any request is made.
    #[instrument(skip(self, client), fields(client = %client.name()))]
    pub async fn list_object_types(
        &self,
        client: &Client,
    ) -> Result<Vec<ObjectType>, DirectoryError> {
        let href = client.links().href(rel::OBJECT_TYPES).ok_or_else(|| {
            DirectoryError::invalid_argument(format!(
                "client `{}` has no `{}` link; use a client returned by list_clients",
                client.name(),
                rel::OBJECT_TYPES
            ))
        })?;
        self.fetch_all(href).await
    }

    /// Lists the instances of `object_type`, each with its payload.
    ///
    /// `object_type` must come from
    /// [`list_object_types`](Self::list_object_types). Payloads are read from
    /// the same address [`write_instance_data`](Self::write_instance_data)
    /// writes to and are returned byte for byte.
    #[instrument(skip(self, object_type), fields(object_type = %object_type.id()))]
    pub async fn list_instances(
        &self,
        object_type: &ObjectType,
    ) -> Result<Vec<Instance>, DirectoryError> {
        let collection = instances_href(object_type)?;
        let entries: Vec<InstanceEntry> = self.fetch_all(collection).await?;

        let mut instances = Vec::with_capacity(entries.len());
        for entry in entries {
            let href = instance_href(collection, entry.id)?;
            let data = self.session.get_raw(&href).await?;
            instances.push(Instance::new(entry.id, InstanceData::new(data), entry.links));
        }
        Ok(instances)
    }

    /// Writes `data` to instance `instance_id` of `object_type`.
    ///
    /// `None` writes an empty payload. `Ok(())` means the server acknowledged
    /// the write; [`DirectoryError::NotFound`] means it has no such instance,
    /// in which case nothing was changed.
    #[instrument(
        skip(self, data, object_type),
        fields(
            object_type = %object_type.id(),
            instance = %instance_id,
            bytes = data.map_or(0, <[u8]>::len),
        )
    )]
    pub async fn write_instance_data(
        &self,
        data: Option<&[u8]>,
        object_type: &ObjectType,
        instance_id: InstanceId,
    ) -> Result<(), DirectoryError> {
        let href = instance_href(instances_href(object_type)?, instance_id)?;

        match self.session.put(&href, data).await {
            Ok(()) => {
                debug!(href = %href, "instance data written");
                Ok(())
            }
            Err(DirectoryError::NotFound { .. }) => Err(DirectoryError::not_found(
                "instance",
                format!("{}/{}", object_type.id(), instance_id),
            )),
            Err(e) => Err(e),
        }
    }

    /// Returns the listed client named `name`.
    pub async fn find_client(&self, name: &ClientName) -> Result<Client, DirectoryError> {
        self.list_clients()
            .await?
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| DirectoryError::not_found("client", name))
    }

    /// Returns the object type `id` exposed by `client`.
    pub async fn find_object_type(
        &self,
        client: &Client,
        id: &ObjectTypeId,
    ) -> Result<ObjectType, DirectoryError> {
        self.list_object_types(client)
            .await?
            .into_iter()
            .find(|ot| ot.id() == id)
            .ok_or_else(|| {
                DirectoryError::not_found("object type", format!("{}/{}", client.name(), id))
            })
    }

    /// Returns instance `id` of `object_type`.
    pub async fn find_instance(
        &self,
        object_type: &ObjectType,
        id: InstanceId,
    ) -> Result<Instance, DirectoryError> {
        self.list_instances(object_type)
            .await?
            .into_iter()
            .find(|i| i.id() == id)
            .ok_or_else(|| {
                DirectoryError::not_found("instance", format!("{}/{}", object_type.id(), id))
            })
    }

    /// Fetches a collection starting at `first`, following `next` links until
    /// the last page, and concatenates the items in server order.
    async fn fetch_all<T>(&self, first: &Href) -> Result<Vec<T>, DirectoryError>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first.clone());

        while let Some(href) = next.take() {
            if !visited.insert(href.clone()) {
                return Err(DirectoryError::protocol(format!(
                    "collection paging loops back to {href}"
                )));
            }

            let doc = self.session.get(&href).await?;
            let page: CollectionPage<T> = serde_json::from_value(doc).map_err(|e| {
                DirectoryError::protocol(format!("malformed collection at {href}: {e}"))
            })?;

            debug!(
                href = %href,
                items = page.items.len(),
                total = page.page_info.map(|p| p.total_count),
                "fetched collection page"
            );

            items.extend(page.items);
            next = page.links.href(rel::NEXT).cloned();
        }

        Ok(items)
    }
}

fn instances_href(object_type: &ObjectType) -> Result<&Href, DirectoryError> {
    object_type.links().href(rel::INSTANCES).ok_or_else(|| {
        DirectoryError::invalid_argument(format!(
            "object type `{}` has no `{}` link; use an object type returned by list_object_types",
            object_type.id(),
            rel::INSTANCES
        ))
    })
}

fn instance_href(instances: &Href, id: InstanceId) -> Result<Href, DirectoryError> {
    let base = instances.as_str().trim_end_matches('/');
    Href::new(format!("{base}/{id}"))
        .ok_or_else(|| DirectoryError::protocol("empty instance collection href"))
}
