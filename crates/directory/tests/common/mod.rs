#![allow(dead_code)]

//! In-memory device server used by the directory integration tests.
//!
//! Serves the same document shapes as the real device server under
//! `/clients/{name}/objecttypes/{id}/instances/{instance}`, stores instance
//! payloads as the bytes they were written with, and records every request so
//! tests can assert on I/O.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use directory::{DeviceServerSession, DirectoryError, Href, Link, Links};
use serde_json::{json, Value};

#[derive(Default)]
struct ObjectTypeState {
    id: String,
    instances: BTreeMap<u64, Vec<u8>>,
}

#[derive(Default)]
struct ClientState {
    name: String,
    object_types: Vec<ObjectTypeState>,
}

/// Fake session backed by an in-memory client tree.
#[derive(Default)]
pub struct InMemoryDeviceServer {
    clients: Mutex<Vec<ClientState>>,
    page_size: Option<usize>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryDeviceServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves collections in pages of `size` items linked by `next`.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_client(self, name: &str) -> Self {
        self.client_mut(name, |_| ());
        self
    }

    pub fn with_object_type(self, client: &str, object_type: &str) -> Self {
        self.client_mut(client, |c| {
            object_type_mut(c, object_type);
        });
        self
    }

    pub fn with_instance(self, client: &str, object_type: &str, id: u64, payload: &[u8]) -> Self {
        self.client_mut(client, |c| {
            object_type_mut(c, object_type)
                .instances
                .insert(id, payload.to_vec());
        });
        self
    }

    /// Stored payload of an instance, bypassing the request log.
    pub fn payload(&self, client: &str, object_type: &str, id: u64) -> Option<Vec<u8>> {
        let clients = self.clients.lock().unwrap();
        clients
            .iter()
            .find(|c| c.name == client)
            .and_then(|c| c.object_types.iter().find(|o| o.id == object_type))
            .and_then(|o| o.instances.get(&id).cloned())
    }

    /// Requests seen so far, formatted as `"GET /path"` / `"PUT /path"`.
    /// Raw payload reads are logged as `GET` too.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn client_mut(&self, name: &str, f: impl FnOnce(&mut ClientState)) {
        let mut clients = self.clients.lock().unwrap();
        let idx = match clients.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                clients.push(ClientState {
                    name: name.to_string(),
                    ..Default::default()
                });
                clients.len() - 1
            }
        };
        f(&mut clients[idx]);
    }

    fn record(&self, method: &str, href: &Href) {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{method} {}", href.as_str()));
    }

    fn page(&self, path: &str, start: usize, items: Vec<Value>) -> Value {
        let total = items.len();
        let (items, next) = match self.page_size {
            Some(size) if start + size < items.len() => (
                items[start..start + size].to_vec(),
                Some(format!("{path}?start={}", start + size)),
            ),
            Some(_) => (items.get(start..).map(<[Value]>::to_vec).unwrap_or_default(), None),
            None => (items, None),
        };

        let mut links = vec![link("self", path)];
        if let Some(next) = next {
            links.push(link("next", &next));
        }

        json!({
            "PageInfo": { "TotalCount": total, "ItemsCount": items.len(), "StartIndex": start },
            "Items": items,
            "Links": links,
        })
    }
}

fn object_type_mut<'a>(client: &'a mut ClientState, id: &str) -> &'a mut ObjectTypeState {
    let idx = match client.object_types.iter().position(|ot| ot.id == id) {
        Some(idx) => idx,
        None => {
            client.object_types.push(ObjectTypeState {
                id: id.to_string(),
                ..Default::default()
            });
            client.object_types.len() - 1
        }
    };
    &mut client.object_types[idx]
}

fn link(rel: &str, href: &str) -> Value {
    json!({ "rel": rel, "href": href })
}

fn split(href: &Href) -> (Vec<String>, usize) {
    let (path, query) = match href.as_str().split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (href.as_str(), None),
    };
    let start = query
        .and_then(|q| q.strip_prefix("start="))
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (segments, start)
}

/// Splits `/clients/{name}/objecttypes/{ot}/instances/{id}`.
fn instance_address(href: &Href) -> Result<(String, String, u64), DirectoryError> {
    let (segments, _) = split(href);
    match segments.as_slice() {
        [clients, name, objecttypes, ot, instances, id]
            if clients == "clients" && objecttypes == "objecttypes" && instances == "instances" =>
        {
            let id = id.parse().map_err(|_| not_found(href))?;
            Ok((name.clone(), ot.clone(), id))
        }
        _ => Err(not_found(href)),
    }
}

fn not_found(href: &Href) -> DirectoryError {
    DirectoryError::not_found("resource", href)
}

#[async_trait]
impl DeviceServerSession for InMemoryDeviceServer {
    async fn entry_point(&self) -> Result<Links, DirectoryError> {
        Ok(Links::new(vec![Link::new(
            "clients",
            Href::new("/clients").unwrap(),
        )]))
    }

    async fn get(&self, href: &Href) -> Result<Value, DirectoryError> {
        self.record("GET", href);
        let (segments, start) = split(href);
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let clients = self.clients.lock().unwrap();

        match segments.as_slice() {
            ["clients"] => {
                let items = clients
                    .iter()
                    .map(|c| {
                        json!({
                            "Name": c.name,
                            "Links": [
                                link("self", &format!("/clients/{}", c.name)),
                                link("objecttypes", &format!("/clients/{}/objecttypes", c.name)),
                            ],
                        })
                    })
                    .collect();
                Ok(self.page("/clients", start, items))
            }
            ["clients", name, "objecttypes"] => {
                let client = clients
                    .iter()
                    .find(|c| c.name == *name)
                    .ok_or_else(|| not_found(href))?;
                let items = client
                    .object_types
                    .iter()
                    .map(|ot| {
                        let base = format!("/clients/{}/objecttypes/{}", client.name, ot.id);
                        json!({
                            "ObjectTypeID": ot.id,
                            "Links": [
                                link("self", &base),
                                link("instances", &format!("{base}/instances")),
                            ],
                        })
                    })
                    .collect();
                Ok(self.page(&format!("/clients/{name}/objecttypes"), start, items))
            }
            ["clients", name, "objecttypes", ot, "instances"] => {
                let object_type = clients
                    .iter()
                    .find(|c| c.name == *name)
                    .and_then(|c| c.object_types.iter().find(|o| o.id == *ot))
                    .ok_or_else(|| not_found(href))?;
                let base = format!("/clients/{name}/objecttypes/{ot}/instances");
                let items = object_type
                    .instances
                    .keys()
                    .map(|id| {
                        json!({
                            "InstanceID": id.to_string(),
                            "Links": [link("self", &format!("{base}/{id}"))],
                        })
                    })
                    .collect();
                Ok(self.page(&base, start, items))
            }
            _ => Err(not_found(href)),
        }
    }

    async fn get_raw(&self, href: &Href) -> Result<Vec<u8>, DirectoryError> {
        self.record("GET", href);
        let (name, ot, id) = instance_address(href)?;

        let clients = self.clients.lock().unwrap();
        clients
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.object_types.iter().find(|o| o.id == ot))
            .and_then(|o| o.instances.get(&id).cloned())
            .ok_or_else(|| not_found(href))
    }

    async fn put(&self, href: &Href, body: Option<&[u8]>) -> Result<(), DirectoryError> {
        self.record("PUT", href);
        let (name, ot, id) = instance_address(href)?;

        let mut clients = self.clients.lock().unwrap();
        let slot = clients
            .iter_mut()
            .find(|c| c.name == name)
            .and_then(|c| c.object_types.iter_mut().find(|o| o.id == ot))
            .and_then(|o| o.instances.get_mut(&id))
            .ok_or_else(|| not_found(href))?;
        *slot = body.map(<[u8]>::to_vec).unwrap_or_default();
        Ok(())
    }
}
