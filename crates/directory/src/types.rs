//! Value types for the device directory.
//!
//! The directory is hypermedia-driven: every record carries the [`Links`] the
//! server handed out with it, and operations navigate those links instead of
//! composing URLs. A record built without the link an operation needs is
//! therefore not a valid argument for that operation.
//!
//! Serde attributes describe the device server's JSON documents
//! (PascalCase field names, `Items`/`PageInfo`/`Links` envelopes).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ClientName, DirectoryError, Href, InstanceId, ObjectTypeId};

/// Link relation names used by the device server.
pub mod rel {
    /// Entry point → client collection.
    pub const CLIENTS: &str = "clients";
    /// Client → object type collection.
    pub const OBJECT_TYPES: &str = "objecttypes";
    /// Object type → instance collection.
    pub const INSTANCES: &str = "instances";
    /// Collection page → following page.
    pub const NEXT: &str = "next";
    /// Entry point → token endpoint.
    pub const AUTHENTICATE: &str = "authenticate";
    /// Any resource → itself.
    pub const SELF: &str = "self";
}

// ---------------------------------------------------------------------------
// Hypermedia
// ---------------------------------------------------------------------------

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name, e.g. `"objecttypes"`.
    pub rel: String,
    /// Target of the link.
    pub href: Href,
    /// Advertised media type of the target, when the server supplies one.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    /// Creates a link without a media type.
    pub fn new(rel: impl Into<String>, href: Href) -> Self {
        Self {
            rel: rel.into(),
            href,
            media_type: None,
        }
    }
}

/// Ordered list of links attached to a document or record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(Vec<Link>);

impl Links {
    /// Wraps a list of links, preserving order.
    pub fn new(links: Vec<Link>) -> Self {
        Self(links)
    }

    /// Returns the first link with relation `rel` (ASCII case-insensitive).
    pub fn find(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|l| l.rel.eq_ignore_ascii_case(rel))
    }

    /// Returns the href of the first link with relation `rel`.
    pub fn href(&self, rel: &str) -> Option<&Href> {
        self.find(rel).map(|l| &l.href)
    }

    /// Iterates over the links in server order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no links.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Link> for Links {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Paging metadata attached to a collection page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageInfo {
    /// Number of items in the whole collection.
    #[serde(default)]
    pub total_count: u64,
    /// Number of items on this page.
    #[serde(default)]
    pub items_count: u64,
    /// Zero-based index of the first item on this page.
    #[serde(default)]
    pub start_index: u64,
}

/// One page of a collection document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct CollectionPage<T> {
    /// Paging metadata, absent on unpaged collections.
    #[serde(default)]
    pub page_info: Option<PageInfo>,
    /// Records on this page, in server order.
    #[serde(default)]
    pub items: Vec<T>,
    /// Collection-level links (`next`, `self`, ...).
    #[serde(default)]
    pub links: Links,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A device or application registered with the device server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Client {
    name: ClientName,
    #[serde(default)]
    links: Links,
}

impl Client {
    /// Builds a client record. Listing calls produce these; constructing one
    /// by hand is only useful for sessions that hand out the same links.
    pub fn new(name: ClientName, links: Links) -> Self {
        Self { name, links }
    }

    /// Registered name of the client.
    pub fn name(&self) -> &ClientName {
        &self.name
    }

    /// Links the server attached to this client.
    pub fn links(&self) -> &Links {
        &self.links
    }
}

/// A category of manageable object exposed by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    #[serde(rename = "ObjectTypeID")]
    id: ObjectTypeId,
    #[serde(rename = "Links", default)]
    links: Links,
}

impl ObjectType {
    /// Builds an object type record.
    pub fn new(id: ObjectTypeId, links: Links) -> Self {
        Self { id, links }
    }

    /// Object type identifier, e.g. `"3312"`.
    pub fn id(&self) -> &ObjectTypeId {
        &self.id
    }

    /// Links the server attached to this object type.
    pub fn links(&self) -> &Links {
        &self.links
    }
}

/// Opaque payload of an [`Instance`].
///
/// The directory never inspects or re-encodes these bytes: what a write sends
/// is what the server stored. [`InstanceData::to_json`] is a convenience for
/// payloads that happen to be JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstanceData(Vec<u8>);

impl InstanceData {
    /// Wraps raw payload bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Encodes a JSON value as payload bytes.
    pub fn from_json(value: &Value) -> Self {
        Self(value.to_string().into_bytes())
    }

    /// Decodes the payload as JSON.
    pub fn to_json(&self) -> Result<Value, DirectoryError> {
        serde_json::from_slice(&self.0)
            .map_err(|e| DirectoryError::protocol(format!("instance payload is not JSON: {e}")))
    }

    /// Payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the payload, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for InstanceData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for InstanceData {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// One concrete object of an [`ObjectType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    id: InstanceId,
    data: InstanceData,
    links: Links,
}

impl Instance {
    /// Builds an instance record.
    pub fn new(id: InstanceId, data: InstanceData, links: Links) -> Self {
        Self { id, data, links }
    }

    /// Instance identifier, unique within its object type.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Payload carried by the instance.
    pub fn data(&self) -> &InstanceData {
        &self.data
    }

    /// Links the server attached to this instance.
    pub fn links(&self) -> &Links {
        &self.links
    }
}

/// Item of an instance collection. Resource fields the server inlines are
/// ignored; the payload is read from the instance itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct InstanceEntry {
    #[serde(rename = "InstanceID")]
    pub(crate) id: InstanceId,
    #[serde(rename = "Links", default)]
    pub(crate) links: Links,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn href(s: &str) -> Href {
        Href::new(s).unwrap()
    }

    #[test]
    fn link_lookup_ignores_case_and_keeps_first_match() {
        let links = Links::new(vec![
            Link::new("self", href("/clients/1")),
            Link::new("ObjectTypes", href("/clients/1/objecttypes")),
            Link::new("objecttypes", href("/other")),
        ]);
        assert_eq!(
            links.href(rel::OBJECT_TYPES).map(Href::as_str),
            Some("/clients/1/objecttypes")
        );
        assert!(links.find(rel::INSTANCES).is_none());
    }

    #[test]
    fn client_page_decodes_from_server_document() {
        let doc = json!({
            "PageInfo": { "TotalCount": 1, "ItemsCount": 1, "StartIndex": 0 },
            "Items": [{
                "Name": "app1",
                "Links": [
                    { "rel": "self", "href": "/clients/0" },
                    { "rel": "objecttypes", "href": "/clients/0/objecttypes",
                      "type": "application/vnd.imgtec.com.objecttypes+json" }
                ]
            }],
            "Links": []
        });

        let page: CollectionPage<Client> = serde_json::from_value(doc).unwrap();
        assert_eq!(page.page_info.unwrap().total_count, 1);
        let client = &page.items[0];
        assert_eq!(client.name().as_str(), "app1");
        let link = client.links().find(rel::OBJECT_TYPES).unwrap();
        assert_eq!(
            link.media_type.as_deref(),
            Some("application/vnd.imgtec.com.objecttypes+json")
        );
    }

    #[test]
    fn instance_entries_ignore_inlined_resources() {
        let doc = json!({
            "Items": [{
                "InstanceID": "1",
                "OnOff": true,
                "Links": [{ "rel": "self", "href": "/i/1" }]
            }]
        });

        let page: CollectionPage<InstanceEntry> = serde_json::from_value(doc).unwrap();
        assert_eq!(page.items[0].id, InstanceId::new(1));
        assert_eq!(page.items[0].links.len(), 1);
        assert!(page.links.is_empty());
    }

    #[test]
    fn object_type_without_links_still_decodes() {
        let ot: ObjectType = serde_json::from_value(json!({ "ObjectTypeID": "3312" })).unwrap();
        assert_eq!(ot.id().as_str(), "3312");
        assert!(ot.links().is_empty());
    }

    #[test]
    fn non_json_payload_is_a_protocol_error() {
        let data = InstanceData::new(vec![0x01]);
        assert!(matches!(
            data.to_json(),
            Err(DirectoryError::Protocol { .. })
        ));
    }
}
