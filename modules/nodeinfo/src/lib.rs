//! NodeInfo discovery and schema documents.
//!
//! Two documents are involved: the well-known index (`/.well-known/nodeinfo`)
//! listing versioned schema links, and the schema document itself.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Relation prefix accepted when picking a schema link. Any 2.x minor version matches.
pub const DEFAULT_SCHEMA_PREFIX: &str = "http://nodeinfo.diaspora.software/ns/schema/2.";

#[derive(Debug, Error)]
#[error("invalid nodeinfo document: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoList {
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rel: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub href: String,
}

// `null` reads as an empty string so one malformed link does not sink the whole list.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl NodeInfoList {
    /// First link (in document order) whose `rel` starts with `prefix`.
    /// A matching link with an empty `href` yields `None`; later links are not consulted.
    pub fn schema_link(&self, prefix: &str) -> Option<&str> {
        let link = self.links.iter().find(|l| l.rel.starts_with(prefix))?;
        if link.href.is_empty() { None } else { Some(link.href.as_str()) }
    }
}

/// Decoded schema document.
///
/// Optional fields stay `None` when absent; they are never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub software: Software,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<String>>,
    pub open_registrations: bool,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub users: Users,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_posts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_comments: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Users {
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_halfyear: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_month: Option<u64>,
}

pub fn decode_list(bytes: &[u8]) -> Result<NodeInfoList, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn decode_schema(bytes: &[u8]) -> Result<NodeInfo, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}
