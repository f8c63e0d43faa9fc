use nodeinfo::NodeInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Moment a target entered its current category. Serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Since(#[serde(with = "time::serde::rfc3339")] pub OffsetDateTime);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedSince {
    pub since: Since,
    pub code: u16,
}

/// target -> since
pub type SinceRecords = BTreeMap<String, Since>;
/// target -> (since, status code)
pub type CodedRecords = BTreeMap<String, CodedSince>;

/// Persisted result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,

    #[serde(default)]
    pub unresolved: SinceRecords,
    #[serde(default)]
    pub not_functioning: SinceRecords,
    #[serde(default)]
    pub wrong_code: CodedRecords,

    #[serde(default, rename = "misformatted_nodeinfo_list")]
    pub misformatted_list: SinceRecords,
    #[serde(default, rename = "no_available_nodeinfo_schema")]
    pub no_available_schema: SinceRecords,
    #[serde(default, rename = "misformatted_nodeinfo_schema")]
    pub misformatted_schema: SinceRecords,

    #[serde(default)]
    pub valid: BTreeMap<String, NodeInfo>,
}

impl Snapshot {
    /// Stand-in for a missing or unreadable previous run.
    pub fn empty() -> Self {
        Snapshot {
            collected_at: OffsetDateTime::UNIX_EPOCH,
            unresolved: SinceRecords::new(),
            not_functioning: SinceRecords::new(),
            wrong_code: CodedRecords::new(),
            misformatted_list: SinceRecords::new(),
            no_available_schema: SinceRecords::new(),
            misformatted_schema: SinceRecords::new(),
            valid: BTreeMap::new(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self { Snapshot::empty() }
}
