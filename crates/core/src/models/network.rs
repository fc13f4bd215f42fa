//! Affiliate network models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized affiliate network metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub key: String,
    pub name: String,
    /// Query parameter that carries the per-user reference id
    #[serde(default)]
    pub tracking_param: Option<String>,
    /// Fixed tracking parameters appended with their configured values
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Query parameter that carries the sub-id, for networks that take one
    #[serde(default)]
    pub sub_id_param: Option<String>,
}

impl Network {
    /// Normalize a raw document entry filed under `key`
    pub fn from_record(key: &str, record: NetworkRecord) -> Self {
        Self {
            key: key.to_string(),
            name: record.name,
            tracking_param: record.param,
            params: record.params,
            sub_id_param: record.sub_param,
        }
    }
}

/// Raw entry in the networks document
///
/// Two shapes are in circulation: flattened (`param` names the single
/// user-reference parameter) and multi-param (`params` maps parameter names
/// to fixed values). A record may carry both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub name: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub sub_param: Option<String>,
}

/// Networks document: a JSON object keyed by network id
pub type NetworksDocument = BTreeMap<String, NetworkRecord>;
