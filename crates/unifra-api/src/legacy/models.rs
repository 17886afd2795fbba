// Wire types
//
// REST resource bodies are passed through as `serde_json::Value`; only the
// envelope and the status objects get structs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ "meta": { "rc": "ok" | "error", "msg": ... }, "data": [...] }`
#[derive(Debug, Deserialize)]
pub struct LegacyResponse<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

impl Meta {
    pub fn is_ok(&self) -> bool {
        self.rc == "ok"
    }
}

/// An entry of `self/sites`. `name` is the short id used in URLs;
/// `desc` is the display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySite {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry of `stat/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemHealth {
    pub subsystem: String,
    /// `ok`, `warning`, `error`, or `unknown`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
