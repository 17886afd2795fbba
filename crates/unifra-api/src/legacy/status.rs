// Controller status reads
//
// `self/sites` hangs off the controller root; sysinfo and health are
// per-site `stat/` collections. None of these mutate anything, so they
// double as cheap session probes.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::legacy::models::{LegacySite, SubsystemHealth};

impl LegacyClient {
    /// Sites the logged-in account can see (`GET /api/self/sites`).
    pub async fn list_sites(&self) -> Result<Vec<LegacySite>, Error> {
        debug!("GET self/sites");
        self.get(self.api_url("self/sites")?).await
    }

    /// `stat/sysinfo` for the client's site. Field set varies by firmware,
    /// so it stays untyped; an empty answer becomes `Value::Null`.
    pub async fn get_sysinfo(&self) -> Result<Value, Error> {
        debug!(site = self.site(), "GET stat/sysinfo");
        let rows: Vec<Value> = self.get(self.site_url("stat/sysinfo")?).await?;
        Ok(rows.into_iter().next().unwrap_or(Value::Null))
    }

    /// One entry per subsystem (`wan`, `lan`, `wlan`, `vpn`, ...).
    pub async fn get_health(&self) -> Result<Vec<SubsystemHealth>, Error> {
        debug!(site = self.site(), "GET stat/health");
        self.get(self.site_url("stat/health")?).await
    }
}
