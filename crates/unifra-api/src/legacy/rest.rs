// Legacy API REST collections
//
// Site-scoped `rest/{collection}` endpoints behave uniformly: GET lists or
// fetches by id, POST creates, PUT updates, DELETE removes. Bodies are
// passed through as JSON objects -- field mapping is the caller's concern.

use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;

/// A managed resource collection under `/api/s/{site}/rest/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum RestResource {
    Network,
    Wlan,
    FirewallRule,
    FirewallGroup,
    PortForward,
    PortProfile,
    UserGroup,
    User,
    RadiusProfile,
    RadiusAccount,
    DynamicDns,
    StaticRoute,
}

impl RestResource {
    /// Collection segment in the controller URL.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Network => "networkconf",
            Self::Wlan => "wlanconf",
            Self::FirewallRule => "firewallrule",
            Self::FirewallGroup => "firewallgroup",
            Self::PortForward => "portforward",
            Self::PortProfile => "portconf",
            Self::UserGroup => "usergroup",
            Self::User => "user",
            Self::RadiusProfile => "radiusprofile",
            Self::RadiusAccount => "account",
            Self::DynamicDns => "dynamicdns",
            Self::StaticRoute => "routing",
        }
    }

    fn path(self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("rest/{}/{id}", self.collection()),
            None => format!("rest/{}", self.collection()),
        }
    }
}

impl LegacyClient {
    /// List every object in a collection.
    ///
    /// `GET /api/s/{site}/rest/{collection}`
    pub async fn list_rest(&self, resource: RestResource) -> Result<Vec<Value>, Error> {
        let url = self.site_url(&resource.path(None))?;
        debug!(%resource, "listing");
        self.get(url).await
    }

    /// Fetch one object by id.
    ///
    /// `GET /api/s/{site}/rest/{collection}/{id}`. Controllers answer a
    /// missing id with either HTTP 404, `api.err.IdInvalid`, or an empty
    /// `data` array; all three come back as `Error::NotFound`.
    pub async fn get_rest(&self, resource: RestResource, id: &str) -> Result<Value, Error> {
        let path = resource.path(Some(id));
        let url = self.site_url(&path)?;
        debug!(%resource, id, "fetching");
        let mut data: Vec<Value> = self.get(url).await.map_err(|e| gone(e, &path))?;
        data.pop().ok_or(Error::NotFound { path })
    }

    /// Create an object and return it as stored by the controller.
    ///
    /// `POST /api/s/{site}/rest/{collection}`
    pub async fn create_rest(&self, resource: RestResource, body: &Value) -> Result<Value, Error> {
        let url = self.site_url(&resource.path(None))?;
        debug!(%resource, "creating");
        let mut data: Vec<Value> = self.post(url, body).await?;
        data.pop().ok_or_else(|| Error::LegacyApi {
            message: format!("controller returned no {resource} after create"),
        })
    }

    /// Replace an object and return the stored result.
    ///
    /// `PUT /api/s/{site}/rest/{collection}/{id}`
    pub async fn update_rest(
        &self,
        resource: RestResource,
        id: &str,
        body: &Value,
    ) -> Result<Value, Error> {
        let url = self.site_url(&resource.path(Some(id)))?;
        debug!(%resource, id, "updating");
        let mut data: Vec<Value> = self.put(url, body).await?;
        data.pop().ok_or_else(|| Error::LegacyApi {
            message: format!("controller returned no {resource} after update of {id}"),
        })
    }

    /// Delete an object.
    ///
    /// `DELETE /api/s/{site}/rest/{collection}/{id}`. A missing id is
    /// `Error::NotFound`, whichever way the controller reports it.
    pub async fn delete_rest(&self, resource: RestResource, id: &str) -> Result<(), Error> {
        let path = resource.path(Some(id));
        let url = self.site_url(&path)?;
        debug!(%resource, id, "deleting");
        let _: Vec<Value> = self.delete(url).await.map_err(|e| gone(e, &path))?;
        Ok(())
    }
}

/// Collapse every "no such id" answer into `Error::NotFound`.
fn gone(err: Error, path: &str) -> Error {
    if err.is_not_found() {
        Error::NotFound { path: path.into() }
    } else {
        err
    }
}
