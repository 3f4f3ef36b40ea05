//! DigitalOcean REST API client
//!
//! Thin typed wrapper over the `/v2` endpoints the resource services need.
//! Bearer token authentication; every response envelope is deserialized
//! into the narrow shape used downstream.

use crate::error::{DoError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2";

/// DigitalOcean API client
pub struct DoApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DoApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: DIGITALOCEAN_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DoError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DoError::ApiError(format!("{status}: {body}")));
        }

        Ok(response.json().await?)
    }

    /// Authenticated no-op used for credential checks.
    pub async fn account(&self) -> Result<AccountInfo> {
        let envelope: AccountEnvelope = self.get_json("/account").await?;
        Ok(envelope.account)
    }

    pub async fn list_databases(&self) -> Result<Vec<ApiDatabase>> {
        let envelope: DatabasesEnvelope = self.get_json("/databases?per_page=200").await?;
        Ok(envelope.databases)
    }

    pub async fn get_database(&self, id: &str) -> Result<ApiDatabase> {
        let envelope: DatabaseEnvelope = self.get_json(&format!("/databases/{id}")).await?;
        Ok(envelope.database)
    }

    pub async fn list_database_users(&self, cluster_id: &str) -> Result<Vec<ApiDatabaseUser>> {
        let envelope: UsersEnvelope = self
            .get_json(&format!("/databases/{cluster_id}/users"))
            .await?;
        Ok(envelope.users)
    }

    pub async fn list_vpcs(&self) -> Result<Vec<ApiVpc>> {
        let envelope: VpcsEnvelope = self.get_json("/vpcs?per_page=200").await?;
        Ok(envelope.vpcs)
    }

    pub async fn list_clusters(&self) -> Result<Vec<ApiKubernetesCluster>> {
        let envelope: ClustersEnvelope = self.get_json("/kubernetes/clusters?per_page=200").await?;
        Ok(envelope.kubernetes_clusters)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub uuid: String,
    pub email: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    account: AccountInfo,
}

/// One managed database cluster as the API reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDatabase {
    pub id: String,
    pub name: String,
    pub engine: String,
    pub version: Option<String>,
    pub connection: Option<ApiDatabaseConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDatabaseConnection {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ApiDatabase {
    /// The wire protocol clients should use; the API reports postgres as
    /// `pg`.
    pub fn protocol(&self) -> &str {
        if self.engine == "pg" {
            "postgresql"
        } else {
            &self.engine
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatabasesEnvelope {
    databases: Vec<ApiDatabase>,
}

#[derive(Debug, Deserialize)]
struct DatabaseEnvelope {
    database: ApiDatabase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDatabaseUser {
    pub name: String,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    users: Vec<ApiDatabaseUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiVpc {
    pub id: String,
    pub name: String,
    pub region: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VpcsEnvelope {
    vpcs: Vec<ApiVpc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKubernetesCluster {
    pub id: String,
    pub name: String,
    pub version: String,
    pub vpc_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClustersEnvelope {
    kubernetes_clusters: Vec<ApiKubernetesCluster>,
}
