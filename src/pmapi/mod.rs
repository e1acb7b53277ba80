// pmwebapi (pmproxy REST) client via reqwest

mod error;
pub mod types;

pub use error::PmApiError;
pub use types::ContextId;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::instrument;

use crate::models::{ContainerList, InstanceId, Snapshot};
use types::{ContextResponse, FetchResponse, IndomResponse, MetricListResponse};

pub const HOSTNAME_METRIC: &str = "pmcd.hostname";
pub const CONTAINER_METRIC: &str = "pmcd.client.container";
const CONTAINER_NAMES: &str = "containers.name";
const CONTAINER_CGROUPS: &str = "containers.cgroup";

#[derive(Debug, Clone)]
pub struct PmApiClient {
    client: Client,
    base_url: String,
}

impl PmApiClient {
    /// Client for `http://{hostname}:{port}/pmapi`.
    pub fn new(hostname: &str, port: u16, timeout: Duration) -> Result<Self, PmApiError> {
        Self::with_base_url(&format!("http://{}:{}/pmapi", hostname, port), timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, PmApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| PmApiError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PmApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(PmApiError::Http {
                status: response.status().as_u16(),
                path: path.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PmApiError::Parse(e.to_string()))
    }

    #[instrument(skip(self), fields(client = "pmapi", operation = "create_context"))]
    pub async fn create_context(
        &self,
        hostspec: &str,
        poll_timeout_secs: u64,
    ) -> Result<ContextId, PmApiError> {
        let resp: ContextResponse = self
            .get_json(
                "context",
                &[
                    ("exclusive", "1".to_string()),
                    ("hostspec", hostspec.to_string()),
                    ("polltimeout", poll_timeout_secs.to_string()),
                ],
            )
            .await?;
        Ok(resp.context)
    }

    #[instrument(skip(self), fields(client = "pmapi", operation = "metric_names"))]
    pub async fn metric_names(&self, ctx: ContextId) -> Result<BTreeSet<String>, PmApiError> {
        let resp: MetricListResponse = self.get_json(&format!("{}/_metric", ctx), &[]).await?;
        Ok(types::metric_names(resp))
    }

    async fn fetch_raw(&self, ctx: ContextId, names: &str) -> Result<FetchResponse, PmApiError> {
        self.get_json(&format!("{}/_fetch", ctx), &[("names", names.to_string())])
            .await
    }

    /// Numeric values of `names` at one instant. No request is made for an
    /// empty list.
    #[instrument(
        skip(self, names),
        fields(client = "pmapi", operation = "fetch", names_count = names.len())
    )]
    pub async fn fetch(
        &self,
        ctx: ContextId,
        names: &BTreeSet<String>,
    ) -> Result<Snapshot, PmApiError> {
        if names.is_empty() {
            return Ok(Snapshot::default());
        }
        let joined = names.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        let resp = self.fetch_raw(ctx, &joined).await?;
        Ok(types::snapshot_from_fetch(&resp))
    }

    #[instrument(skip(self), fields(client = "pmapi", operation = "fetch_strings"))]
    pub async fn fetch_strings(
        &self,
        ctx: ContextId,
        name: &str,
    ) -> Result<BTreeMap<InstanceId, String>, PmApiError> {
        let resp = self.fetch_raw(ctx, name).await?;
        Ok(types::strings_from_fetch(&resp, name))
    }

    /// `pmcd.hostname` of the monitored host, if it reports one.
    pub async fn hostname(&self, ctx: ContextId) -> Result<Option<String>, PmApiError> {
        let values = self.fetch_strings(ctx, HOSTNAME_METRIC).await?;
        Ok(values.into_values().next())
    }

    #[instrument(skip(self), fields(client = "pmapi", operation = "instance_domain"))]
    pub async fn instance_domain(
        &self,
        ctx: ContextId,
        metric: &str,
    ) -> Result<BTreeMap<InstanceId, String>, PmApiError> {
        let resp: IndomResponse = self
            .get_json(&format!("{}/_indom", ctx), &[("name", metric.to_string())])
            .await?;
        Ok(types::instance_domain(resp))
    }

    /// Stores `value` into metric `name`. pmproxy answers with a JSON body
    /// that carries nothing of interest.
    #[instrument(skip(self), fields(client = "pmapi", operation = "store"))]
    pub async fn store(&self, ctx: ContextId, name: &str, value: &str) -> Result<(), PmApiError> {
        let _: serde_json::Value = self
            .get_json(
                &format!("{}/_store", ctx),
                &[("name", name.to_string()), ("value", value.to_string())],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(client = "pmapi", operation = "container_list"))]
    pub async fn container_list(&self, ctx: ContextId) -> Result<ContainerList, PmApiError> {
        let names = self.fetch_strings(ctx, CONTAINER_NAMES).await?;
        let cgroups = self.fetch_strings(ctx, CONTAINER_CGROUPS).await?;
        Ok(types::join_containers(&cgroups, &names))
    }
}
