//! HTTP client for the console REST API.

use super::{BoardApi, ListEnvelope, ReorderRequest};
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::gate::{AreaScope, ScopeHeader};
use crate::types::{
    AreaFields, AreaId, Batch, CultivationArea, Facility, NewBatch, NewFacility, Stage, StageFields,
    StageId, Tenant,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default API root
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Default name of the tenant scope header
pub const DEFAULT_TENANT_HEADER: &str = "X-Tenant-ID";

/// Extract a human-readable message and the first field error from an error body.
///
/// Tries `message`, then `error`, then falls back to the raw body. Field errors
/// come from a 422 `details` object shaped `{"field": ["message", ...]}`.
pub fn extract_error(body: &str) -> (String, Option<(String, String)>) {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return (body.to_string(), None);
    };

    let message = json
        .get("message")
        .or_else(|| json.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());

    let details = json
        .get("details")
        .or_else(|| json.get("errors"))
        .and_then(|v| v.as_object())
        .and_then(|fields| {
            fields.iter().find_map(|(field, messages)| {
                let first = match messages {
                    serde_json::Value::Array(items) => items.first()?.as_str()?.to_string(),
                    serde_json::Value::String(s) => s.clone(),
                    _ => return None,
                };
                Some((field.clone(), first))
            })
        });

    (message, details)
}

/// Client for the console REST API
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    tenant_header: String,
}

impl Default for HttpBoardApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl HttpBoardApi {
    /// Create a client with default transport settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
        }
    }

    /// Build a client from loaded configuration
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let mut api = Self::with_client(client, &config.api_base_url)
            .with_tenant_header(&config.tenant_header);
        if let Some(token) = &config.auth_token {
            api = api.with_auth_token(token);
        }
        Ok(api)
    }

    /// Send `Authorization: Bearer <token>` with every call
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Override the scope header name
    pub fn with_tenant_header(mut self, name: impl Into<String>) -> Self {
        self.tenant_header = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, scope: Option<&ScopeHeader>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(scope) = scope {
            builder = builder.header(self.tenant_header.as_str(), scope.as_str());
        }
        builder
    }

    /// Map an HTTP response to a `BoardError` based on status code.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (message, details) = extract_error(&body);
        Err(BoardError::from_status(status.as_u16(), message, details))
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        scope: Option<&ScopeHeader>,
    ) -> Result<Vec<T>> {
        tracing::debug!(path, "GET");
        let response = self.request(Method::GET, path, scope).send().await?;
        let response = Self::check_response(response).await?;
        let body = response.bytes().await?;
        let envelope: ListEnvelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.into_items())
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        tracing::debug!(%method, path, "sending");
        let response = self.request(method, path, scope).json(body).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn send_delete(&self, path: &str, scope: Option<&ScopeHeader>) -> Result<()> {
        tracing::debug!(path, "DELETE");
        let response = self.request(Method::DELETE, path, scope).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn list_stages(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Stage>> {
        let mut stages: Vec<Stage> = self.get_list("/stages", scope).await?;
        stages.sort_by_key(|s| (s.order, s.id));
        Ok(stages)
    }

    async fn create_stage(&self, fields: &StageFields, scope: Option<&ScopeHeader>) -> Result<()> {
        self.send_json(Method::POST, "/stages", fields, scope).await
    }

    async fn update_stage(
        &self,
        id: StageId,
        fields: &StageFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.send_json(Method::PUT, &format!("/stages/{id}"), fields, scope)
            .await
    }

    async fn delete_stage(&self, id: StageId, scope: Option<&ScopeHeader>) -> Result<()> {
        self.send_delete(&format!("/stages/{id}"), scope).await
    }

    async fn list_areas(
        &self,
        areas: AreaScope,
        scope: Option<&ScopeHeader>,
    ) -> Result<Vec<CultivationArea>> {
        let path = match areas {
            AreaScope::All => "/cultivation-areas".to_string(),
            AreaScope::Facility(id) => format!("/facilities/{id}/cultivation-areas"),
        };
        self.get_list(&path, scope).await
    }

    async fn create_area(&self, fields: &AreaFields, scope: Option<&ScopeHeader>) -> Result<()> {
        self.send_json(Method::POST, "/cultivation-areas", fields, scope)
            .await
    }

    async fn update_area(
        &self,
        id: AreaId,
        fields: &AreaFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.send_json(
            Method::PUT,
            &format!("/cultivation-areas/{id}"),
            fields,
            scope,
        )
        .await
    }

    async fn delete_area(&self, id: AreaId, scope: Option<&ScopeHeader>) -> Result<()> {
        self.send_delete(&format!("/cultivation-areas/{id}"), scope)
            .await
    }

    async fn reorder_areas(
        &self,
        stage: StageId,
        area_ids: &[AreaId],
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        let body = ReorderRequest {
            area_ids: area_ids.to_vec(),
        };
        self.send_json(
            Method::PUT,
            &format!("/stages/{stage}/cultivation-areas/reorder"),
            &body,
            scope,
        )
        .await
    }

    async fn list_facilities(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Facility>> {
        self.get_list("/facilities", scope).await
    }

    async fn create_facility(
        &self,
        facility: &NewFacility,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.send_json(Method::POST, "/facilities", facility, scope)
            .await
    }

    async fn list_tenants(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Tenant>> {
        self.get_list("/tenants", scope).await
    }

    async fn list_batches(&self, area: AreaId, scope: Option<&ScopeHeader>) -> Result<Vec<Batch>> {
        self.get_list(&format!("/cultivation-areas/{area}/batches"), scope)
            .await
    }

    async fn create_batch(&self, batch: &NewBatch, scope: Option<&ScopeHeader>) -> Result<()> {
        self.send_json(Method::POST, "/batches", batch, scope).await
    }
}
