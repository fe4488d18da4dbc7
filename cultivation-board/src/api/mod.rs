//! Server interface consumed by the board engine

mod http;

pub use http::{extract_error, HttpBoardApi, DEFAULT_API_BASE_URL, DEFAULT_TENANT_HEADER};

use crate::error::Result;
use crate::gate::{AreaScope, ScopeHeader};
use crate::types::{
    AreaFields, AreaId, Batch, CultivationArea, Facility, NewBatch, NewFacility, Stage, StageFields,
    StageId, Tenant,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// REST endpoints the console talks to.
///
/// Every call carries the caller's opaque scope header, if any. Writes return
/// nothing: the engine always refetches the authoritative list afterwards.
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// `GET /stages`
    async fn list_stages(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Stage>>;

    /// `POST /stages`
    async fn create_stage(&self, fields: &StageFields, scope: Option<&ScopeHeader>) -> Result<()>;

    /// `PUT /stages/{id}`
    async fn update_stage(
        &self,
        id: StageId,
        fields: &StageFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()>;

    /// `DELETE /stages/{id}`; the server refuses stages that still hold areas
    async fn delete_stage(&self, id: StageId, scope: Option<&ScopeHeader>) -> Result<()>;

    /// `GET /cultivation-areas` or `GET /facilities/{id}/cultivation-areas`
    async fn list_areas(
        &self,
        areas: AreaScope,
        scope: Option<&ScopeHeader>,
    ) -> Result<Vec<CultivationArea>>;

    /// `POST /cultivation-areas`
    async fn create_area(&self, fields: &AreaFields, scope: Option<&ScopeHeader>) -> Result<()>;

    /// `PUT /cultivation-areas/{id}` with the full field set
    async fn update_area(
        &self,
        id: AreaId,
        fields: &AreaFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()>;

    /// `DELETE /cultivation-areas/{id}`; the server refuses areas that still hold batches
    async fn delete_area(&self, id: AreaId, scope: Option<&ScopeHeader>) -> Result<()>;

    /// `PUT /stages/{id}/cultivation-areas/reorder`
    async fn reorder_areas(
        &self,
        stage: StageId,
        area_ids: &[AreaId],
        scope: Option<&ScopeHeader>,
    ) -> Result<()>;

    /// `GET /facilities`
    async fn list_facilities(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Facility>>;

    /// `POST /facilities`
    async fn create_facility(
        &self,
        facility: &NewFacility,
        scope: Option<&ScopeHeader>,
    ) -> Result<()>;

    /// `GET /tenants`
    async fn list_tenants(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Tenant>>;

    /// `GET /cultivation-areas/{id}/batches`
    async fn list_batches(&self, area: AreaId, scope: Option<&ScopeHeader>) -> Result<Vec<Batch>>;

    /// `POST /batches`
    async fn create_batch(&self, batch: &NewBatch, scope: Option<&ScopeHeader>) -> Result<()>;
}

/// Body of the reorder endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub area_ids: Vec<AreaId>,
}

/// List responses arrive either bare or wrapped in `{"data": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped { data } => data,
        }
    }
}
