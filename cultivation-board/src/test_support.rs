//! In-memory doubles for tests: a fake console server and a recording notifier.
//!
//! Available to this crate's tests and, through the `test-support` feature,
//! to integration tests and downstream crates.

use crate::api::BoardApi;
use crate::error::{BoardError, Result};
use crate::gate::{AreaScope, ScopeHeader};
use crate::notify::{Notification, NotificationSink};
use crate::types::{
    AreaFields, AreaId, Batch, BatchId, CultivationArea, Facility, FacilityId, NewBatch,
    NewFacility, Stage, StageFields, StageId, Tenant,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A call received by [`MemoryBoardApi`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    ListStages,
    CreateStage,
    UpdateStage(StageId),
    DeleteStage(StageId),
    ListAreas,
    CreateArea,
    UpdateArea(AreaId),
    DeleteArea(AreaId),
    Reorder(StageId),
    ListFacilities,
    CreateFacility,
    ListTenants,
    ListBatches(AreaId),
    CreateBatch,
}

impl ApiCall {
    /// Whether the call would change server state
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::ListStages
                | Self::ListAreas
                | Self::ListFacilities
                | Self::ListTenants
                | Self::ListBatches(_)
        )
    }
}

#[derive(Debug, Default)]
struct ServerState {
    stages: Vec<Stage>,
    areas: Vec<CultivationArea>,
    facilities: Vec<Facility>,
    tenants: Vec<Tenant>,
    batches: Vec<Batch>,
    calls: Vec<ApiCall>,
    scopes: Vec<Option<String>>,
    failures: Vec<ApiCall>,
    pause: Option<(ApiCall, Arc<Notify>)>,
}

/// A console server kept in memory.
///
/// Writes behave like the real backend closely enough for board tests:
/// reorders persist dense positions, deletes are refused while dependents
/// exist, and any call can be made to fail or to wait for a signal.
#[derive(Debug, Default)]
pub struct MemoryBoardApi {
    state: Mutex<ServerState>,
}

impl MemoryBoardApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the server with stages and areas.
    ///
    /// One facility is registered for every facility id the areas reference.
    pub fn with_data(stages: Vec<Stage>, areas: Vec<CultivationArea>) -> Self {
        let mut facilities: Vec<Facility> = Vec::new();
        for area in &areas {
            if !facilities.iter().any(|f| f.id == area.facility_id) {
                facilities.push(Facility {
                    id: area.facility_id,
                    name: format!("Facility {}", area.facility_id),
                    tenant_id: None,
                });
            }
        }

        Self {
            state: Mutex::new(ServerState {
                stages,
                areas,
                facilities,
                ..ServerState::default()
            }),
        }
    }

    pub fn with_facilities(self, facilities: Vec<Facility>) -> Self {
        self.lock().facilities = facilities;
        self
    }

    pub fn with_tenants(self, tenants: Vec<Tenant>) -> Self {
        self.lock().tenants = tenants;
        self
    }

    pub fn with_batches(self, batches: Vec<Batch>) -> Self {
        self.lock().batches = batches;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls that would have changed server state
    pub fn writes(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .copied()
            .filter(ApiCall::is_write)
            .collect()
    }

    /// Scope header values received, one per call
    pub fn scopes(&self) -> Vec<Option<String>> {
        self.lock().scopes.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.lock();
        state.calls.clear();
        state.scopes.clear();
    }

    /// Make every future occurrence of `call` fail with a 500
    pub fn fail_on(&self, call: ApiCall) {
        self.lock().failures.push(call);
    }

    /// Make the next occurrence of `call` wait until the returned handle is notified
    pub fn pause_on(&self, call: ApiCall) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.lock().pause = Some((call, Arc::clone(&notify)));
        notify
    }

    /// The server's current area list
    pub fn stored_areas(&self) -> Vec<CultivationArea> {
        self.lock().areas.clone()
    }

    /// Area ids of one stage in persisted order
    pub fn stage_order(&self, stage: StageId) -> Vec<AreaId> {
        let mut areas: Vec<_> = self
            .lock()
            .areas
            .iter()
            .filter(|a| a.current_stage_id == stage)
            .map(|a| (a.order, a.id))
            .collect();
        areas.sort();
        areas.into_iter().map(|(_, id)| id).collect()
    }

    /// Record the call, then wait or fail if configured to
    async fn receive(&self, call: ApiCall, scope: Option<&ScopeHeader>) -> Result<()> {
        let paused = {
            let mut state = self.lock();
            state.calls.push(call);
            state.scopes.push(scope.map(|s| s.as_str().to_string()));
            let hit = matches!(&state.pause, Some((paused, _)) if *paused == call);
            if hit {
                state.pause.take().map(|(_, notify)| notify)
            } else {
                None
            }
        };

        if let Some(notify) = paused {
            notify.notified().await;
        }

        if self.lock().failures.contains(&call) {
            return Err(BoardError::Api {
                status: 500,
                message: format!("injected failure: {call:?}"),
            });
        }
        Ok(())
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl BoardApi for MemoryBoardApi {
    async fn list_stages(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Stage>> {
        self.receive(ApiCall::ListStages, scope).await?;
        let mut stages = self.lock().stages.clone();
        stages.sort_by_key(|s| (s.order, s.id));
        Ok(stages)
    }

    async fn create_stage(&self, fields: &StageFields, scope: Option<&ScopeHeader>) -> Result<()> {
        self.receive(ApiCall::CreateStage, scope).await?;
        let mut state = self.lock();
        let id = next_id(state.stages.iter().map(|s| s.id.get()));
        let order = state.stages.len() as i64;
        state.stages.push(Stage::new(id, fields.name.clone(), order));
        Ok(())
    }

    async fn update_stage(
        &self,
        id: StageId,
        fields: &StageFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.receive(ApiCall::UpdateStage(id), scope).await?;
        let mut state = self.lock();
        let stage = state
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BoardError::NotFound {
                message: format!("stage {id}"),
            })?;
        stage.name = fields.name.clone();
        Ok(())
    }

    async fn delete_stage(&self, id: StageId, scope: Option<&ScopeHeader>) -> Result<()> {
        self.receive(ApiCall::DeleteStage(id), scope).await?;
        let mut state = self.lock();
        if state.areas.iter().any(|a| a.current_stage_id == id) {
            return Err(BoardError::Conflict {
                message: "stage has cultivation areas".into(),
            });
        }
        state.stages.retain(|s| s.id != id);
        Ok(())
    }

    async fn list_areas(
        &self,
        areas: AreaScope,
        scope: Option<&ScopeHeader>,
    ) -> Result<Vec<CultivationArea>> {
        self.receive(ApiCall::ListAreas, scope).await?;
        let state = self.lock();
        Ok(state
            .areas
            .iter()
            .filter(|a| match areas {
                AreaScope::All => true,
                AreaScope::Facility(id) => a.facility_id == id,
            })
            .cloned()
            .collect())
    }

    async fn create_area(&self, fields: &AreaFields, scope: Option<&ScopeHeader>) -> Result<()> {
        self.receive(ApiCall::CreateArea, scope).await?;
        let mut state = self.lock();
        let id = next_id(state.areas.iter().map(|a| a.id.get()));
        let order = state
            .areas
            .iter()
            .filter(|a| a.current_stage_id == fields.current_stage_id)
            .count() as i64;

        let mut area = CultivationArea::new(
            id,
            fields.name.clone(),
            fields.facility_id,
            fields.current_stage_id,
            order,
        );
        area.description = fields.description.clone();
        area.capacity_units = fields.capacity_units;
        area.capacity_unit_type = fields.capacity_unit_type.clone();
        state.areas.push(area);
        Ok(())
    }

    async fn update_area(
        &self,
        id: AreaId,
        fields: &AreaFields,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.receive(ApiCall::UpdateArea(id), scope).await?;
        let mut state = self.lock();
        let area = state
            .areas
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| BoardError::NotFound {
                message: format!("cultivation area {id}"),
            })?;
        area.name = fields.name.clone();
        area.description = fields.description.clone();
        area.capacity_units = fields.capacity_units;
        area.capacity_unit_type = fields.capacity_unit_type.clone();
        area.facility_id = fields.facility_id;
        area.current_stage_id = fields.current_stage_id;
        if let Some(order) = fields.order {
            area.order = order;
        }
        Ok(())
    }

    async fn delete_area(&self, id: AreaId, scope: Option<&ScopeHeader>) -> Result<()> {
        self.receive(ApiCall::DeleteArea(id), scope).await?;
        let mut state = self.lock();
        if state.batches.iter().any(|b| b.cultivation_area_id == id) {
            return Err(BoardError::Conflict {
                message: "cultivation area has batches".into(),
            });
        }
        state.areas.retain(|a| a.id != id);
        Ok(())
    }

    async fn reorder_areas(
        &self,
        stage: StageId,
        area_ids: &[AreaId],
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.receive(ApiCall::Reorder(stage), scope).await?;
        let mut state = self.lock();
        let foreign = area_ids.iter().find(|id| {
            !state
                .areas
                .iter()
                .any(|a| a.id == **id && a.current_stage_id == stage)
        });
        if let Some(id) = foreign {
            return Err(BoardError::validation(
                "area_ids",
                format!("cultivation area {id} does not belong to stage {stage}"),
            ));
        }

        for area in state.areas.iter_mut() {
            if let Some(position) = area_ids.iter().position(|id| *id == area.id) {
                area.order = position as i64;
            }
        }
        Ok(())
    }

    async fn list_facilities(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Facility>> {
        self.receive(ApiCall::ListFacilities, scope).await?;
        Ok(self.lock().facilities.clone())
    }

    async fn create_facility(
        &self,
        facility: &NewFacility,
        scope: Option<&ScopeHeader>,
    ) -> Result<()> {
        self.receive(ApiCall::CreateFacility, scope).await?;
        let mut state = self.lock();
        let id = next_id(state.facilities.iter().map(|f| f.id.get()));
        state.facilities.push(Facility {
            id: FacilityId::new(id),
            name: facility.name.clone(),
            tenant_id: facility.tenant_id,
        });
        Ok(())
    }

    async fn list_tenants(&self, scope: Option<&ScopeHeader>) -> Result<Vec<Tenant>> {
        self.receive(ApiCall::ListTenants, scope).await?;
        Ok(self.lock().tenants.clone())
    }

    async fn list_batches(&self, area: AreaId, scope: Option<&ScopeHeader>) -> Result<Vec<Batch>> {
        self.receive(ApiCall::ListBatches(area), scope).await?;
        Ok(self
            .lock()
            .batches
            .iter()
            .filter(|b| b.cultivation_area_id == area)
            .cloned()
            .collect())
    }

    async fn create_batch(&self, batch: &NewBatch, scope: Option<&ScopeHeader>) -> Result<()> {
        self.receive(ApiCall::CreateBatch, scope).await?;
        let mut state = self.lock();
        let id = next_id(state.batches.iter().map(|b| b.id.get()));
        state.batches.push(Batch {
            id: BatchId::new(id),
            name: batch.name.clone(),
            current_units: batch.current_units,
            variety: Some(batch.variety.clone()),
            end_type: Some(batch.end_type.clone()),
            projected_yield: batch.projected_yield,
            harvest_date: batch.harvest_date,
            cultivation_area_id: batch.cultivation_area_id,
        });
        Ok(())
    }
}

/// Collects notifications for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the message texts
    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
