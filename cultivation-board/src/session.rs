//! Board session: the single consumer that owns the board snapshots.
//!
//! A session holds the authoritative stage and area lists, derives the board
//! from them, routes gestures through the drag coordinator, and runs moves and
//! structural edits one at a time.

use crate::api::BoardApi;
use crate::board::{resolve, Board, BoardProjection, Resolution};
use crate::config::BoardConfig;
use crate::drag::{DragCoordinator, DragEvent, Gesture, MoveIntent};
use crate::error::{BoardError, Result};
use crate::gate::{AreaScope, RequestContext, DRAG_DENIED_MESSAGE, STRUCTURE_DENIED_MESSAGE};
use crate::notify::{self, Notification, NotificationSink};
use crate::sync::{Fenced, SyncEngine};
use crate::types::{
    AreaFields, AreaId, Batch, CultivationArea, Facility, NewBatch, NewFacility, Stage,
    StageFields, StageId, Tenant,
};
use crate::validation;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What became of a move intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Self-drop, or a drop onto the area's current slot. Nothing was sent.
    NoOp,
    /// Refused by the permission gate. Nothing was sent.
    Denied,
    /// The plan ran; `committed` is false when a step failed. The board has
    /// been reconciled either way, unless the refetch also failed.
    Moved { committed: bool, steps_completed: usize },
}

/// What a gesture led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Swallowed: no drag event, or a new drag while an operation is in flight
    Ignored,
    /// A drag event that needs no server work
    Drag(DragEvent),
    /// The drag ended with an intent that was applied
    Move(MoveOutcome),
}

/// Which list a structural edit invalidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    Stages,
    Areas,
    Nothing,
}

#[derive(Debug)]
struct SessionState {
    stages: Arc<Vec<Stage>>,
    stages_generation: u64,
    areas: Arc<Vec<CultivationArea>>,
    areas_generation: u64,
    projection: BoardProjection,
    drag: DragCoordinator,
}

/// Held while a structural operation runs; clears the in-flight flag on drop
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BoardError::Busy)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One user's view of the board
pub struct BoardSession {
    api: Arc<dyn BoardApi>,
    sync: SyncEngine,
    notifier: Arc<dyn NotificationSink>,
    state: Mutex<SessionState>,
    in_flight: Arc<AtomicBool>,
}

impl BoardSession {
    pub fn new(
        api: Arc<dyn BoardApi>,
        notifier: Arc<dyn NotificationSink>,
        config: &BoardConfig,
    ) -> Self {
        Self {
            sync: SyncEngine::new(Arc::clone(&api)),
            api,
            notifier,
            state: Mutex::new(SessionState {
                stages: Arc::new(Vec::new()),
                stages_generation: 0,
                areas: Arc::new(Vec::new()),
                areas_generation: 0,
                projection: BoardProjection::new(),
                drag: DragCoordinator::new(config.drag_activation_distance),
            }),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current board, derived from the installed snapshots
    pub fn board(&self) -> Arc<Board> {
        let mut state = self.state();
        let SessionState {
            stages,
            areas,
            projection,
            ..
        } = &mut *state;
        projection.board(stages, areas)
    }

    pub fn stages(&self) -> Arc<Vec<Stage>> {
        Arc::clone(&self.state().stages)
    }

    pub fn areas(&self) -> Arc<Vec<CultivationArea>> {
        Arc::clone(&self.state().areas)
    }

    /// A structural operation is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A drag is underway
    pub fn is_dragging(&self) -> bool {
        self.state().drag.is_dragging()
    }

    /// Fetch stages and areas concurrently
    pub async fn load(&self, ctx: &RequestContext) -> Result<()> {
        let (stages, areas) = tokio::join!(self.refresh_stages(ctx), self.refresh_areas(ctx));
        stages.and(areas)
    }

    /// Refetch the stage list and install it if nothing newer has landed
    pub async fn refresh_stages(&self, ctx: &RequestContext) -> Result<()> {
        let generation = self.sync.next_generation();
        match self.api.list_stages(ctx.scope.as_ref()).await {
            Ok(value) => {
                self.install_stages(Fenced { generation, value });
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "failed to load stages");
                self.notifier
                    .notify(Notification::error(notify::STAGES_LOAD_FAILED));
                Err(error)
            }
        }
    }

    /// Refetch the area list for the context's scope
    pub async fn refresh_areas(&self, ctx: &RequestContext) -> Result<()> {
        match self.sync.reconcile(ctx.areas, ctx.scope.as_ref()).await {
            Ok(fenced) => {
                self.install_areas(fenced);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "failed to load cultivation areas");
                self.notifier
                    .notify(Notification::error(notify::AREAS_LOAD_FAILED));
                Err(error)
            }
        }
    }

    fn install_stages(&self, fenced: Fenced<Vec<Stage>>) -> bool {
        let mut state = self.state();
        if fenced.generation <= state.stages_generation {
            tracing::debug!(generation = fenced.generation, "discarding stale stage list");
            return false;
        }
        state.stages_generation = fenced.generation;
        state.stages = Arc::new(fenced.value);
        true
    }

    fn install_areas(&self, fenced: Fenced<Vec<CultivationArea>>) -> bool {
        let mut state = self.state();
        if fenced.generation <= state.areas_generation {
            tracing::debug!(generation = fenced.generation, "discarding stale area list");
            return false;
        }
        state.areas_generation = fenced.generation;
        state.areas = Arc::new(fenced.value);
        true
    }

    /// Feed one gesture from the host UI
    pub async fn handle_gesture(
        &self,
        gesture: Gesture,
        ctx: &RequestContext,
    ) -> Result<GestureOutcome> {
        let board = self.board();
        let event = {
            let mut state = self.state();
            if self.is_busy() && !state.drag.is_engaged() {
                tracing::debug!(?gesture, "ignoring gesture while an operation is in flight");
                return Ok(GestureOutcome::Ignored);
            }
            state.drag.handle(gesture, &board)
        };

        match event {
            None => Ok(GestureOutcome::Ignored),
            Some(DragEvent::End(Some(intent))) => {
                self.apply_move(intent, ctx).await.map(GestureOutcome::Move)
            }
            Some(event) => Ok(GestureOutcome::Drag(event)),
        }
    }

    /// Resolve a move intent, apply it locally, persist it and reconcile.
    ///
    /// Self-drops and drops onto the current slot return `NoOp` without
    /// touching the server. A gated caller gets exactly one denial
    /// notification and `Denied`.
    pub async fn apply_move(&self, intent: MoveIntent, ctx: &RequestContext) -> Result<MoveOutcome> {
        if intent.is_self_drop() {
            return Ok(MoveOutcome::NoOp);
        }

        if ctx.gate.is_facility_operator() {
            tracing::warn!(area = %intent.active, "move refused for facility operator");
            self.notifier
                .notify(Notification::error(DRAG_DENIED_MESSAGE));
            return Ok(MoveOutcome::Denied);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let board = self.board();
        let (next, plan) = match resolve(&board, &intent)? {
            Resolution::Unchanged => return Ok(MoveOutcome::NoOp),
            Resolution::Moved { board, plan } => (board, plan),
        };

        tracing::debug!(?intent, calls = plan.call_count(), "applying move");
        let generation = self.sync.next_generation();
        self.install_areas(Fenced {
            generation,
            value: next.to_areas(),
        });

        let report = self.sync.run(&plan, ctx, self.notifier.as_ref()).await;
        if let Ok(fenced) = report.refreshed {
            self.install_areas(fenced);
        }

        Ok(MoveOutcome::Moved {
            committed: report.committed.is_ok(),
            steps_completed: report.steps_completed,
        })
    }

    pub async fn create_stage(&self, fields: &StageFields, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_stage(fields),
            Refresh::Stages,
            notify::STAGE_CREATED,
            None,
            || self.api.create_stage(fields, scope),
        )
        .await
    }

    pub async fn update_stage(
        &self,
        id: StageId,
        fields: &StageFields,
        ctx: &RequestContext,
    ) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_stage(fields),
            Refresh::Stages,
            notify::STAGE_UPDATED,
            None,
            || self.api.update_stage(id, fields, scope),
        )
        .await
    }

    /// Delete a stage; the server refuses while areas remain in it
    pub async fn delete_stage(&self, id: StageId, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            Ok(()),
            Refresh::Stages,
            notify::STAGE_DELETED,
            Some(notify::STAGE_HAS_AREAS),
            || self.api.delete_stage(id, scope),
        )
        .await
    }

    pub async fn create_area(&self, fields: &AreaFields, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_area(fields),
            Refresh::Areas,
            notify::AREA_CREATED,
            None,
            || self.api.create_area(fields, scope),
        )
        .await
    }

    /// Replace an area's mutable fields
    pub async fn update_area(
        &self,
        id: AreaId,
        fields: &AreaFields,
        ctx: &RequestContext,
    ) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_area(fields),
            Refresh::Areas,
            notify::AREA_UPDATED,
            None,
            || self.api.update_area(id, fields, scope),
        )
        .await
    }

    /// Delete an area; the server refuses while batches remain in it
    pub async fn delete_area(&self, id: AreaId, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            Ok(()),
            Refresh::Areas,
            notify::AREA_DELETED,
            Some(notify::AREA_HAS_BATCHES),
            || self.api.delete_area(id, scope),
        )
        .await
    }

    pub async fn create_facility(&self, facility: &NewFacility, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_facility(facility),
            Refresh::Nothing,
            notify::FACILITY_CREATED,
            None,
            || self.api.create_facility(facility, scope),
        )
        .await
    }

    pub async fn create_batch(&self, batch: &NewBatch, ctx: &RequestContext) -> Result<()> {
        let scope = ctx.scope.as_ref();
        self.structural(
            ctx,
            validation::validate_batch(batch),
            Refresh::Nothing,
            notify::BATCH_CREATED,
            None,
            || self.api.create_batch(batch, scope),
        )
        .await
    }

    /// Facilities visible to the caller. Operators only see their own.
    pub async fn list_facilities(&self, ctx: &RequestContext) -> Result<Vec<Facility>> {
        let mut facilities = self.api.list_facilities(ctx.scope.as_ref()).await?;
        if let (true, AreaScope::Facility(own)) = (ctx.gate.is_facility_operator(), ctx.areas) {
            facilities.retain(|f| f.id == own);
        }
        Ok(facilities)
    }

    pub async fn list_tenants(&self, ctx: &RequestContext) -> Result<Vec<Tenant>> {
        self.api.list_tenants(ctx.scope.as_ref()).await
    }

    pub async fn list_batches(&self, area: AreaId, ctx: &RequestContext) -> Result<Vec<Batch>> {
        self.api.list_batches(area, ctx.scope.as_ref()).await
    }

    /// Gate, lock, validate, write, notify, refresh.
    async fn structural<F, Fut>(
        &self,
        ctx: &RequestContext,
        validated: Result<()>,
        refresh: Refresh,
        success: &'static str,
        conflict: Option<&'static str>,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if let Err(error) = ctx.gate.check() {
            tracing::warn!("structural change refused for facility operator");
            self.notifier
                .notify(Notification::error(STRUCTURE_DENIED_MESSAGE));
            return Err(error);
        }

        let _guard = match InFlightGuard::acquire(&self.in_flight) {
            Ok(guard) => guard,
            Err(error) => {
                self.notifier.notify(Notification::warning(notify::BUSY));
                return Err(error);
            }
        };

        if let Err(error) = validated {
            self.notifier.notify(Notification::error(error.to_string()));
            return Err(error);
        }

        if let Err(error) = write().await {
            let message = match (&error, conflict) {
                (BoardError::Conflict { .. }, Some(message)) => message.to_string(),
                (BoardError::Validation { message, .. }, _) => message.clone(),
                _ => error.to_string(),
            };
            tracing::warn!(%error, "structural change failed");
            self.notifier.notify(Notification::error(message));
            return Err(error);
        }

        self.notifier.notify(Notification::success(success));
        match refresh {
            Refresh::Stages => self.refresh_stages(ctx).await,
            Refresh::Areas => self.refresh_areas(ctx).await,
            Refresh::Nothing => Ok(()),
        }
    }
}
