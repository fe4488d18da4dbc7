//! Sync engine: persist a resolved move, then reconcile against the server.
//!
//! There is no rollback. Whatever happens to the plan, the authoritative area
//! list is fetched again afterwards and replaces the local board.

use crate::api::BoardApi;
use crate::board::PersistencePlan;
use crate::error::Result;
use crate::gate::{AreaScope, RequestContext, ScopeHeader};
use crate::notify::{self, Notification, NotificationSink};
use crate::types::{AreaFields, AreaId, CultivationArea, StageId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One server call within a plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncStep<'a> {
    /// `PUT /cultivation-areas/{id}` with the full field snapshot
    UpdateArea { id: AreaId, fields: &'a AreaFields },
    /// `PUT /stages/{id}/cultivation-areas/reorder`
    Reorder { stage: StageId, area_ids: &'a [AreaId] },
}

impl fmt::Display for SyncStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateArea { id, .. } => write!(f, "update area {id}"),
            Self::Reorder { stage, .. } => write!(f, "reorder stage {stage}"),
        }
    }
}

/// The calls a plan expands to, in the order they are issued.
///
/// A transfer reassigns the area before either reorder, so the reorders never
/// reference an area the server still places in another stage.
pub fn steps(plan: &PersistencePlan) -> Vec<SyncStep<'_>> {
    match plan {
        PersistencePlan::Reorder(order) => vec![SyncStep::Reorder {
            stage: order.stage_id,
            area_ids: &order.area_ids,
        }],
        PersistencePlan::Transfer {
            area_id,
            fields,
            source,
            destination,
        } => vec![
            SyncStep::UpdateArea {
                id: *area_id,
                fields,
            },
            SyncStep::Reorder {
                stage: source.stage_id,
                area_ids: &source.area_ids,
            },
            SyncStep::Reorder {
                stage: destination.stage_id,
                area_ids: &destination.area_ids,
            },
        ],
    }
}

/// A value tagged with the generation of the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Fenced<T> {
    pub generation: u64,
    pub value: T,
}

/// What happened when a plan was run
#[derive(Debug)]
pub struct SyncReport {
    /// Calls that succeeded before the plan finished or aborted
    pub steps_completed: usize,
    /// Outcome of the plan itself
    pub committed: Result<()>,
    /// Outcome of the trailing refetch
    pub refreshed: Result<Fenced<Vec<CultivationArea>>>,
}

impl SyncReport {
    pub fn is_committed(&self) -> bool {
        self.committed.is_ok()
    }
}

/// Executes persistence plans and the reconciliation refetch
pub struct SyncEngine {
    api: Arc<dyn BoardApi>,
    generation: AtomicU64,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn BoardApi>) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
        }
    }

    /// Stamp a new request generation. Later stamps always compare greater.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Issue the plan's calls strictly one after another.
    ///
    /// Returns how many calls succeeded, and the error that aborted the rest.
    pub async fn execute(
        &self,
        plan: &PersistencePlan,
        scope: Option<&ScopeHeader>,
    ) -> (usize, Result<()>) {
        let mut completed = 0;
        for step in steps(plan) {
            tracing::debug!(%step, "sync step");
            let result = match step {
                SyncStep::UpdateArea { id, fields } => {
                    self.api.update_area(id, fields, scope).await
                }
                SyncStep::Reorder { stage, area_ids } => {
                    self.api.reorder_areas(stage, area_ids, scope).await
                }
            };

            if let Err(error) = result {
                tracing::warn!(%step, completed, %error, "sync step failed, aborting plan");
                return (completed, Err(error));
            }
            completed += 1;
        }
        (completed, Ok(()))
    }

    /// Fetch the authoritative area list, stamped with a fresh generation
    pub async fn reconcile(
        &self,
        areas: AreaScope,
        scope: Option<&ScopeHeader>,
    ) -> Result<Fenced<Vec<CultivationArea>>> {
        let generation = self.next_generation();
        let value = self.api.list_areas(areas, scope).await?;
        tracing::debug!(generation, count = value.len(), "reconciled areas");
        Ok(Fenced { generation, value })
    }

    /// Execute a plan, notify the outcome, then refetch unconditionally
    pub async fn run(
        &self,
        plan: &PersistencePlan,
        ctx: &RequestContext,
        notifier: &dyn NotificationSink,
    ) -> SyncReport {
        let scope = ctx.scope.as_ref();
        let (steps_completed, committed) = self.execute(plan, scope).await;

        match &committed {
            Ok(()) => {
                tracing::info!(stages = ?plan.touched_stages(), "move committed");
                notifier.notify(Notification::success(notify::AREA_MOVED));
            }
            Err(error) => {
                tracing::error!(%error, steps_completed, "move failed, reloading areas");
                notifier.notify(Notification::error(notify::MOVE_FAILED));
            }
        }

        let refreshed = self.reconcile(ctx.areas, scope).await;
        if let Err(error) = &refreshed {
            tracing::warn!(%error, "refetch after move failed");
            notifier.notify(Notification::error(notify::AREAS_LOAD_FAILED));
        }

        SyncReport {
            steps_completed,
            committed,
            refreshed,
        }
    }
}
