//! Move resolution: turn a move intent into a new board and a persistence plan

use super::projection::Board;
use crate::drag::{DropTarget, MoveIntent};
use crate::error::{BoardError, Result};
use crate::types::{AreaFields, AreaId, StageId};
use serde::Serialize;

/// The full ordered id list of one stage, as sent to the reorder endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOrder {
    pub stage_id: StageId,
    pub area_ids: Vec<AreaId>,
}

/// What has to be written to the server to commit a resolved move
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistencePlan {
    /// Same-stage move: one reorder call
    Reorder(StageOrder),
    /// Cross-stage move: update the area, then reorder source, then destination
    Transfer {
        area_id: AreaId,
        fields: AreaFields,
        source: StageOrder,
        destination: StageOrder,
    },
}

impl PersistencePlan {
    /// Number of sequential calls the plan needs
    pub fn call_count(&self) -> usize {
        match self {
            Self::Reorder(_) => 1,
            Self::Transfer { .. } => 3,
        }
    }

    /// Stages whose order changes
    pub fn touched_stages(&self) -> Vec<StageId> {
        match self {
            Self::Reorder(order) => vec![order.stage_id],
            Self::Transfer {
                source,
                destination,
                ..
            } => vec![source.stage_id, destination.stage_id],
        }
    }
}

/// Outcome of resolving an intent against a board
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The drop lands where the area already is
    Unchanged,
    /// A new board plus the writes that commit it
    Moved { board: Board, plan: PersistencePlan },
}

/// Stable array move: remove the element at `from`, insert it at `to`.
///
/// `to` is interpreted against the array after removal and clamped to its end.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// Resolve a move intent against the current board.
///
/// Pure: the input board is untouched, the returned board is a patched clone.
pub fn resolve(board: &Board, intent: &MoveIntent) -> Result<Resolution> {
    let Some((source_lane, source_index)) = board.locate(intent.active) else {
        tracing::error!(area = %intent.active, "dragged area is not on the board");
        return Err(BoardError::area_not_found(intent.active));
    };

    let destination_stage = match intent.over {
        DropTarget::Stage(stage_id) => stage_id,
        DropTarget::Area(area_id) => match board.stage_of(area_id) {
            Some(stage_id) => stage_id,
            None => {
                tracing::error!(area = %area_id, "drop target area is not on the board");
                return Err(BoardError::area_not_found(area_id));
            }
        },
    };

    let Some(destination_lane) = board.lane_index(destination_stage) else {
        tracing::error!(stage = %destination_stage, "destination stage is not on the board");
        return Err(BoardError::stage_not_found(destination_stage));
    };

    let destination_areas = &board.lanes()[destination_lane].areas;
    let destination_index = if destination_areas.is_empty() {
        0
    } else {
        match intent.over {
            DropTarget::Area(area_id) => destination_areas
                .iter()
                .position(|a| a.id == area_id)
                .unwrap_or(destination_areas.len()),
            DropTarget::Stage(_) => destination_areas.len(),
        }
    };

    if source_lane == destination_lane {
        resolve_within_stage(board, source_lane, source_index, destination_index)
    } else {
        resolve_across_stages(
            board,
            source_lane,
            source_index,
            destination_lane,
            destination_index,
        )
    }
}

fn resolve_within_stage(
    board: &Board,
    lane_idx: usize,
    source_index: usize,
    destination_index: usize,
) -> Result<Resolution> {
    let last = board.lanes()[lane_idx].areas.len().saturating_sub(1);
    let destination_index = destination_index.min(last);
    if destination_index == source_index {
        return Ok(Resolution::Unchanged);
    }

    let mut next = board.clone();
    let lane = &mut next.lanes_mut()[lane_idx];
    array_move(&mut lane.areas, source_index, destination_index);
    lane.renumber();

    let plan = PersistencePlan::Reorder(StageOrder {
        stage_id: lane.stage.id,
        area_ids: lane.area_ids(),
    });
    Ok(Resolution::Moved { board: next, plan })
}

fn resolve_across_stages(
    board: &Board,
    source_lane: usize,
    source_index: usize,
    destination_lane: usize,
    destination_index: usize,
) -> Result<Resolution> {
    let mut next = board.clone();
    let lanes = next.lanes_mut();

    let mut moved = lanes[source_lane].areas.remove(source_index);
    lanes[source_lane].renumber();

    let destination_stage = lanes[destination_lane].stage.id;
    moved.current_stage_id = destination_stage;
    let area_id = moved.id;
    let insert_at = destination_index.min(lanes[destination_lane].areas.len());
    lanes[destination_lane].areas.insert(insert_at, moved);
    lanes[destination_lane].renumber();

    let fields = lanes[destination_lane].areas[insert_at].fields();
    let source = StageOrder {
        stage_id: lanes[source_lane].stage.id,
        area_ids: lanes[source_lane].area_ids(),
    };
    let destination = StageOrder {
        stage_id: destination_stage,
        area_ids: lanes[destination_lane].area_ids(),
    };

    Ok(Resolution::Moved {
        board: next,
        plan: PersistencePlan::Transfer {
            area_id,
            fields,
            source,
            destination,
        },
    })
}
