//! Board read model: projection and move resolution

mod projection;
mod resolver;

pub use projection::{Board, BoardProjection, StageLane};
pub use resolver::{array_move, resolve, PersistencePlan, Resolution, StageOrder};
