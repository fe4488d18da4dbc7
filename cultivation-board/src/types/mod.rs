//! Core types for the board engine

mod area;
mod batch;
mod ids;
mod stage;

// Re-export all types
pub use area::{AreaFields, CultivationArea};
pub use batch::{Batch, NewBatch};
pub use ids::{AreaId, BatchId, FacilityId, StageId, TenantId};
pub use stage::{Facility, NewFacility, Stage, StageFields, Tenant};
