//! Batch records. Leaf entities the board never mutates.

use super::ids::{AreaId, BatchId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked quantity of product held in one cultivation area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub current_units: i64,
    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub end_type: Option<String>,
    #[serde(default)]
    pub projected_yield: Option<f64>,
    #[serde(default, alias = "advance_to_harvesting_on")]
    pub harvest_date: Option<NaiveDate>,
    pub cultivation_area_id: AreaId,
}

/// Payload for `POST /batches`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBatch {
    pub name: String,
    pub current_units: i64,
    pub end_type: String,
    pub variety: String,
    pub projected_yield: Option<f64>,
    #[serde(rename = "advance_to_harvesting_on")]
    pub harvest_date: Option<NaiveDate>,
    pub cultivation_area_id: AreaId,
}
