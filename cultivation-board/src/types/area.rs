//! Cultivation area records

use super::batch::Batch;
use super::ids::{AreaId, FacilityId, StageId};
use serde::{Deserialize, Serialize};

/// A location holding batches. Belongs to exactly one stage at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultivationArea {
    pub id: AreaId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity_units: Option<i64>,
    #[serde(default)]
    pub capacity_unit_type: Option<String>,
    pub facility_id: FacilityId,
    pub current_stage_id: StageId,
    #[serde(default)]
    pub order: i64,
    /// Loaded on demand; empty unless explicitly fetched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batches: Vec<Batch>,
}

impl CultivationArea {
    /// Create an area with only the fields the board cares about
    pub fn new(
        id: impl Into<AreaId>,
        name: impl Into<String>,
        facility_id: impl Into<FacilityId>,
        current_stage_id: impl Into<StageId>,
        order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            capacity_units: None,
            capacity_unit_type: None,
            facility_id: facility_id.into(),
            current_stage_id: current_stage_id.into(),
            order,
            batches: Vec::new(),
        }
    }

    /// Full snapshot of the mutable fields, as sent to `PUT /cultivation-areas/{id}`
    pub fn fields(&self) -> AreaFields {
        AreaFields {
            name: self.name.clone(),
            description: self.description.clone(),
            capacity_units: self.capacity_units,
            capacity_unit_type: self.capacity_unit_type.clone(),
            facility_id: self.facility_id,
            current_stage_id: self.current_stage_id,
            order: Some(self.order),
        }
    }
}

/// The full mutable field set of an area.
///
/// Always sent whole so the server never has to guess which fields a partial
/// update meant to clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaFields {
    pub name: String,
    pub description: Option<String>,
    pub capacity_units: Option<i64>,
    pub capacity_unit_type: Option<String>,
    pub facility_id: FacilityId,
    pub current_stage_id: StageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl AreaFields {
    /// Create a payload for a new area in the given stage; the server assigns order
    pub fn new(
        name: impl Into<String>,
        facility_id: impl Into<FacilityId>,
        current_stage_id: impl Into<StageId>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            capacity_units: None,
            capacity_unit_type: None,
            facility_id: facility_id.into(),
            current_stage_id: current_stage_id.into(),
            order: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_capacity(mut self, units: i64, unit_type: impl Into<String>) -> Self {
        self.capacity_units = Some(units);
        self.capacity_unit_type = Some(unit_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_deserializes_server_shape() {
        let area: CultivationArea = serde_json::from_value(serde_json::json!({
            "id": 10,
            "name": "Room 3",
            "description": null,
            "capacity_units": 40,
            "capacity_unit_type": "plants",
            "facility_id": 2,
            "current_stage_id": 5,
            "order": 1,
            "created_at": "2025-07-01T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(area.id, AreaId::new(10));
        assert_eq!(area.capacity_units, Some(40));
        assert_eq!(area.current_stage_id, StageId::new(5));
        assert!(area.batches.is_empty());
    }

    #[test]
    fn test_fields_snapshot_is_complete() {
        let mut area = CultivationArea::new(1, "Mother room", 2, 3, 4);
        area.description = Some("north wing".into());
        let json = serde_json::to_value(area.fields()).unwrap();

        assert_eq!(json["name"], "Mother room");
        assert_eq!(json["description"], "north wing");
        assert_eq!(json["capacity_units"], serde_json::Value::Null);
        assert_eq!(json["facility_id"], 2);
        assert_eq!(json["current_stage_id"], 3);
        assert_eq!(json["order"], 4);
    }
}
