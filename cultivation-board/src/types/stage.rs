//! Stage, facility and tenant records

use super::ids::{FacilityId, StageId, TenantId};
use serde::{Deserialize, Serialize};

/// An ordered phase of the cultivation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

impl Stage {
    /// Create a stage record
    pub fn new(id: impl Into<StageId>, name: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }
}

/// Payload for creating or renaming a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
}

impl StageFields {
    /// Create a stage payload with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tenant_id: None,
        }
    }

    /// Attach the owning tenant, required when a global administrator acts
    pub fn with_tenant(mut self, tenant_id: impl Into<TenantId>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// A physical site owned by a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// Payload for creating a facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFacility {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
}

/// A customer organisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_defaults_to_zero() {
        let stage: Stage = serde_json::from_str(r#"{"id": 3, "name": "Drying"}"#).unwrap();
        assert_eq!(stage.order, 0);
        assert_eq!(stage.id, StageId::new(3));
    }

    #[test]
    fn test_stage_fields_omit_missing_tenant() {
        let json = serde_json::to_value(StageFields::new("Vegetation")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Vegetation"}));

        let json = serde_json::to_value(StageFields::new("Vegetation").with_tenant(4)).unwrap();
        assert_eq!(json["tenant_id"], 4);
    }
}
