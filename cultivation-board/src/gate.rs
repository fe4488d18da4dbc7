//! Per-call request context: permission gate, scope header and area scope.
//!
//! All of these are resolved by the enclosing application and handed to each
//! operation explicitly; nothing here is ambient state.

use crate::error::{BoardError, Result};
use crate::types::FacilityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Denial message shown when a facility operator tries to drag
pub const DRAG_DENIED_MESSAGE: &str =
    "You do not have permission to move areas as a facility operator.";

/// Denial message for any other structural change
pub const STRUCTURE_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";

/// Switch that blocks structural mutation for facility-scoped operators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGate {
    facility_operator: bool,
}

impl PermissionGate {
    /// Gate for a caller who may mutate structure
    pub fn open() -> Self {
        Self {
            facility_operator: false,
        }
    }

    /// Gate for a facility-scoped operator
    pub fn facility_operator() -> Self {
        Self {
            facility_operator: true,
        }
    }

    pub fn from_operator_flag(facility_operator: bool) -> Self {
        Self { facility_operator }
    }

    pub fn is_facility_operator(&self) -> bool {
        self.facility_operator
    }

    pub fn allows_structure(&self) -> bool {
        !self.facility_operator
    }

    /// Fail with a permission error when structure changes are blocked
    pub fn check(&self) -> Result<()> {
        if self.allows_structure() {
            Ok(())
        } else {
            Err(BoardError::permission_denied(STRUCTURE_DENIED_MESSAGE))
        }
    }
}

/// Opaque tenant scope value sent with every call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeHeader(String);

impl ScopeHeader {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which area list is authoritative for the current view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AreaScope {
    /// `GET /cultivation-areas`
    #[default]
    All,
    /// `GET /facilities/{id}/cultivation-areas`
    Facility(FacilityId),
}

/// Everything an operation needs to know about its caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub scope: Option<ScopeHeader>,
    pub gate: PermissionGate,
    pub areas: AreaScope,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(ScopeHeader::new(scope));
        self
    }

    pub fn with_gate(mut self, gate: PermissionGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_facility(mut self, facility: impl Into<FacilityId>) -> Self {
        self.areas = AreaScope::Facility(facility.into());
        self
    }
}
