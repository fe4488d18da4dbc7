//! Local field validation run before structural writes

use crate::error::{BoardError, Result};
use crate::types::{AreaFields, NewBatch, NewFacility, StageFields};

/// Longest accepted display name
pub const MAX_NAME_LENGTH: usize = 100;

const FORBIDDEN_NAME_CHARS: [char; 4] = ['<', '>', '{', '}'];

/// Names are required, bounded, and free of markup characters
pub fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BoardError::validation(field, "is required"));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(BoardError::validation(
            field,
            format!("cannot exceed {MAX_NAME_LENGTH} characters"),
        ));
    }
    if value.contains(FORBIDDEN_NAME_CHARS) {
        return Err(BoardError::validation(
            field,
            "cannot contain special characters such as <, > or {}",
        ));
    }
    Ok(())
}

pub fn validate_stage(fields: &StageFields) -> Result<()> {
    validate_name("name", &fields.name)
}

pub fn validate_facility(facility: &NewFacility) -> Result<()> {
    validate_name("name", &facility.name)
}

pub fn validate_area(fields: &AreaFields) -> Result<()> {
    validate_name("name", &fields.name)?;
    if let Some(units) = fields.capacity_units {
        if units < 0 {
            return Err(BoardError::validation(
                "capacity_units",
                "cannot be negative",
            ));
        }
    }
    Ok(())
}

pub fn validate_batch(batch: &NewBatch) -> Result<()> {
    validate_name("name", &batch.name)?;
    if batch.current_units < 0 {
        return Err(BoardError::validation("current_units", "cannot be negative"));
    }
    if batch.end_type.trim().is_empty() {
        return Err(BoardError::validation("end_type", "is required"));
    }
    if batch.variety.trim().is_empty() {
        return Err(BoardError::validation("variety", "is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AreaId;

    fn field_of(err: BoardError) -> String {
        match err {
            BoardError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_name_rules() {
        assert!(validate_name("name", "Flower room 2").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"a".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name("name", &"a".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_name("name", "<script>").is_err());
        assert!(validate_name("name", "room {1}").is_err());
    }

    #[test]
    fn test_area_capacity_must_not_be_negative() {
        let mut fields = AreaFields::new("Room", 1, 1);
        assert!(validate_area(&fields).is_ok());
        fields.capacity_units = Some(-1);
        assert_eq!(field_of(validate_area(&fields).unwrap_err()), "capacity_units");
    }

    #[test]
    fn test_batch_requires_variety_and_end_type() {
        let batch = NewBatch {
            name: "LoteA".into(),
            current_units: 10,
            end_type: "".into(),
            variety: "Blue Dream".into(),
            projected_yield: None,
            harvest_date: None,
            cultivation_area_id: AreaId::new(1),
        };
        assert_eq!(field_of(validate_batch(&batch).unwrap_err()), "end_type");

        let batch = NewBatch {
            end_type: "harvest".into(),
            variety: " ".into(),
            ..batch
        };
        assert_eq!(field_of(validate_batch(&batch).unwrap_err()), "variety");
    }
}
