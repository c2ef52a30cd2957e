//! Structural validation of raw records
//!
//! Presence is checked first for every required field, then each value is
//! converted to its column type. The raw record is never modified.

use hirepipe_common::time::parse_iso8601;
use serde_json::Value;

use super::record::{HireEvent, RawRecord, Rejection, ValidatedRecord};
use super::schema::TargetEntity;

/// Validate one raw record against the entity's shape.
pub fn validate_record(entity: TargetEntity, raw: &RawRecord) -> Result<ValidatedRecord, Rejection> {
    if let Some(missing) = entity
        .required_fields()
        .iter()
        .find(|field| !raw.contains_key(**field))
    {
        return Err(Rejection::MissingField(missing));
    }

    match entity {
        TargetEntity::Departments => Ok(ValidatedRecord::Department {
            department: text_field(raw, "department")?,
        }),
        TargetEntity::Jobs => Ok(ValidatedRecord::Job { job: text_field(raw, "job")? }),
        TargetEntity::HiredEmployees => Ok(ValidatedRecord::HiredEmployee(HireEvent {
            name: text_field(raw, "name")?,
            hire_datetime: timestamp_field(raw, "hire_datetime")?,
            department_id: id_field(raw, "department_id")?,
            job_id: id_field(raw, "job_id")?,
        })),
    }
}

fn text_field(raw: &RawRecord, field: &'static str) -> Result<String, Rejection> {
    match raw.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(Rejection::InvalidType { field, expected: "a string" }),
        None => Err(Rejection::MissingField(field)),
    }
}

fn id_field(raw: &RawRecord, field: &'static str) -> Result<i32, Rejection> {
    let invalid = Rejection::InvalidType { field, expected: "a 32-bit integer" };

    match raw.get(field) {
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or(invalid),
        Some(_) => Err(invalid),
        None => Err(Rejection::MissingField(field)),
    }
}

fn timestamp_field(
    raw: &RawRecord,
    field: &'static str,
) -> Result<chrono::DateTime<chrono::Utc>, Rejection> {
    match raw.get(field) {
        Some(Value::String(value)) => {
            parse_iso8601(value).map_err(|_| Rejection::InvalidTimestamp(format!("{value:?}")))
        },
        Some(other) => Err(Rejection::InvalidTimestamp(other.to_string())),
        None => Err(Rejection::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_valid_department() {
        let record = raw(json!({"department": "Sales"}));
        assert_eq!(
            validate_record(TargetEntity::Departments, &record).unwrap(),
            ValidatedRecord::Department { department: "Sales".to_string() }
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let record = raw(json!({"id": 42, "job": "Engineer", "note": "ignored"}));
        assert_eq!(
            validate_record(TargetEntity::Jobs, &record).unwrap(),
            ValidatedRecord::Job { job: "Engineer".to_string() }
        );
    }

    #[test]
    fn test_valid_hire_event() {
        let record = raw(json!({
            "name": "Ann",
            "hire_datetime": "2021-05-01T00:00:00Z",
            "department_id": 1,
            "job_id": 2
        }));

        let validated = validate_record(TargetEntity::HiredEmployees, &record).unwrap();
        assert_eq!(
            validated,
            ValidatedRecord::HiredEmployee(HireEvent {
                name: "Ann".to_string(),
                hire_datetime: Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap(),
                department_id: 1,
                job_id: 2,
            })
        );
    }

    #[test]
    fn test_missing_field_is_first_absent_required_field() {
        let record = raw(json!({"name": "Ann", "job_id": 2}));
        assert_eq!(
            validate_record(TargetEntity::HiredEmployees, &record).unwrap_err(),
            Rejection::MissingField("hire_datetime")
        );

        let empty = RawRecord::new();
        assert_eq!(
            validate_record(TargetEntity::Departments, &empty).unwrap_err(),
            Rejection::MissingField("department")
        );
    }

    #[test]
    fn test_wrong_entity_shape_is_missing_field() {
        let record = raw(json!({"department": "Sales"}));
        assert_eq!(
            validate_record(TargetEntity::Jobs, &record).unwrap_err(),
            Rejection::MissingField("job")
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        let record = raw(json!({
            "name": "Bob",
            "hire_datetime": "not-a-date",
            "department_id": 1,
            "job_id": 1
        }));
        assert!(matches!(
            validate_record(TargetEntity::HiredEmployees, &record),
            Err(Rejection::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_non_string_timestamp_is_invalid_timestamp() {
        let record = raw(json!({
            "name": "Bob",
            "hire_datetime": 1620000000,
            "department_id": 1,
            "job_id": 1
        }));
        assert_eq!(
            validate_record(TargetEntity::HiredEmployees, &record).unwrap_err(),
            Rejection::InvalidTimestamp("1620000000".to_string())
        );
    }

    #[test]
    fn test_null_values_are_rejected() {
        let record = raw(json!({"department": null}));
        assert_eq!(
            validate_record(TargetEntity::Departments, &record).unwrap_err(),
            Rejection::InvalidType { field: "department", expected: "a string" }
        );
    }

    #[test]
    fn test_id_conversion() {
        let base = json!({
            "name": "Cy",
            "hire_datetime": "2021-01-01T00:00:00",
            "department_id": 1,
            "job_id": 1
        });

        for bad in [json!("1"), json!(1.5), json!(true), json!(4_294_967_296_i64)] {
            let mut record = raw(base.clone());
            record.insert("department_id".to_string(), bad.clone());
            assert_eq!(
                validate_record(TargetEntity::HiredEmployees, &record).unwrap_err(),
                Rejection::InvalidType { field: "department_id", expected: "a 32-bit integer" },
                "{bad} should not convert"
            );
        }
    }

    #[test]
    fn test_offset_timestamp_is_normalized() {
        let record = raw(json!({
            "name": "Di",
            "hire_datetime": "2021-07-01T09:00:00+02:00",
            "department_id": 1,
            "job_id": 1
        }));

        let ValidatedRecord::HiredEmployee(event) =
            validate_record(TargetEntity::HiredEmployees, &record).unwrap()
        else {
            panic!("expected a hire event");
        };
        assert_eq!(event.hire_datetime, Utc.with_ymd_and_hms(2021, 7, 1, 7, 0, 0).unwrap());
    }
}
