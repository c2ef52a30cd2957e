//! Avro container encoding for table snapshots

use apache_avro::{from_value, Reader, Schema, Writer};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::TableRows;
use crate::features::ingestion::TargetEntity;

const DEPARTMENTS_SCHEMA: &str = r#"
{
    "type": "record",
    "name": "departments",
    "namespace": "hirepipe.backup",
    "fields": [
        {"name": "id", "type": "int"},
        {"name": "department", "type": "string"}
    ]
}
"#;

const JOBS_SCHEMA: &str = r#"
{
    "type": "record",
    "name": "jobs",
    "namespace": "hirepipe.backup",
    "fields": [
        {"name": "id", "type": "int"},
        {"name": "job", "type": "string"}
    ]
}
"#;

const HIRED_EMPLOYEES_SCHEMA: &str = r#"
{
    "type": "record",
    "name": "hired_employees",
    "namespace": "hirepipe.backup",
    "fields": [
        {"name": "id", "type": "int"},
        {"name": "name", "type": "string"},
        {"name": "hire_datetime", "type": "string"},
        {"name": "department_id", "type": "int"},
        {"name": "job_id", "type": "int"}
    ]
}
"#;

pub fn schema_for(entity: TargetEntity) -> Result<Schema, apache_avro::Error> {
    let raw = match entity {
        TargetEntity::Departments => DEPARTMENTS_SCHEMA,
        TargetEntity::Jobs => JOBS_SCHEMA,
        TargetEntity::HiredEmployees => HIRED_EMPLOYEES_SCHEMA,
    };
    Schema::parse_str(raw)
}

/// Encode rows into an Avro object container file
pub fn encode(rows: &TableRows) -> Result<Vec<u8>, apache_avro::Error> {
    let schema = schema_for(rows.entity())?;
    match rows {
        TableRows::Departments(rows) => write_rows(&schema, rows),
        TableRows::Jobs(rows) => write_rows(&schema, rows),
        TableRows::HiredEmployees(rows) => write_rows(&schema, rows),
    }
}

/// Decode an Avro object container file written by [`encode`]
pub fn decode(entity: TargetEntity, bytes: &[u8]) -> Result<TableRows, apache_avro::Error> {
    Ok(match entity {
        TargetEntity::Departments => TableRows::Departments(read_rows(bytes)?),
        TargetEntity::Jobs => TableRows::Jobs(read_rows(bytes)?),
        TargetEntity::HiredEmployees => TableRows::HiredEmployees(read_rows(bytes)?),
    })
}

fn write_rows<T: Serialize>(schema: &Schema, rows: &[T]) -> Result<Vec<u8>, apache_avro::Error> {
    let mut writer = Writer::new(schema, Vec::new());
    for row in rows {
        writer.append_ser(row)?;
    }
    writer.into_inner()
}

fn read_rows<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, apache_avro::Error> {
    Reader::new(bytes)?
        .map(|value| from_value::<T>(&value?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DepartmentRow, HiredEmployeeRow, JobRow};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_all_schemas_parse() {
        for entity in TargetEntity::ALL {
            schema_for(entity).unwrap();
        }
    }

    #[test]
    fn test_hired_employees_survive_encoding() {
        let rows = TableRows::HiredEmployees(vec![
            HiredEmployeeRow {
                id: 4535,
                name: "Marcelo Gonzalez".to_string(),
                hire_datetime: Utc.with_ymd_and_hms(2021, 7, 27, 16, 2, 8).unwrap(),
                department_id: 1,
                job_id: 2,
            },
            HiredEmployeeRow {
                id: 4572,
                name: "Lidia Mendez".to_string(),
                hire_datetime: Utc.with_ymd_and_hms(2021, 7, 27, 19, 4, 9).unwrap(),
                department_id: 1,
                job_id: 2,
            },
        ]);

        let bytes = encode(&rows).unwrap();
        assert_eq!(decode(TargetEntity::HiredEmployees, &bytes).unwrap(), rows);
    }

    #[test]
    fn test_timestamp_stored_as_zulu_string() {
        let rows = TableRows::HiredEmployees(vec![HiredEmployeeRow {
            id: 1,
            name: "Ann".to_string(),
            hire_datetime: Utc.with_ymd_and_hms(2021, 1, 15, 9, 0, 0).unwrap(),
            department_id: 1,
            job_id: 1,
        }]);

        let bytes = encode(&rows).unwrap();
        let record = Reader::new(&bytes[..]).unwrap().next().unwrap().unwrap();

        let apache_avro::types::Value::Record(fields) = record else {
            panic!("expected a record");
        };
        let (_, hire_datetime) = fields
            .iter()
            .find(|(name, _)| name == "hire_datetime")
            .unwrap();
        assert_eq!(
            hire_datetime,
            &apache_avro::types::Value::String("2021-01-15T09:00:00Z".to_string())
        );
    }

    #[test]
    fn test_decode_as_wrong_table_fails() {
        let rows = TableRows::Jobs(vec![JobRow { id: 1, job: "Engineer".to_string() }]);
        let bytes = encode(&rows).unwrap();

        assert!(decode(TargetEntity::HiredEmployees, &bytes).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode(TargetEntity::Departments, b"not avro").is_err());
    }

    #[test]
    fn test_departments_keep_ids() {
        let rows = TableRows::Departments(vec![
            DepartmentRow { id: 3, department: "Legal".to_string() },
            DepartmentRow { id: 12, department: "Sales".to_string() },
        ]);

        let bytes = encode(&rows).unwrap();
        assert_eq!(decode(TargetEntity::Departments, &bytes).unwrap(), rows);
    }
}
