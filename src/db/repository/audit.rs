use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::AuditOperationType;
use crate::models::AuditLog;

/// Append-only: no `update`/`delete` in this repository.
pub fn insert_audit_log(conn: &Connection, entry: &AuditLog) -> Result<(), DatabaseError> {
    let additional_data = entry
        .additional_data
        .as_ref()
        .map(|v| serde_json::to_string(v).unwrap_or_default());

    conn.execute(
        "INSERT INTO audit_log (id, user_id, operation_type, resource_type, resource_id, timestamp, ip_address, user_agent, additional_data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.id.to_string(),
            entry.user_id.to_string(),
            entry.operation_type.as_str(),
            entry.resource_type,
            entry.resource_id,
            entry.timestamp,
            entry.ip_address,
            entry.user_agent,
            additional_data,
        ],
    )?;
    Ok(())
}

pub fn list_audit_log(conn: &Connection, user_id: &Uuid) -> Result<Vec<AuditLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, operation_type, resource_type, resource_id, timestamp, ip_address, user_agent, additional_data
         FROM audit_log WHERE user_id = ?1 ORDER BY timestamp DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], audit_log_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn audit_log_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditLog> {
    let operation_type: String = row.get(2)?;
    let additional_data: Option<String> = row.get(8)?;
    Ok(AuditLog {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        operation_type: AuditOperationType::from_str(&operation_type).unwrap_or(AuditOperationType::Create),
        resource_type: row.get(3)?,
        resource_id: row.get(4)?,
        timestamp: row.get::<_, DateTime<Utc>>(5)?,
        ip_address: row.get(6)?,
        user_agent: row.get(7)?,
        additional_data: additional_data.and_then(|s| serde_json::from_str(&s).ok()),
    })
}
