use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Medication, MedicationLog};

pub fn insert_medication(conn: &Connection, medication: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, user_id, name, dosage, frequency, start_date, end_date, notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            medication.id.to_string(),
            medication.user_id.to_string(),
            medication.name,
            medication.dosage,
            medication.frequency,
            medication.start_date,
            medication.end_date,
            medication.notes,
            medication.active,
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, name, dosage, frequency, start_date, end_date, notes, active
         FROM medications WHERE id = ?1",
        params![id.to_string()],
        medication_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Lists a user's medications, recomputing `active` against `today` and
/// persisting the recomputed value — "active" drifts with the calendar,
/// not just on write.
pub fn list_medications(conn: &Connection, user_id: &Uuid, today: NaiveDate) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, dosage, frequency, start_date, end_date, notes, active
         FROM medications WHERE user_id = ?1 ORDER BY start_date DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], medication_from_row)?;
    let mut medications = rows.collect::<Result<Vec<_>, _>>()?;

    for medication in medications.iter_mut() {
        let active = Medication::derive_active(medication.end_date, today);
        if active != medication.active {
            conn.execute(
                "UPDATE medications SET active = ?1 WHERE id = ?2",
                params![active, medication.id.to_string()],
            )?;
            medication.active = active;
        }
    }

    Ok(medications)
}

fn medication_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        notes: row.get(7)?,
        active: row.get(8)?,
    })
}

pub fn delete_medication(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM medications WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medication".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn insert_medication_log(conn: &Connection, log: &MedicationLog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication_logs (id, medication_id, taken_at, adherence) VALUES (?1, ?2, ?3, ?4)",
        params![
            log.id.to_string(),
            log.medication_id.to_string(),
            log.taken_at,
            log.adherence,
        ],
    )?;
    Ok(())
}

pub fn list_medication_logs(conn: &Connection, medication_id: &Uuid) -> Result<Vec<MedicationLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, taken_at, adherence FROM medication_logs
         WHERE medication_id = ?1 ORDER BY taken_at DESC",
    )?;

    let rows = stmt.query_map(params![medication_id.to_string()], |row| {
        Ok(MedicationLog {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            medication_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            taken_at: row.get::<_, DateTime<Utc>>(2)?,
            adherence: row.get(3)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
