use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::FitnessDataType;
use crate::models::{BloodPressureReading, FitnessDataPoint, MenstruationCycle};

// ── Menstruation cycles ──────────────────────────────────────────────

pub fn insert_cycle(conn: &Connection, cycle: &MenstruationCycle) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO menstruation_cycles (id, user_id, start_date, end_date, flow_intensity, symptoms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            cycle.id.to_string(),
            cycle.user_id.to_string(),
            cycle.start_date,
            cycle.end_date,
            cycle.flow_intensity.map(|v| v.as_str()),
            serde_json::to_string(&cycle.symptoms).unwrap_or_default(),
        ],
    )?;
    Ok(())
}

pub fn get_cycle(conn: &Connection, id: &Uuid) -> Result<Option<MenstruationCycle>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, start_date, end_date, flow_intensity, symptoms
         FROM menstruation_cycles WHERE id = ?1",
        params![id.to_string()],
        cycle_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_cycles_in_range(
    conn: &Connection,
    user_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<MenstruationCycle>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, start_date, end_date, flow_intensity, symptoms
         FROM menstruation_cycles
         WHERE user_id = ?1 AND start_date >= ?2 AND start_date <= ?3
         ORDER BY start_date DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string(), from, to], cycle_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every cycle for the user, most recent first — unlike
/// `list_cycles_in_range`, not windowed to a date range. Used by report
/// generation, which per its own contract reads "all menstruation
/// cycles" rather than only those in the report's date window.
pub fn list_all_cycles(conn: &Connection, user_id: &Uuid) -> Result<Vec<MenstruationCycle>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, start_date, end_date, flow_intensity, symptoms
         FROM menstruation_cycles
         WHERE user_id = ?1
         ORDER BY start_date DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], cycle_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn cycle_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MenstruationCycle> {
    let flow_intensity: Option<String> = row.get(4)?;
    let symptoms: String = row.get(5)?;
    Ok(MenstruationCycle {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        flow_intensity: flow_intensity.and_then(|v| FromStr::from_str(&v).ok()),
        symptoms: serde_json::from_str(&symptoms).unwrap_or_default(),
    })
}

// ── Blood pressure readings ──────────────────────────────────────────

pub fn insert_blood_pressure_reading(conn: &Connection, reading: &BloodPressureReading) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO blood_pressure_readings (id, user_id, systolic, diastolic, pulse, measured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            reading.id.to_string(),
            reading.user_id.to_string(),
            reading.systolic,
            reading.diastolic,
            reading.pulse,
            reading.measured_at,
        ],
    )?;
    Ok(())
}

pub fn list_blood_pressure_readings_in_range(
    conn: &Connection,
    user_id: &Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<BloodPressureReading>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, systolic, diastolic, pulse, measured_at
         FROM blood_pressure_readings
         WHERE user_id = ?1 AND measured_at >= ?2 AND measured_at <= ?3
         ORDER BY measured_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string(), from, to], blood_pressure_reading_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every reading for the user, most recent first — unlike
/// `list_blood_pressure_readings_in_range`, not windowed to a date
/// range. Used by report generation, which per its own contract reads
/// "all blood-pressure readings" rather than only those in the report's
/// date window.
pub fn list_all_blood_pressure_readings(conn: &Connection, user_id: &Uuid) -> Result<Vec<BloodPressureReading>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, systolic, diastolic, pulse, measured_at
         FROM blood_pressure_readings
         WHERE user_id = ?1
         ORDER BY measured_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], blood_pressure_reading_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn blood_pressure_reading_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BloodPressureReading> {
    Ok(BloodPressureReading {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        pulse: row.get(4)?,
        measured_at: row.get(5)?,
    })
}

// ── Fitness data ──────────────────────────────────────────────────────

/// Idempotent on `source_data_id`: a re-ingested point with the same
/// external id is silently skipped rather than duplicated.
pub fn insert_fitness_data_point(conn: &Connection, point: &FitnessDataPoint) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO fitness_data (id, user_id, date, data_type, value, unit, source, source_data_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            point.id.to_string(),
            point.user_id.to_string(),
            point.date,
            point.data_type.as_str(),
            point.value,
            point.unit,
            point.source,
            point.source_data_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn list_fitness_data_in_range(
    conn: &Connection,
    user_id: &Uuid,
    data_type: Option<FitnessDataType>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<FitnessDataPoint>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, data_type, value, unit, source, source_data_id
         FROM fitness_data
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
           AND (?4 IS NULL OR data_type = ?4)
         ORDER BY date ASC",
    )?;

    let rows = stmt.query_map(
        params![user_id.to_string(), from, to, data_type.map(|v| v.as_str())],
        fitness_point_from_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn fitness_point_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FitnessDataPoint> {
    let data_type: String = row.get(3)?;
    Ok(FitnessDataPoint {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        date: row.get(2)?,
        data_type: FromStr::from_str(&data_type).unwrap_or(FitnessDataType::Steps),
        value: row.get(4)?,
        unit: row.get(5)?,
        source: row.get(6)?,
        source_data_id: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ensure_user;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn blood_pressure_reading_rejected_out_of_range_by_constraint() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();

        let reading = BloodPressureReading {
            id: Uuid::new_v4(),
            user_id,
            systolic: 400,
            diastolic: 80,
            pulse: 70,
            measured_at: Utc::now(),
        };

        assert!(insert_blood_pressure_reading(&conn, &reading).is_err());
    }

    #[test]
    fn duplicate_source_data_id_is_ignored_not_duplicated() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();

        let point = FitnessDataPoint {
            id: Uuid::new_v4(),
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            data_type: FitnessDataType::Steps,
            value: 10_000.0,
            unit: "steps".into(),
            source: "healthkit".into(),
            source_data_id: "hk-123".into(),
        };

        assert!(insert_fitness_data_point(&conn, &point).unwrap());

        let duplicate = FitnessDataPoint {
            id: Uuid::new_v4(),
            ..point.clone()
        };
        assert!(!insert_fitness_data_point(&conn, &duplicate).unwrap());

        let listed = list_fitness_data_in_range(
            &conn,
            &user_id,
            None,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        )
        .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
