use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Report;

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reports (id, user_id, name, date_range_start, date_range_end, blob_key, generated_at, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.id.to_string(),
            report.user_id.to_string(),
            report.name,
            report.date_range_start,
            report.date_range_end,
            report.blob_key,
            report.generated_at,
            report.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, name, date_range_start, date_range_end, blob_key, generated_at, status
         FROM reports WHERE id = ?1",
        params![id.to_string()],
        report_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_reports(conn: &Connection, user_id: &Uuid) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, date_range_start, date_range_end, blob_key, generated_at, status
         FROM reports WHERE user_id = ?1 ORDER BY generated_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], report_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    use std::str::FromStr;
    let status: String = row.get(7)?;
    Ok(Report {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        name: row.get(2)?,
        date_range_start: row.get(3)?,
        date_range_end: row.get(4)?,
        blob_key: row.get(5)?,
        generated_at: row.get::<_, DateTime<Utc>>(6)?,
        status: crate::models::enums::ReportStatus::from_str(&status)
            .unwrap_or(crate::models::enums::ReportStatus::Generated),
    })
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ensure_user;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::ReportStatus;

    #[test]
    fn reports_listed_newest_first() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();

        let older = Report {
            id: Uuid::new_v4(),
            user_id,
            name: "July".into(),
            date_range_start: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            date_range_end: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            blob_key: "reports/july.pdf".into(),
            generated_at: Utc::now() - chrono::Duration::days(1),
            status: ReportStatus::Generated,
        };
        let newer = Report {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            name: "August".into(),
            ..older.clone()
        };

        insert_report(&conn, &older).unwrap();
        insert_report(&conn, &newer).unwrap();

        let listed = list_reports(&conn, &user_id).unwrap();
        assert_eq!(listed[0].name, "August");
        assert_eq!(listed[1].name, "July");
    }
}
