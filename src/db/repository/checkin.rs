use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{MessageRole, SessionStatus};
use crate::models::{HealthCheckIn, Message, Session, User};

// ── Users ────────────────────────────────────────────────────────────

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, created_at, deleted_at) VALUES (?1, ?2, ?3)",
        params![user.id.to_string(), user.created_at, user.deleted_at],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        "SELECT id, created_at, deleted_at FROM users WHERE id = ?1",
        params![id.to_string()],
        |row| {
            Ok(User {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                created_at: row.get(1)?,
                deleted_at: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Inserts the user row if it does not already exist (first check-in).
pub fn ensure_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    if get_user(conn, id)?.is_none() {
        insert_user(conn, &User::new(*id))?;
    }
    Ok(())
}

pub fn soft_delete_user(conn: &Connection, id: &Uuid, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET deleted_at = ?1 WHERE id = ?2",
        params![now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ── Sessions ─────────────────────────────────────────────────────────

pub fn insert_session(conn: &Connection, session: &Session) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO check_in_sessions (id, user_id, started_at, completed_at, expired_at, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            session.id.to_string(),
            session.user_id.to_string(),
            session.started_at,
            session.completed_at,
            session.expired_at,
            session.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_session(conn: &Connection, id: &Uuid) -> Result<Option<Session>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, started_at, completed_at, expired_at, status
         FROM check_in_sessions WHERE id = ?1",
        params![id.to_string()],
        session_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let status: String = row.get(5)?;
    Ok(Session {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        started_at: row.get(2)?,
        completed_at: row.get(3)?,
        expired_at: row.get(4)?,
        status: SessionStatus::from_str(&status).unwrap_or(SessionStatus::Active),
    })
}

pub fn mark_session_expired(
    conn: &Connection,
    id: &Uuid,
    expired_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE check_in_sessions SET status = 'expired', expired_at = ?1 WHERE id = ?2",
        params![expired_at, id.to_string()],
    )?;
    Ok(())
}

pub fn mark_session_completed(
    conn: &Connection,
    id: &Uuid,
    completed_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE check_in_sessions SET status = 'completed', completed_at = ?1 WHERE id = ?2",
        params![completed_at, id.to_string()],
    )?;
    Ok(())
}

// ── Messages ─────────────────────────────────────────────────────────

/// The source of truth for "which question comes next" — the count of
/// assistant messages recorded so far, not any in-memory cursor.
pub fn count_assistant_messages(conn: &Connection, session_id: &Uuid) -> Result<i64, DatabaseError> {
    conn.query_row(
        "SELECT COUNT(*) FROM conversation_messages WHERE session_id = ?1 AND role = 'assistant'",
        params![session_id.to_string()],
        |row| row.get(0),
    )
    .map_err(DatabaseError::from)
}

/// Inserts a message, assigning the next `sequence` number for the
/// session so ties in `created_at` resolve by insertion order.
pub fn insert_message(conn: &Connection, session_id: &Uuid, role: MessageRole, content: &str, audio_blob_key: Option<&str>) -> Result<Message, DatabaseError> {
    let next_sequence: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM conversation_messages WHERE session_id = ?1",
        params![session_id.to_string()],
        |row| row.get(0),
    )?;

    let message = Message {
        id: Uuid::new_v4(),
        session_id: *session_id,
        role,
        content: content.to_string(),
        audio_blob_key: audio_blob_key.map(|s| s.to_string()),
        created_at: Utc::now(),
        sequence: next_sequence,
    };

    conn.execute(
        "INSERT INTO conversation_messages (id, session_id, role, content, audio_blob_key, created_at, sequence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            message.id.to_string(),
            message.session_id.to_string(),
            message.role.as_str(),
            message.content,
            message.audio_blob_key,
            message.created_at,
            message.sequence,
        ],
    )?;

    Ok(message)
}

/// Messages for a session, ordered ascending by `created_at` (ties broken
/// by `sequence`, i.e. insertion order).
pub fn list_messages(conn: &Connection, session_id: &Uuid) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, role, content, audio_blob_key, created_at, sequence
         FROM conversation_messages WHERE session_id = ?1 ORDER BY created_at ASC, sequence ASC",
    )?;

    let rows = stmt.query_map(params![session_id.to_string()], message_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    Ok(Message {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        session_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        role: MessageRole::from_str(&role).unwrap_or(MessageRole::User),
        content: row.get(3)?,
        audio_blob_key: row.get(4)?,
        created_at: row.get(5)?,
        sequence: row.get(6)?,
    })
}

// ── Health check-ins ─────────────────────────────────────────────────

/// Atomic at the row level: a single `INSERT`.
pub fn insert_health_check_in(conn: &Connection, check_in: &HealthCheckIn) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO health_check_ins (
            id, user_id, session_id, check_in_date, symptoms, mood, pain_level, energy_level,
            sleep_quality, medication_taken, physical_activity, breakfast, lunch, dinner,
            general_feeling, additional_notes, raw_transcript, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            check_in.id.to_string(),
            check_in.user_id.to_string(),
            check_in.session_id.to_string(),
            check_in.check_in_date,
            serde_json::to_string(&check_in.symptoms).unwrap_or_default(),
            check_in.mood.map(|v| v.as_str()),
            check_in.pain_level,
            check_in.energy_level.map(|v| v.as_str()),
            check_in.sleep_quality.map(|v| v.as_str()),
            check_in.medication_taken.map(|v| v.as_str()),
            serde_json::to_string(&check_in.physical_activity).unwrap_or_default(),
            check_in.breakfast,
            check_in.lunch,
            check_in.dinner,
            check_in.general_feeling,
            check_in.additional_notes,
            check_in.raw_transcript,
            check_in.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_health_check_in(conn: &Connection, id: &Uuid) -> Result<Option<HealthCheckIn>, DatabaseError> {
    conn.query_row(
        "SELECT id, user_id, session_id, check_in_date, symptoms, mood, pain_level, energy_level,
         sleep_quality, medication_taken, physical_activity, breakfast, lunch, dinner,
         general_feeling, additional_notes, raw_transcript, created_at
         FROM health_check_ins WHERE id = ?1",
        params![id.to_string()],
        health_check_in_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Health check-ins for a user within `[from, to]` inclusive, ordered
/// ascending by `check_in_date` (used by Dashboard/Report services).
pub fn list_health_check_ins_in_range(
    conn: &Connection,
    user_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<HealthCheckIn>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, session_id, check_in_date, symptoms, mood, pain_level, energy_level,
         sleep_quality, medication_taken, physical_activity, breakfast, lunch, dinner,
         general_feeling, additional_notes, raw_transcript, created_at
         FROM health_check_ins
         WHERE user_id = ?1 AND check_in_date >= ?2 AND check_in_date <= ?3
         ORDER BY check_in_date ASC",
    )?;

    let rows = stmt.query_map(
        params![user_id.to_string(), from, to],
        health_check_in_from_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn health_check_in_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HealthCheckIn> {
    let symptoms: String = row.get(4)?;
    let mood: Option<String> = row.get(5)?;
    let energy_level: Option<String> = row.get(7)?;
    let sleep_quality: Option<String> = row.get(8)?;
    let medication_taken: Option<String> = row.get(9)?;
    let physical_activity: String = row.get(10)?;

    Ok(HealthCheckIn {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        session_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        check_in_date: row.get(3)?,
        symptoms: serde_json::from_str(&symptoms).unwrap_or_default(),
        mood: mood.and_then(|m| FromStr::from_str(&m).ok()),
        pain_level: row.get::<_, Option<i64>>(6)?.map(|v| v as u8),
        energy_level: energy_level.and_then(|e| FromStr::from_str(&e).ok()),
        sleep_quality: sleep_quality.and_then(|s| FromStr::from_str(&s).ok()),
        medication_taken: medication_taken.and_then(|m| FromStr::from_str(&m).ok()),
        physical_activity: serde_json::from_str(&physical_activity).unwrap_or_default(),
        breakfast: row.get(11)?,
        lunch: row.get(12)?,
        dinner: row.get(13)?,
        general_feeling: row.get(14)?,
        additional_notes: row.get(15)?,
        raw_transcript: row.get(16)?,
        created_at: row.get(17)?,
    })
}

pub fn delete_user_scoped(conn: &Connection, table: &str, user_id: &Uuid) -> Result<usize, DatabaseError> {
    let sql = format!("DELETE FROM {table} WHERE user_id = ?1");
    conn.execute(&sql, params![user_id.to_string()])
        .map_err(DatabaseError::from)
}

pub fn count_user_scoped(conn: &Connection, table: &str, user_id: &Uuid) -> Result<i64, DatabaseError> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1");
    conn.query_row(&sql, params![user_id.to_string()], |row| row.get(0))
        .map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn session_created_with_fresh_distinct_id() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();
        let s1 = Session::new(user_id);
        let s2 = Session::new(user_id);
        insert_session(&conn, &s1).unwrap();
        insert_session(&conn, &s2).unwrap();
        assert_ne!(s1.id, s2.id);
    }

    #[test]
    fn assistant_message_count_is_source_of_truth() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();
        let session = Session::new(user_id);
        insert_session(&conn, &session).unwrap();

        assert_eq!(count_assistant_messages(&conn, &session.id).unwrap(), 0);
        insert_message(&conn, &session.id, MessageRole::Assistant, "q1", None).unwrap();
        assert_eq!(count_assistant_messages(&conn, &session.id).unwrap(), 1);
        insert_message(&conn, &session.id, MessageRole::User, "a1", None).unwrap();
        assert_eq!(count_assistant_messages(&conn, &session.id).unwrap(), 1);
    }

    #[test]
    fn messages_ordered_ascending_by_sequence() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();
        let session = Session::new(user_id);
        insert_session(&conn, &session).unwrap();

        insert_message(&conn, &session.id, MessageRole::Assistant, "q1", None).unwrap();
        insert_message(&conn, &session.id, MessageRole::User, "a1", None).unwrap();
        insert_message(&conn, &session.id, MessageRole::Assistant, "q2", None).unwrap();

        let messages = list_messages(&conn, &session.id).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "q1");
        assert_eq!(messages[1].content, "a1");
        assert_eq!(messages[2].content, "q2");
    }
}
