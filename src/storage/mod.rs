//! Async façade over the synchronous repository layer.
//!
//! Every operation takes a `CancellationToken`: SQLite calls aren't
//! individually interruptible, so cancellation is honored by refusing to
//! *admit* a new blocking call once the token has fired, not by
//! interrupting one already running. Each call executes on the blocking
//! thread pool via `spawn_blocking` so the pool's connections are never
//! held across an `.await`.

use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::repository;
use crate::db::{DatabaseError, DbPool};
use crate::models::enums::{FitnessDataType, MessageRole};
use crate::models::{
    AuditLog, BloodPressureReading, FitnessDataPoint, HealthCheckIn, Medication, MedicationLog, MenstruationCycle,
    Message, Report, Session, User,
};

#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(1);

/// Runs `f` on the blocking pool after checking for cancellation, so a
/// cancelled request never occupies a pooled connection. Logs at warn
/// if the round trip (pool checkout plus query) exceeds one second.
async fn run_blocking<T, F>(pool: DbPool, cancel: &CancellationToken, f: F) -> Result<T, DatabaseError>
where
    F: FnOnce(&rusqlite::Connection) -> Result<T, DatabaseError> + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(DatabaseError::Cancelled);
    }

    let start = Instant::now();

    let result = tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await;

    let elapsed = start.elapsed();
    if elapsed > SLOW_QUERY_THRESHOLD {
        tracing::warn!(duration_ms = elapsed.as_millis() as u64, "slow database query");
    }

    match result {
        Ok(inner) => inner,
        Err(join_error) => Err(DatabaseError::ConstraintViolation(format!(
            "blocking task panicked: {join_error}"
        ))),
    }
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // ── Users ────────────────────────────────────────────────────────

    pub async fn ensure_user(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::ensure_user(conn, &id)).await
    }

    pub async fn get_user(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<User>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::get_user(conn, &id)).await
    }

    pub async fn soft_delete_user(&self, id: Uuid, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::soft_delete_user(conn, &id, now)).await
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub async fn insert_session(&self, session: Session, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_session(conn, &session)).await
    }

    pub async fn get_session(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Session>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::get_session(conn, &id)).await
    }

    pub async fn mark_session_expired(&self, id: Uuid, expired_at: DateTime<Utc>, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::mark_session_expired(conn, &id, expired_at)).await
    }

    pub async fn mark_session_completed(&self, id: Uuid, completed_at: DateTime<Utc>, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::mark_session_completed(conn, &id, completed_at)).await
    }

    // ── Messages ─────────────────────────────────────────────────────

    pub async fn count_assistant_messages(&self, session_id: Uuid, cancel: &CancellationToken) -> Result<i64, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::count_assistant_messages(conn, &session_id)).await
    }

    pub async fn insert_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: String,
        audio_blob_key: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<Message, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            repository::insert_message(conn, &session_id, role, &content, audio_blob_key.as_deref())
        })
        .await
    }

    pub async fn list_messages(&self, session_id: Uuid, cancel: &CancellationToken) -> Result<Vec<Message>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_messages(conn, &session_id)).await
    }

    // ── Health check-ins ─────────────────────────────────────────────

    pub async fn insert_health_check_in(&self, check_in: HealthCheckIn, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_health_check_in(conn, &check_in)).await
    }

    pub async fn list_health_check_ins_in_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<HealthCheckIn>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            repository::list_health_check_ins_in_range(conn, &user_id, from, to)
        })
        .await
    }

    // ── Medications ──────────────────────────────────────────────────

    pub async fn insert_medication(&self, medication: Medication, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_medication(conn, &medication)).await
    }

    pub async fn get_medication(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Medication>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::get_medication(conn, &id)).await
    }

    pub async fn list_medications(&self, user_id: Uuid, today: NaiveDate, cancel: &CancellationToken) -> Result<Vec<Medication>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_medications(conn, &user_id, today)).await
    }

    pub async fn delete_medication(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::delete_medication(conn, &id)).await
    }

    pub async fn insert_medication_log(&self, log: MedicationLog, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_medication_log(conn, &log)).await
    }

    pub async fn list_medication_logs(&self, medication_id: Uuid, cancel: &CancellationToken) -> Result<Vec<MedicationLog>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_medication_logs(conn, &medication_id)).await
    }

    // ── Health data ──────────────────────────────────────────────────

    pub async fn insert_cycle(&self, cycle: MenstruationCycle, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_cycle(conn, &cycle)).await
    }

    pub async fn list_cycles_in_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<MenstruationCycle>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_cycles_in_range(conn, &user_id, from, to)).await
    }

    pub async fn list_all_cycles(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<MenstruationCycle>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_all_cycles(conn, &user_id)).await
    }

    pub async fn insert_blood_pressure_reading(&self, reading: BloodPressureReading, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            repository::insert_blood_pressure_reading(conn, &reading)
        })
        .await
    }

    pub async fn list_blood_pressure_readings_in_range(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<BloodPressureReading>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            repository::list_blood_pressure_readings_in_range(conn, &user_id, from, to)
        })
        .await
    }

    pub async fn list_all_blood_pressure_readings(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<BloodPressureReading>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_all_blood_pressure_readings(conn, &user_id)).await
    }

    pub async fn insert_fitness_data_point(&self, point: FitnessDataPoint, cancel: &CancellationToken) -> Result<bool, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_fitness_data_point(conn, &point)).await
    }

    pub async fn list_fitness_data_in_range(
        &self,
        user_id: Uuid,
        data_type: Option<FitnessDataType>,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<FitnessDataPoint>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            repository::list_fitness_data_in_range(conn, &user_id, data_type, from, to)
        })
        .await
    }

    // ── Dashboard ────────────────────────────────────────────────────

    pub async fn dashboard_aggregate(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<repository::DashboardAggregate, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::aggregate(conn, &user_id, from, to)).await
    }

    // ── Reports ──────────────────────────────────────────────────────

    pub async fn insert_report(&self, report: Report, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_report(conn, &report)).await
    }

    pub async fn get_report(&self, id: Uuid, cancel: &CancellationToken) -> Result<Option<Report>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::get_report(conn, &id)).await
    }

    pub async fn list_reports(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<Report>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_reports(conn, &user_id)).await
    }

    // ── Audit ────────────────────────────────────────────────────────

    pub async fn insert_audit_log(&self, entry: AuditLog, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::insert_audit_log(conn, &entry)).await
    }

    pub async fn list_audit_log(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<AuditLog>, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| repository::list_audit_log(conn, &user_id)).await
    }

    /// Single transaction: deletes every user-owned row across six
    /// tables (children cascade), then soft-deletes `users`. Not
    /// individually cancellable once begun — a partial rollback mid-erase
    /// is the correct behavior, not a cancellation point.
    pub async fn erase_user_data(&self, user_id: Uuid, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<(), DatabaseError> {
        if cancel.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }

        let start = Instant::now();
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<(), DatabaseError> {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            for table in [
                "health_check_ins",
                "medications",
                "menstruation_cycles",
                "blood_pressure_readings",
                "fitness_data",
                "reports",
            ] {
                repository::delete_user_scoped(&tx, table, &user_id)?;
            }
            tx.execute("DELETE FROM check_in_sessions WHERE user_id = ?1", rusqlite::params![user_id.to_string()])?;
            tx.execute(
                "UPDATE users SET deleted_at = ?1 WHERE id = ?2",
                rusqlite::params![now, user_id.to_string()],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await;

        let elapsed = start.elapsed();
        if elapsed > SLOW_QUERY_THRESHOLD {
            tracing::warn!(duration_ms = elapsed.as_millis() as u64, "slow database query");
        }

        match result {
            Ok(inner) => inner,
            Err(join_error) => Err(DatabaseError::ConstraintViolation(format!(
                "blocking task panicked: {join_error}"
            ))),
        }
    }

    /// Reads every per-user table for export. Not transactional: the
    /// invariant is "array length matches row count at read time", which
    /// a sequence of reads under WAL's snapshot isolation already gives
    /// for all practical purposes during export.
    pub async fn export_user_data(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<UserDataExport, DatabaseError> {
        run_blocking(self.pool.clone(), cancel, move |conn| {
            let today = Utc::now().date_naive();
            let far_future = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
            let far_past = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();

            Ok(UserDataExport {
                health_check_ins: repository::list_health_check_ins_in_range(conn, &user_id, far_past, far_future)?,
                medications: repository::list_medications(conn, &user_id, today)?,
                menstruation_cycles: repository::list_all_cycles(conn, &user_id)?,
                blood_pressure_readings: repository::list_all_blood_pressure_readings(conn, &user_id)?,
                fitness_data: repository::list_fitness_data_in_range(conn, &user_id, None, far_past, far_future)?,
                reports: repository::list_reports(conn, &user_id)?,
                audit_log: repository::list_audit_log(conn, &user_id)?,
            })
        })
        .await
    }
}

/// Flattened per-user snapshot serialized by `services::gdpr::export`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserDataExport {
    pub health_check_ins: Vec<HealthCheckIn>,
    pub medications: Vec<Medication>,
    pub menstruation_cycles: Vec<MenstruationCycle>,
    pub blood_pressure_readings: Vec<BloodPressureReading>,
    pub fitness_data: Vec<FitnessDataPoint>,
    pub reports: Vec<Report>,
    pub audit_log: Vec<AuditLog>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn store() -> Store {
        Store::new(open_memory_database().unwrap())
    }

    #[tokio::test]
    async fn cancelled_token_rejects_before_admitting_the_call() {
        let store = store();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = store.get_user(Uuid::new_v4(), &cancel).await;
        assert!(matches!(result, Err(DatabaseError::Cancelled)));
    }

    #[tokio::test]
    async fn round_trips_a_session_through_the_pool() {
        let store = store();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id, &cancel).await.unwrap();

        let session = Session::new(user_id);
        store.insert_session(session.clone(), &cancel).await.unwrap();

        let fetched = store.get_session(session.id, &cancel).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
    }

    #[tokio::test]
    async fn erase_removes_rows_and_soft_deletes_user() {
        let store = store();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id, &cancel).await.unwrap();

        let session = Session::new(user_id);
        store.insert_session(session.clone(), &cancel).await.unwrap();

        store.erase_user_data(user_id, Utc::now(), &cancel).await.unwrap();

        let sessions_remaining = store.get_session(session.id, &cancel).await.unwrap();
        assert!(sessions_remaining.is_none());

        let user = store.get_user(user_id, &cancel).await.unwrap().unwrap();
        assert!(user.deleted_at.is_some());
    }
}
