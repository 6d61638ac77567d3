use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;

use super::checkin::list_health_check_ins_in_range;

/// Per-date row feeding `DashboardSummary::time_series_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub pain_level: Option<u8>,
    pub mood: Option<String>,
    pub energy_level: Option<String>,
    pub sleep_quality: Option<String>,
    pub symptom_count: usize,
    pub activity_count: usize,
}

/// Raw aggregation pulled straight from `health_check_ins` for the window;
/// the service layer turns this into percentages/labels.
#[derive(Debug, Clone, Default)]
pub struct DashboardAggregate {
    pub check_in_count: i64,
    pub pain_sum: u64,
    pub pain_sample_count: i64,
    pub mood_counts: Vec<(String, i64)>,
    pub energy_counts: Vec<(String, i64)>,
    pub daily_metrics: Vec<DailyMetric>,
}

/// Reads `health_check_ins` in `[from, to]` and aggregates in process —
/// SQLite's lack of array/json aggregation support makes this simpler
/// than building a single SQL query for every bucket.
pub fn aggregate(
    conn: &Connection,
    user_id: &Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<DashboardAggregate, DatabaseError> {
    let check_ins = list_health_check_ins_in_range(conn, user_id, from, to)?;

    let mut aggregate = DashboardAggregate {
        check_in_count: check_ins.len() as i64,
        ..Default::default()
    };

    let mut mood_counts: std::collections::BTreeMap<String, i64> = std::collections::BTreeMap::new();
    let mut energy_counts: std::collections::BTreeMap<String, i64> = std::collections::BTreeMap::new();

    for check_in in &check_ins {
        if let Some(pain) = check_in.pain_level {
            aggregate.pain_sum += pain as u64;
            aggregate.pain_sample_count += 1;
        }
        if let Some(mood) = check_in.mood {
            *mood_counts.entry(mood.as_str().to_string()).or_insert(0) += 1;
        }
        if let Some(energy) = check_in.energy_level {
            *energy_counts.entry(energy.as_str().to_string()).or_insert(0) += 1;
        }

        aggregate.daily_metrics.push(DailyMetric {
            date: check_in.check_in_date,
            pain_level: check_in.pain_level,
            mood: check_in.mood.map(|v| v.as_str().to_string()),
            energy_level: check_in.energy_level.map(|v| v.as_str().to_string()),
            sleep_quality: check_in.sleep_quality.map(|v| v.as_str().to_string()),
            symptom_count: check_in.symptoms.len(),
            activity_count: check_in.physical_activity.len(),
        });
    }

    aggregate.mood_counts = mood_counts.into_iter().collect();
    aggregate.energy_counts = energy_counts.into_iter().collect();

    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{ensure_user, insert_health_check_in};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::Mood;
    use crate::models::HealthCheckIn;
    use crate::models::Session;
    use chrono::Utc;

    fn check_in(user_id: Uuid, session_id: Uuid, date: NaiveDate, pain: Option<u8>, mood: Option<Mood>) -> HealthCheckIn {
        HealthCheckIn {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            check_in_date: date,
            symptoms: vec!["fejfajas".into()],
            mood,
            pain_level: pain,
            energy_level: None,
            sleep_quality: None,
            medication_taken: None,
            physical_activity: vec![],
            breakfast: None,
            lunch: None,
            dinner: None,
            general_feeling: None,
            additional_notes: None,
            raw_transcript: Some("raw".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window_yields_zeroed_aggregate() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();

        let aggregate = aggregate(
            &conn,
            &user_id,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
        )
        .unwrap();

        assert_eq!(aggregate.check_in_count, 0);
        assert_eq!(aggregate.pain_sample_count, 0);
        assert!(aggregate.mood_counts.is_empty());
    }

    #[test]
    fn average_pain_identity_holds() {
        let pool = open_memory_database().unwrap();
        let conn = pool.get().unwrap();
        let user_id = Uuid::new_v4();
        ensure_user(&conn, &user_id).unwrap();
        let session = Session::new(user_id);
        crate::db::repository::insert_session(&conn, &session).unwrap();

        let d1 = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 2).unwrap();
        insert_health_check_in(&conn, &check_in(user_id, session.id, d1, Some(4), Some(Mood::Neutral))).unwrap();
        insert_health_check_in(&conn, &check_in(user_id, session.id, d2, Some(6), Some(Mood::Negative))).unwrap();

        let aggregate = aggregate(&conn, &user_id, d1, d2).unwrap();
        assert_eq!(aggregate.pain_sample_count, 2);
        assert_eq!(aggregate.pain_sum, 10);
    }
}
