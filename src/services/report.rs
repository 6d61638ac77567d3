use std::io::BufWriter;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::adapters::ObjectStore;
use crate::db::DatabaseError;
use crate::models::enums::{AuditOperationType, ReportStatus};
use crate::models::{BloodPressureReading, HealthCheckIn, Medication, MenstruationCycle, Report};
use crate::storage::Store;

use super::audit::{AuditService, RequestContext};
use super::error::ServiceError;

pub struct ReportService {
    store: Arc<Store>,
    object_store: Arc<dyn ObjectStore>,
    audit: Arc<AuditService>,
}

impl ReportService {
    pub fn new(store: Arc<Store>, object_store: Arc<dyn ObjectStore>, audit: Arc<AuditService>) -> Self {
        Self { store, object_store, audit }
    }

    pub async fn generate(
        &self,
        user_id: Uuid,
        name: String,
        start: NaiveDate,
        end: NaiveDate,
        context: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Report, ServiceError> {
        let check_ins = self.store.list_health_check_ins_in_range(user_id, start, end, cancel).await?;
        let medications = self.store.list_medications(user_id, Utc::now().date_naive(), cancel).await?;
        let readings = self.store.list_all_blood_pressure_readings(user_id, cancel).await?;
        let cycles = self.store.list_all_cycles(user_id, cancel).await?;
        let fitness = self.store.list_fitness_data_in_range(user_id, None, start, end, cancel).await?;

        let bytes = build_pdf(&name, start, end, &check_ins, &medications, &readings, &cycles, fitness.len())?;

        let report = Report {
            id: Uuid::new_v4(),
            user_id,
            name,
            date_range_start: start,
            date_range_end: end,
            blob_key: format!("reports/{}.pdf", Uuid::new_v4()),
            generated_at: Utc::now(),
            status: ReportStatus::Generated,
        };

        self.object_store
            .put(&report.blob_key, "application/pdf", bytes, cancel)
            .await?;
        self.store.insert_report(report.clone(), cancel).await?;

        self.audit
            .record(user_id, AuditOperationType::Create, "report", &report.id.to_string(), &context, None, cancel)
            .await;

        Ok(report)
    }

    pub async fn get(&self, report_id: Uuid, cancel: &CancellationToken) -> Result<(Report, Vec<u8>), ServiceError> {
        let report = self
            .store
            .get_report(report_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("report", report_id.to_string()))?;

        let bytes = self
            .object_store
            .get(&report.blob_key, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("report blob", report.blob_key.clone()))?;

        Ok((report, bytes))
    }
}

/// Emits every section whether or not it has data; empty sections print
/// "no data recorded" rather than being omitted.
#[allow(clippy::too_many_arguments)]
fn build_pdf(
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
    check_ins: &[HealthCheckIn],
    medications: &[Medication],
    readings: &[BloodPressureReading],
    cycles: &[MenstruationCycle],
    fitness_point_count: usize,
) -> Result<Vec<u8>, DatabaseError> {
    let (doc, page1, layer1) = PdfDocument::new(name, Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF font error: {e}")))?;

    let mut y = Mm(280.0);

    layer.use_text(name, 14.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    layer.use_text(format!("{start} - {end}"), 9.0, Mm(20.0), y, &font);
    y -= Mm(10.0);

    section(&layer, &bold, &font, &mut y, "SYMPTOMS TIMELINE", check_ins.is_empty(), || {
        check_ins
            .iter()
            .map(|c| format!("{}: {}", c.check_in_date, c.symptoms.join(", ")))
            .collect()
    });

    section(&layer, &bold, &font, &mut y, "MEDICATIONS", medications.is_empty(), || {
        medications.iter().map(|m| format!("{} {} ({})", m.name, m.dosage, m.frequency)).collect()
    });

    let adherence_lines: Vec<String> = medications
        .iter()
        .filter(|m| m.active)
        .map(|m| format!("{}: active", m.name))
        .collect();
    section(&layer, &bold, &font, &mut y, "ADHERENCE SUMMARY", adherence_lines.is_empty(), || adherence_lines.clone());

    let last_ten: Vec<&BloodPressureReading> = readings.iter().take(10).collect();
    let bp_average = if !readings.is_empty() {
        let (s, d) = readings.iter().fold((0i64, 0i64), |(s, d), r| (s + r.systolic as i64, d + r.diastolic as i64));
        format!(
            "average {}/{} over {} readings",
            s / readings.len() as i64,
            d / readings.len() as i64,
            readings.len()
        )
    } else {
        String::new()
    };
    section(&layer, &bold, &font, &mut y, "BLOOD PRESSURE TREND", readings.is_empty(), || {
        let mut lines: Vec<String> = vec![bp_average.clone()];
        lines.extend(last_ten.iter().map(|r| format!("{}: {}/{} pulse {}", r.measured_at, r.systolic, r.diastolic, r.pulse)));
        lines
    });

    section(&layer, &bold, &font, &mut y, "MENSTRUATION CYCLES", cycles.is_empty(), || {
        cycles.iter().map(|c| format!("{} - {:?}", c.start_date, c.end_date)).collect()
    });

    section(&layer, &bold, &font, &mut y, "PHYSICAL ACTIVITIES", check_ins.iter().all(|c| c.physical_activity.is_empty()), || {
        check_ins
            .iter()
            .flat_map(|c| c.physical_activity.iter().map(|a| format!("{}: {a}", c.check_in_date)))
            .collect()
    });

    section(
        &layer,
        &bold,
        &font,
        &mut y,
        "MEAL PATTERNS",
        check_ins.iter().all(|c| c.breakfast.is_none() && c.lunch.is_none() && c.dinner.is_none()),
        || {
            check_ins
                .iter()
                .map(|c| {
                    format!(
                        "{}: breakfast={} lunch={} dinner={}",
                        c.check_in_date,
                        c.breakfast.as_deref().unwrap_or("-"),
                        c.lunch.as_deref().unwrap_or("-"),
                        c.dinner.as_deref().unwrap_or("-"),
                    )
                })
                .collect()
        },
    );

    section(&layer, &bold, &font, &mut y, "DAILY SUMMARIES", check_ins.is_empty(), || {
        check_ins
            .iter()
            .map(|c| format!("{}: {}", c.check_in_date, c.general_feeling.as_deref().unwrap_or("-")))
            .collect()
    });

    layer.use_text(format!("fitness data points in range: {fitness_point_count}"), 8.0, Mm(20.0), y, &font);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| DatabaseError::ConstraintViolation(format!("PDF buffer error: {e}")))
}

fn section<F>(layer: &printpdf::PdfLayerReference, bold: &printpdf::IndirectFontRef, font: &printpdf::IndirectFontRef, y: &mut Mm, title: &str, is_empty: bool, lines: F)
where
    F: FnOnce() -> Vec<String>,
{
    layer.use_text(title, 11.0, Mm(20.0), *y, bold);
    *y -= Mm(6.0);

    if is_empty {
        layer.use_text("no data recorded", 9.0, Mm(25.0), *y, font);
        *y -= Mm(4.5);
    } else {
        for line in lines() {
            layer.use_text(&line, 9.0, Mm(25.0), *y, font);
            *y -= Mm(4.5);
        }
    }
    *y -= Mm(4.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;
    use crate::db::sqlite::open_memory_database;

    fn service() -> ReportService {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let audit = Arc::new(AuditService::new(store.clone()));
        ReportService::new(store, Arc::new(InMemoryStore::new()), audit)
    }

    fn context() -> RequestContext {
        RequestContext {
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn empty_report_still_generates_pdf_bytes() {
        let service = service();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let report = service.generate(user_id, "January".into(), start, end, context(), &cancel).await.unwrap();
        let (fetched_report, bytes) = service.get(report.id, &cancel).await.unwrap();
        assert_eq!(fetched_report.id, report.id);
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[tokio::test]
    async fn get_rejects_unknown_report_id() {
        let service = service();
        let cancel = CancellationToken::new();
        let result = service.get(Uuid::new_v4(), &cancel).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }
}
