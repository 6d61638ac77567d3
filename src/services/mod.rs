//! Domain services: one per bounded area, each holding the `Store` and
//! whatever adapters it needs. HTTP handlers in `api::endpoints` are thin
//! wrappers over these.

pub mod audit;
pub mod checkin;
pub mod dashboard;
pub mod error;
pub mod gdpr;
pub mod health_data;
pub mod medication;
pub mod report;

pub use audit::AuditService;
pub use checkin::CheckInService;
pub use dashboard::DashboardService;
pub use error::ServiceError;
pub use gdpr::GdprService;
pub use health_data::HealthDataService;
pub use medication::MedicationService;
pub use report::ReportService;
