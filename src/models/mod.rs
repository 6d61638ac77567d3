pub mod audit;
pub mod checkin;
pub mod cycle;
pub mod enums;
pub mod fitness;
pub mod medication;
pub mod report;
pub mod session;
pub mod user;
pub mod vitals;

pub use audit::AuditLog;
pub use checkin::HealthCheckIn;
pub use cycle::MenstruationCycle;
pub use fitness::FitnessDataPoint;
pub use medication::{Medication, MedicationLog};
pub use report::Report;
pub use session::{Message, Session};
pub use user::User;
pub use vitals::BloodPressureReading;
