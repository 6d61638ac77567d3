//! Repository layer — entity-scoped, synchronous database operations.
//!
//! Every function here takes a borrowed `rusqlite::Connection` and is
//! called from the async `storage::Store` layer via `spawn_blocking`.
//! Grouped by aggregate, mirroring the shape of the reference app's
//! `db::repository::*` module split.

mod audit;
mod checkin;
mod dashboard;
mod health_data;
mod medication;
mod report;

use uuid::Uuid;

use super::DatabaseError;

/// Base CRUD shape implemented by a handful of the simpler repositories.
/// Not every aggregate needs every method (e.g. `HealthCheckIn` has no
/// `update`), so this is a convenience, not a mandate.
pub trait Repository<T> {
    fn insert(&self, conn: &rusqlite::Connection, entity: &T) -> Result<Uuid, DatabaseError>;
    fn get(&self, conn: &rusqlite::Connection, id: &Uuid) -> Result<Option<T>, DatabaseError>;
    fn delete(&self, conn: &rusqlite::Connection, id: &Uuid) -> Result<(), DatabaseError>;
}

pub use audit::*;
pub use checkin::*;
pub use dashboard::*;
pub use health_data::*;
pub use medication::*;
pub use report::*;
