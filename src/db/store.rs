use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;

use super::queries::{self, StatusChange};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, NewBooking};

/// Sole writer of booking status.
///
/// Without a database the store still answers: reads come back empty and
/// writes fail with [`AppError::StorageUnavailable`].
#[derive(Clone, Default)]
pub struct BookingStore {
    db: Option<Arc<Mutex<Connection>>>,
}

impl BookingStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Some(Arc::new(Mutex::new(conn))),
        }
    }

    pub fn unconfigured() -> Self {
        Self { db: None }
    }

    pub fn open(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Ok(Self::new(super::init_db(path)?)),
            None => {
                tracing::warn!("DATABASE_URL not set, bookings will not be persisted");
                Ok(Self::unconfigured())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.db.is_some()
    }

    fn conn(&self) -> Result<Option<MutexGuard<'_, Connection>>, AppError> {
        match &self.db {
            Some(db) => db
                .lock()
                .map(Some)
                .map_err(|_| AppError::Internal(anyhow::anyhow!("booking store lock poisoned"))),
            None => Ok(None),
        }
    }

    pub fn insert(&self, new: &NewBooking) -> Result<Booking, AppError> {
        let conn = self.conn()?.ok_or(AppError::StorageUnavailable)?;
        let id = uuid::Uuid::new_v4().to_string();
        queries::insert_booking(&conn, &id, new, Utc::now().naive_utc())
    }

    /// Looks a booking up by store id or booking reference.
    pub fn get(&self, key: &str) -> Result<Booking, AppError> {
        let found = match self.conn()? {
            Some(conn) => queries::get_booking_by_id_or_ref(&conn, key)?,
            None => None,
        };
        found.ok_or_else(|| AppError::NotFound(format!("booking {key}")))
    }

    pub fn list(&self) -> Result<Vec<Booking>, AppError> {
        match self.conn()? {
            Some(conn) => queries::list_bookings(&conn),
            None => Ok(vec![]),
        }
    }

    pub fn update_status(&self, key: &str, status: BookingStatus) -> Result<StatusChange, AppError> {
        let conn = self.conn()?.ok_or(AppError::StorageUnavailable)?;
        let change = queries::transition_status(&conn, key, status, Utc::now().naive_utc())?;
        if change.changed {
            tracing::info!(
                booking_ref = %change.booking.booking_ref,
                from = %change.previous,
                to = %status,
                "booking status updated"
            );
        }
        Ok(change)
    }
}
