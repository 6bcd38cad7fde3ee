use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use rusqlite::{params, Connection, ErrorCode};

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Money, NewBooking, PaymentMethod, RoomType};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const BOOKING_COLUMNS: &str = "id, booking_ref, check_in, check_out, nights, room_type, guests, \
     name, email, phone, special_requests, subtotal_subunits, tax_subunits, total_subunits, \
     payment_method, status, created_at, updated_at";

/// Result of a guarded status write.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub booking: Booking,
    pub previous: BookingStatus,
    pub changed: bool,
}

// ── Bookings ──

pub fn insert_booking(
    conn: &Connection,
    id: &str,
    new: &NewBooking,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let now = now.trunc_subsecs(6);
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

    let result = conn.execute(
        "INSERT INTO bookings (id, booking_ref, check_in, check_out, nights, room_type, guests, \
         name, email, phone, special_requests, subtotal_subunits, tax_subunits, total_subunits, \
         payment_method, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
        params![
            id,
            new.booking_ref,
            new.check_in.format(DATE_FORMAT).to_string(),
            new.check_out.format(DATE_FORMAT).to_string(),
            new.nights,
            new.room_type.as_str(),
            new.guests,
            new.name,
            new.email,
            new.phone,
            new.special_requests,
            new.subtotal.subunits(),
            new.tax.subunits(),
            new.total.subunits(),
            new.payment_method.as_str(),
            new.status.as_str(),
            timestamp,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            return Err(AppError::Conflict(new.booking_ref.clone()));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Booking {
        id: id.to_string(),
        booking_ref: new.booking_ref.clone(),
        check_in: new.check_in,
        check_out: new.check_out,
        nights: new.nights,
        room_type: new.room_type,
        guests: new.guests,
        name: new.name.clone(),
        email: new.email.clone(),
        phone: new.phone.clone(),
        special_requests: new.special_requests.clone(),
        subtotal: new.subtotal,
        tax: new.tax,
        total: new.total,
        payment_method: new.payment_method,
        status: new.status,
        created_at: now,
        updated_at: now,
    })
}

/// Store ids are UUIDs and references carry the brand prefix, so one key
/// can match at most one row.
pub fn get_booking_by_id_or_ref(conn: &Connection, key: &str) -> Result<Option<Booking>, AppError> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1 OR booking_ref = ?1"),
        params![key],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(conn: &Connection) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Moves a booking (by id or reference) to `next` if the transition table
/// allows it. Re-applying the current status changes nothing.
///
/// The write is a compare-and-set on the status that was read, so a status
/// changed underneath us is re-read and re-checked rather than overwritten.
pub fn transition_status(
    conn: &Connection,
    key: &str,
    next: BookingStatus,
    now: NaiveDateTime,
) -> Result<StatusChange, AppError> {
    const MAX_ATTEMPTS: usize = 3;
    let now = now.trunc_subsecs(6);

    for _ in 0..MAX_ATTEMPTS {
        let current = get_booking_by_id_or_ref(conn, key)?
            .ok_or_else(|| AppError::NotFound(format!("booking {key}")))?;
        let previous = current.status;

        if previous == next {
            return Ok(StatusChange {
                booking: current,
                previous,
                changed: false,
            });
        }
        if !previous.can_transition_to(next) {
            return Err(AppError::IllegalTransition {
                from: previous,
                to: next,
            });
        }

        let count = conn.execute(
            "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                next.as_str(),
                now.format(TIMESTAMP_FORMAT).to_string(),
                current.id,
                previous.as_str(),
            ],
        )?;

        if count == 1 {
            return Ok(StatusChange {
                booking: Booking {
                    status: next,
                    updated_at: now,
                    ..current
                },
                previous,
                changed: true,
            });
        }
        tracing::debug!(booking_ref = %current.booking_ref, "status changed concurrently, re-reading");
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "booking {key} kept changing during status update"
    )))
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let check_in: String = row.get(2)?;
    let check_out: String = row.get(3)?;
    let room_type: String = row.get(5)?;
    let payment_method: String = row.get(14)?;
    let status: String = row.get(15)?;
    let created_at: String = row.get(16)?;
    let updated_at: String = row.get(17)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_ref: row.get(1)?,
        check_in: NaiveDate::parse_from_str(&check_in, DATE_FORMAT)
            .with_context(|| format!("bad check_in: {check_in}"))?,
        check_out: NaiveDate::parse_from_str(&check_out, DATE_FORMAT)
            .with_context(|| format!("bad check_out: {check_out}"))?,
        nights: row.get(4)?,
        room_type: RoomType::parse(&room_type)
            .with_context(|| format!("unknown room_type: {room_type}"))?,
        guests: row.get(6)?,
        name: row.get(7)?,
        email: row.get(8)?,
        phone: row.get(9)?,
        special_requests: row.get(10)?,
        subtotal: Money::from_subunits(row.get(11)?),
        tax: Money::from_subunits(row.get(12)?),
        total: Money::from_subunits(row.get(13)?),
        payment_method: PaymentMethod::parse(&payment_method)
            .with_context(|| format!("unknown payment_method: {payment_method}"))?,
        status: BookingStatus::parse(&status)
            .with_context(|| format!("unknown status: {status}"))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .with_context(|| format!("bad timestamp: {s}"))
}
