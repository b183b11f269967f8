//! The booking operations callers can perform. Routes translate HTTP into
//! calls to these functions and their errors back into responses.

use log::{debug, error, info, o, warn, Logger};
use time::Date;
use uuid::Uuid;

use crate::booking::request::{BookingRequest, EntryPoint};
use crate::booking::{
    Booking, BookingFilter, BookingStatistics, BookingStatus, NewBooking, PageRequest, Pagination,
};
use crate::db::{Bookings, Catalog, Customers};
use crate::errors::{BookingError, ErrorKind};
use crate::guest;
use crate::policy::{Action, Actor, AuthorizationPolicy, BookingRules};
use crate::pricing;

/// Who is asking, under which policy and rules, and what day it is.
#[derive(Clone, Copy, Debug)]
pub struct Caller<'a> {
    pub actor: Actor,
    pub policy: &'a AuthorizationPolicy,
    pub rules: &'a BookingRules,
    pub today: Date,
}

impl<'a> Caller<'a> {
    fn authorize(&self, action: Action) -> Result<(), BookingError> {
        self.policy.authorize(self.actor, action)
    }
}

/// A page of bookings with the figures needed to page through the rest.
#[derive(Debug)]
pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub pagination: Pagination,
}

/// Validates, prices and stores a booking request.
///
/// Direct entry requires an administrator; the public entry points don't.
/// Nothing is written unless every check passes, except that a guest
/// customer may be created before a later storage failure.
pub async fn create_booking<D>(
    db: &D,
    logger: &Logger,
    caller: Caller<'_>,
    entry_point: EntryPoint,
    request: BookingRequest,
) -> Result<Booking, BookingError>
where
    D: Catalog + Customers + Bookings + ?Sized,
{
    if entry_point == EntryPoint::Admin {
        caller.authorize(Action::CreateDirect)?;
    }

    let request = request.validate(entry_point, caller.today)?;
    let logger = logger.new(o!("item" => request.reference.to_string()));

    let item = db
        .find_item(request.reference)
        .await?
        .ok_or(BookingError::CatalogItemNotFound(request.reference))?;

    if caller.rules.require_active_items && !item.is_active {
        return Err(BookingError::InactiveCatalogItem(item.reference()));
    }

    let participants =
        pricing::participants(request.participants, caller.rules.participants_below_one)?;

    if caller.rules.enforce_capacity {
        if let Some(capacity) = item.max_participants {
            if participants > capacity {
                return Err(BookingError::CapacityExceeded {
                    requested: participants,
                    capacity,
                });
            }
        }
    }

    let total_price =
        pricing::compute_total(item.unit_price(), participants, request.price_override)?;

    let resolution = guest::resolve(db, &logger, &request.phone, &request.name).await?;
    let customer_id = resolution.customer.id();

    let new_booking = NewBooking {
        id: Uuid::new_v4(),
        customer_id,
        reference: request.reference,
        date: request.date,
        time: request.time,
        participants,
        total_price,
        status: request.initial_status,
        notes: request.notes,
    };
    let logger = logger.new(o!(
        "booking_id" => new_booking.id.to_string(),
        "customer_id" => customer_id.to_string(),
    ));

    debug!(logger, "Saving booking..."; "status" => %new_booking.status, "total_price" => %total_price);
    let booking = db.insert(new_booking).await.map_err(|e| log_failure(&logger, e))?;

    info!(logger, "Created booking"; "entry_point" => ?entry_point, "new_customer" => resolution.created);

    Ok(booking)
}

/// Moves a booking to `target` if the transition table allows it from the
/// booking's current status.
pub async fn transition_booking<D>(
    db: &D,
    logger: &Logger,
    caller: Caller<'_>,
    id: &Uuid,
    target: BookingStatus,
) -> Result<Booking, BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::Transition)?;

    let logger = logger.new(o!("booking_id" => id.to_string()));

    let current = db
        .retrieve(id)
        .await
        .map_err(|e| log_failure(&logger, e))?
        .ok_or(BookingError::BookingNotFound(*id))?
        .status();

    let target = current.transition_to(target).map_err(|e| {
        debug!(logger, "Refused transition"; "error" => %e);
        e
    })?;

    match db
        .compare_and_set_status(id, current, target)
        .await
        .map_err(|e| log_failure(&logger, e))?
    {
        Some(booking) => {
            info!(logger, "Changed booking status"; "from" => %current, "to" => %target);
            Ok(booking)
        }
        None => {
            // the status moved between our read and our write
            let now = db
                .retrieve(id)
                .await
                .map_err(|e| log_failure(&logger, e))?
                .ok_or(BookingError::BookingNotFound(*id))?
                .status();

            warn!(logger, "Booking status changed concurrently"; "expected" => %current, "found" => %now);
            Err(BookingError::StatusChanged {
                id: *id,
                current: now,
            })
        }
    }
}

/// Replaces a booking's notes. Blank notes clear them.
pub async fn update_booking_notes<D>(
    db: &D,
    logger: &Logger,
    caller: Caller<'_>,
    id: &Uuid,
    notes: Option<String>,
) -> Result<Booking, BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::EditNotes)?;

    let logger = logger.new(o!("booking_id" => id.to_string()));
    let notes = notes.and_then(crate::normalization::normalize_text);

    let booking = db
        .update_notes(id, notes)
        .await
        .map_err(|e| log_failure(&logger, e))?
        .ok_or(BookingError::BookingNotFound(*id))?;

    debug!(logger, "Updated booking notes");

    Ok(booking)
}

pub async fn get_booking<D>(
    db: &D,
    caller: Caller<'_>,
    id: &Uuid,
) -> Result<Booking, BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::Read)?;

    db.retrieve(id)
        .await?
        .ok_or(BookingError::BookingNotFound(*id))
}

pub async fn list_bookings<D>(
    db: &D,
    caller: Caller<'_>,
    filter: BookingFilter,
    page: PageRequest,
) -> Result<BookingPage, BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::Read)?;

    let (bookings, total) = db.list(filter, page).await?;

    Ok(BookingPage {
        bookings,
        pagination: Pagination::new(page, total),
    })
}

/// Removes a booking outright. This is housekeeping, not a status change.
pub async fn delete_booking<D>(
    db: &D,
    logger: &Logger,
    caller: Caller<'_>,
    id: &Uuid,
) -> Result<(), BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::Delete)?;

    let logger = logger.new(o!("booking_id" => id.to_string()));

    db.delete(id).await.map_err(|e| log_failure(&logger, e))?;
    info!(logger, "Deleted booking");

    Ok(())
}

pub async fn statistics<D>(db: &D, caller: Caller<'_>) -> Result<BookingStatistics, BookingError>
where
    D: Bookings + ?Sized,
{
    caller.authorize(Action::Read)?;

    db.statistics(caller.today).await
}

fn log_failure(logger: &Logger, e: BookingError) -> BookingError {
    if e.kind() == ErrorKind::Persistence {
        error!(logger, "Storage failure"; "error" => ?e);
    }

    e
}
