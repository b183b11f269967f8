use serde::Deserialize;
use time::Date;

use super::{date_format, BookingStatus, PLACEHOLDER_TIME};
use crate::catalog::{CatalogRef, Id};
use crate::errors::BookingError;
use crate::money::Money;
use crate::normalization;

const ONLINE_BOOKING_NOTE: &str = "Online booking";
const EQUIPMENT_REQUIRED_NOTE: &str = "Equipment required";
const OWN_EQUIPMENT_NOTE: &str = "Own equipment";

/// Where a booking request came in. Determines which fields are required
/// and which fields the caller is trusted with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryPoint {
    /// The public booking form. Date and time are required; price and
    /// status are always computed.
    Public,

    /// A public request for information. Date and time may be left for an
    /// administrator to fill in.
    Inquiry,

    /// Direct entry by an administrator, who may override the price and
    /// choose the initial status.
    Admin,
}

/// A booking request as submitted.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    #[serde(alias = "courseId")]
    pub course_id: Option<Id>,

    #[serde(alias = "activityId")]
    pub activity_id: Option<Id>,

    #[serde(deserialize_with = "normalization::deserialize_option")]
    pub name: Option<String>,

    #[serde(deserialize_with = "normalization::deserialize_text")]
    pub phone: Option<String>,

    #[serde(deserialize_with = "date_format::deserialize_option")]
    pub date: Option<Date>,

    #[serde(deserialize_with = "normalization::deserialize_text")]
    pub time: Option<String>,

    pub participants: Option<i32>,

    #[serde(deserialize_with = "normalization::deserialize_text")]
    pub notes: Option<String>,

    #[serde(alias = "totalPrice")]
    pub total_price: Option<Money>,

    pub status: Option<String>,

    #[serde(alias = "equipmentNeeded")]
    pub equipment_needed: Option<bool>,
}

/// A request whose required fields are present, with every field the
/// entry point doesn't trust already discarded.
#[derive(Clone, Debug)]
pub struct ValidatedRequest {
    pub reference: CatalogRef,
    pub name: String,
    pub phone: String,
    pub date: Date,
    pub time: String,
    pub participants: Option<i32>,
    pub notes: Option<String>,
    pub price_override: Option<Money>,
    pub initial_status: BookingStatus,
}

impl BookingRequest {
    /// Checks required fields in order, stopping at the first failure.
    /// `today` stands in for a missing inquiry date.
    pub fn validate(
        self,
        entry_point: EntryPoint,
        today: Date,
    ) -> Result<ValidatedRequest, BookingError> {
        let reference = match (self.course_id, self.activity_id) {
            (Some(_), Some(_)) => return Err(BookingError::AmbiguousCatalogReference),
            (course_id, activity_id) => CatalogRef::from_parts(course_id, activity_id)
                .ok_or(BookingError::MissingField("course_id or activity_id"))?,
        };

        let name = self.name.filter(|n| !n.is_empty());
        let name = name.ok_or(BookingError::MissingField("name"))?;
        let phone = self.phone.ok_or(BookingError::MissingField("phone"))?;

        let (date, time) = match entry_point {
            EntryPoint::Inquiry => (
                self.date.unwrap_or(today),
                self.time.unwrap_or_else(|| PLACEHOLDER_TIME.to_owned()),
            ),
            EntryPoint::Public | EntryPoint::Admin => (
                self.date.ok_or(BookingError::MissingField("date"))?,
                self.time.ok_or(BookingError::MissingField("time"))?,
            ),
        };

        let (price_override, initial_status, notes) = match entry_point {
            EntryPoint::Admin => {
                let status = match self.status {
                    Some(s) if !s.trim().is_empty() => s.parse::<BookingStatus>()?,
                    _ => BookingStatus::Pending,
                };

                if !status.is_valid_initial() {
                    return Err(BookingError::InvalidInitialStatus(status));
                }

                (self.total_price, status, self.notes)
            }
            EntryPoint::Public | EntryPoint::Inquiry => {
                let equipment_needed = self.equipment_needed;
                let notes = self
                    .notes
                    .or_else(|| Some(default_note(reference, equipment_needed).to_owned()));

                (None, BookingStatus::Pending, notes)
            }
        };

        Ok(ValidatedRequest {
            reference,
            name,
            phone,
            date,
            time,
            participants: self.participants,
            notes,
            price_override,
            initial_status,
        })
    }
}

fn default_note(reference: CatalogRef, equipment_needed: Option<bool>) -> &'static str {
    match (reference, equipment_needed) {
        (_, Some(true)) => EQUIPMENT_REQUIRED_NOTE,
        (CatalogRef::Activity(_), Some(false)) => OWN_EQUIPMENT_NOTE,
        _ => ONLINE_BOOKING_NOTE,
    }
}
