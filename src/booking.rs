use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::catalog::{CatalogKind, CatalogRef, CatalogSummary};
use crate::customer::CustomerSummary;
use crate::money::Money;

pub mod request;
mod status;

pub use status::BookingStatus;

/// The placeholder time slot for inquiries made without one.
pub const PLACEHOLDER_TIME: &str = "00:00";

/// A single booking, with its customer and catalog item attached.
#[derive(Clone, Debug, Serialize)]
pub struct Booking {
    pub(crate) id: Uuid,

    pub(crate) customer: CustomerSummary,

    pub(crate) item: CatalogSummary,

    #[serde(with = "date_format")]
    pub(crate) date: Date,

    /// Free text, normally `HH:MM`.
    pub(crate) time: String,

    pub(crate) participants: i32,

    pub(crate) total_price: Money,

    pub(crate) status: BookingStatus,

    pub(crate) notes: Option<String>,

    /// The times it was created and updated.
    #[serde(flatten)]
    pub(crate) times: Times,
}

impl Booking {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn customer(&self) -> &CustomerSummary {
        &self.customer
    }

    pub fn item(&self) -> &CatalogSummary {
        &self.item
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn participants(&self) -> i32 {
        self.participants
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// The times a booking was created and last modified.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Times {
    #[serde(with = "time::serde::timestamp")]
    pub(crate) created_at: OffsetDateTime,

    #[serde(with = "time::serde::timestamp")]
    pub(crate) updated_at: OffsetDateTime,
}

/// A booking ready to be written. Everything has been validated and priced.
#[derive(Clone, Debug)]
pub struct NewBooking {
    pub(crate) id: Uuid,
    pub(crate) customer_id: Uuid,
    pub(crate) reference: CatalogRef,
    pub(crate) date: Date,
    pub(crate) time: String,
    pub(crate) participants: i32,
    pub(crate) total_price: Money,
    pub(crate) status: BookingStatus,
    pub(crate) notes: Option<String>,
}

/// Criteria for listing bookings. Absent fields don't filter.
#[derive(Clone, Debug, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub customer_id: Option<Uuid>,
    pub kind: Option<CatalogKind>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.from.map_or(true, |d| booking.date >= d)
            && self.to.map_or(true, |d| booking.date <= d)
            && self.customer_id.map_or(true, |id| booking.customer.id == id)
            && self
                .kind
                .map_or(true, |k| booking.item.reference.kind() == k)
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// A window into a listing, newest bookings first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PageRequest {
    pub(crate) page: i64,
    pub(crate) limit: i64,
}

impl PageRequest {
    /// Clamps the page to at least 1 and the limit to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1).min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Pagination {
    pub(crate) page: i64,
    pub(crate) limit: i64,
    pub(crate) total: i64,
    pub(crate) pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let pages = (total + request.limit - 1) / request.limit;

        Pagination {
            page: request.page,
            limit: request.limit,
            total,
            pages,
        }
    }
}

/// Figures for the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BookingStatistics {
    pub(crate) total: i64,
    pub(crate) pending: i64,
    pub(crate) confirmed: i64,
    pub(crate) cancelled: i64,
    pub(crate) completed: i64,

    /// Bookings whose date is today.
    pub(crate) today: i64,

    /// The sum of confirmed and completed bookings.
    pub(crate) revenue: Money,
}

/// (De)serializes dates as `YYYY-MM-DD`. Deserialization also accepts a full
/// ISO 8601 timestamp and keeps only its date, since that's what browser
/// date pickers send.
pub mod date_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    const FORMAT: &str = "%Y-%m-%d";

    pub fn format(date: Date) -> String {
        date.format(FORMAT)
    }

    pub fn parse(s: &str) -> Result<Date, time::ParseError> {
        let s = s.trim();
        let date_part = s.split('T').next().unwrap_or(s);

        Date::parse(date_part, FORMAT)
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where D: Deserializer<'de> {
        use serde::de::Error;

        let s: String = Deserialize::deserialize(deserializer)?;
        parse(&s).map_err(D::Error::custom)
    }

    /// Like [`deserialize`], treating `null` and blank strings as absent.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where D: Deserializer<'de> {
        use serde::de::Error;

        let o: Option<String> = Deserialize::deserialize(deserializer)?;

        match o {
            Some(s) if !s.trim().is_empty() => parse(&s).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}
