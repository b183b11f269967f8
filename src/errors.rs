use thiserror::Error;
use uuid::Uuid;

use crate::booking::BookingStatus;
use crate::catalog::CatalogRef;
use crate::policy::Action;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BookingError {
    /// A phone number with no digits in it.
    #[error("phone number `{0}` contains no digits")]
    InvalidPhone(String),

    /// A required field was absent or blank.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A booking referenced both a course and an activity.
    #[error("a booking must reference either a course or an activity, not both")]
    AmbiguousCatalogReference,

    /// A status string outside the closed set.
    #[error("invalid status `{0}`")]
    InvalidStatus(String),

    /// An initial status other than `PENDING`, `CONFIRMED` or `CANCELLED`.
    #[error("`{0}` is not a valid initial status")]
    InvalidInitialStatus(BookingStatus),

    /// Participants below one when the rules say to reject rather than clamp.
    #[error("participants must be at least 1 (got {0})")]
    TooFewParticipants(i32),

    /// Participants above the catalog item's capacity when capacity is enforced.
    #[error("{requested} participants exceed the capacity of {capacity}")]
    CapacityExceeded { requested: i32, capacity: i32 },

    /// The catalog item exists but is not offered any more.
    #[error("{0} is not active")]
    InactiveCatalogItem(CatalogRef),

    /// An amount that cannot be represented as euro cents.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A malformed booking ID.
    #[error("invalid booking ID `{0}`")]
    InvalidId(String),

    /// A request body that could not be parsed.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The referenced course or activity does not exist.
    #[error("{0} not found")]
    CatalogItemNotFound(CatalogRef),

    /// The referenced booking does not exist.
    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    /// The requested status change is absent from the transition table.
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Another request changed the status between reading and writing it.
    #[error("status of booking {id} changed concurrently (now {current})")]
    StatusChanged { id: Uuid, current: BookingStatus },

    /// The synthesized guest email belongs to an unrelated account.
    #[error("email {0} already belongs to another customer")]
    EmailTaken(String),


    /// The caller did not identify as anybody allowed to do this.
    #[error("authorization required to {0}")]
    Unauthorized(Action),

    /// The caller is known but lacks the administrator role.
    #[error("administrator role required to {0}")]
    Forbidden(Action),

    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx {
        #[from]
        source: sqlx::Error,
    },
}

/// The caller-facing classification of a [`BookingError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    Conflict,
    Unauthorized,
    Forbidden,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Persistence => "persistence",
        }
    }
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        use BookingError::*;

        match self {
            MissingField(_)
            | InvalidPhone(_)
            | AmbiguousCatalogReference
            | InvalidStatus(_)
            | InvalidInitialStatus(_)
            | TooFewParticipants(_)
            | CapacityExceeded { .. }
            | InactiveCatalogItem(_)
            | InvalidAmount(_)
            | InvalidId(_)
            | MalformedRequest(_) => ErrorKind::Validation,
            CatalogItemNotFound(_) | BookingNotFound(_) => ErrorKind::NotFound,
            InvalidTransition { .. } => ErrorKind::InvalidTransition,
            StatusChanged { .. } | EmailTaken(_) => ErrorKind::Conflict,
            Unauthorized(_) => ErrorKind::Unauthorized,
            Forbidden(_) => ErrorKind::Forbidden,
            Sqlx { .. } => ErrorKind::Persistence,
        }
    }

    /// The message to show callers. Storage internals never leave the
    /// process.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Persistence => "temporary failure, please try again".to_owned(),
            _ => self.to_string(),
        }
    }
}
