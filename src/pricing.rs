//! Works out how much a booking costs.

use crate::errors::BookingError;
use crate::money::Money;
use crate::policy::ParticipantRule;

/// Resolves the participant count of a request. Absent counts mean one
/// person; counts below one are clamped or rejected according to `rule`.
pub fn participants(requested: Option<i32>, rule: ParticipantRule) -> Result<i32, BookingError> {
    match requested {
        None => Ok(1),
        Some(n) if n >= 1 => Ok(n),
        Some(n) => match rule {
            ParticipantRule::Clamp => Ok(1),
            ParticipantRule::Reject => Err(BookingError::TooFewParticipants(n)),
        },
    }
}

/// Computes the total price of a booking. An override, which only
/// administrators can supply, is used verbatim.
pub fn compute_total(
    unit_price: Money,
    participants: i32,
    override_price: Option<Money>,
) -> Result<Money, BookingError> {
    if let Some(price) = override_price {
        return Ok(price);
    }

    let participants = participants.max(1);

    unit_price
        .checked_mul(i64::from(participants))
        .ok_or_else(|| {
            BookingError::InvalidAmount(format!("{} × {}", unit_price, participants))
        })
}
