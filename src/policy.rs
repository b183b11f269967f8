use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::BookingError;

/// Who is making a request, as far as the booking engine cares.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Actor {
    /// Nobody identified themselves.
    Anonymous,

    /// A caller who presented a token that isn't an admin token.
    Customer,

    /// A caller holding the given admin token, or anybody when enforcement
    /// is disabled (in which case the token is nil).
    Administrator(Uuid),
}

/// Operations only administrators may perform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    CreateDirect,
    Transition,
    EditNotes,
    Read,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreateDirect => "create direct bookings",
            Action::Transition => "change booking statuses",
            Action::EditNotes => "edit booking notes",
            Action::Read => "read bookings",
            Action::Delete => "delete bookings",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether administrator-only operations are actually restricted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthorizationPolicy {
    Enforced,

    /// Every caller counts as an administrator. For development only.
    Disabled,
}

impl AuthorizationPolicy {
    pub fn from_flag(enforce: bool) -> Self {
        if enforce {
            AuthorizationPolicy::Enforced
        } else {
            AuthorizationPolicy::Disabled
        }
    }

    /// Checks that `actor` may perform `action`. A refusal names the
    /// action.
    pub fn authorize(&self, actor: Actor, action: Action) -> Result<(), BookingError> {
        match (self, actor) {
            (AuthorizationPolicy::Disabled, _) => Ok(()),
            (_, Actor::Administrator(_)) => Ok(()),
            (_, Actor::Customer) => Err(BookingError::Forbidden(action)),
            (_, Actor::Anonymous) => Err(BookingError::Unauthorized(action)),
        }
    }
}

/// What to do with participant counts below one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParticipantRule {
    Clamp,
    Reject,
}

impl FromStr for ParticipantRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(ParticipantRule::Clamp),
            "reject" => Ok(ParticipantRule::Reject),
            other => Err(format!("expected `clamp` or `reject`, got `{}`", other)),
        }
    }
}

/// Optional checks applied when a booking is created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BookingRules {
    /// Refuse bookings for catalog items that are switched off.
    pub require_active_items: bool,

    /// Refuse bookings with more participants than the item allows.
    pub enforce_capacity: bool,

    pub participants_below_one: ParticipantRule,
}

impl Default for BookingRules {
    fn default() -> Self {
        BookingRules {
            require_active_items: false,
            enforce_capacity: false,
            participants_below_one: ParticipantRule::Clamp,
        }
    }
}
