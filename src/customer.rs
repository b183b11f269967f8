use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            other => Err(other.to_owned()),
        }
    }
}

/// A person who has made at least one booking, or registered.
#[derive(Clone, Debug, Serialize)]
pub struct Customer {
    pub(crate) id: Uuid,

    pub(crate) name: String,

    /// The lookup key for guests. Unique when present.
    pub(crate) phone: Option<String>,

    /// Unique. Synthesized for guests.
    pub(crate) email: String,

    pub(crate) role: Role,

    #[serde(with = "time::serde::timestamp")]
    pub(crate) created_at: OffsetDateTime,
}

impl Customer {
    pub fn new(
        id: Uuid,
        name: String,
        phone: Option<String>,
        email: String,
        role: Role,
        created_at: OffsetDateTime,
    ) -> Self {
        Customer {
            id,
            name,
            phone,
            email,
            role,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// A customer account created implicitly from a phone number. It has an
/// empty password credential, so it cannot log in.
#[derive(Clone, Debug)]
pub struct GuestCustomer {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) phone: String,
    pub(crate) email: String,
}

impl GuestCustomer {
    pub fn new(name: String, phone: String, email: String) -> Self {
        GuestCustomer {
            id: Uuid::new_v4(),
            name,
            phone,
            email,
        }
    }
}

/// The customer fields attached to a booking for display.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: Option<String>,
}

impl CustomerSummary {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
