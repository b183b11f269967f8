use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::policy::{AuthorizationPolicy, BookingRules, ParticipantRule};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("must define {0} environment variable")]
    Missing(&'static str),

    #[error("could not parse {name} ({value:?}): {message}")]
    Invalid {
        name: &'static str,
        value: String,
        message: String,
    },
}

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Everything the service reads from its environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub connection_string: String,
    pub main_port: u16,
    pub admin_port: u16,
    pub base_url: String,
    pub bookings_path: String,
    pub policy: AuthorizationPolicy,
    pub rules: BookingRules,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns `None` for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let flag = |name: &'static str, default: bool| -> Result<bool, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(value) => parse_flag(name, &value),
            }
        };

        let defaults = BookingRules::default();

        let participants_below_one = match lookup("BOOKINGS_PARTICIPANTS_BELOW_ONE") {
            None => defaults.participants_below_one,
            Some(value) => parse("BOOKINGS_PARTICIPANTS_BELOW_ONE", &value)?,
        };

        Ok(Settings {
            connection_string: required("BOOKINGS_DB_CONNECTION_STRING")?,
            main_port: parse("BOOKINGS_PORT", &required("BOOKINGS_PORT")?)?,
            admin_port: parse("BOOKINGS_ADMIN_PORT", &required("BOOKINGS_ADMIN_PORT")?)?,
            base_url: required("BOOKINGS_BASE_URL")?,
            bookings_path: required("BOOKINGS_PATH")?,
            policy: AuthorizationPolicy::from_flag(flag("BOOKINGS_ENFORCE_AUTHORIZATION", true)?),
            rules: BookingRules {
                require_active_items: flag(
                    "BOOKINGS_REQUIRE_ACTIVE_ITEMS",
                    defaults.require_active_items,
                )?,
                enforce_capacity: flag("BOOKINGS_ENFORCE_CAPACITY", defaults.enforce_capacity)?,
                participants_below_one,
            },
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_owned(),
        message: e.to_string(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_owned(),
            message: "expected 0 or 1".to_owned(),
        }),
    }
}
