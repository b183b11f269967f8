use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::booking::{date_format, BookingFilter, BookingStatus, PageRequest};
use crate::catalog::CatalogKind;
use crate::errors::BookingError;

/// The query string of a booking listing. Everything is optional and
/// parsed by hand so bad values get a proper error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub customer_id: Option<String>,
    pub kind: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    pub fn parse(self) -> Result<(BookingFilter, PageRequest), BookingError> {
        let status = match non_blank(self.status) {
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(s.parse::<BookingStatus>()?),
            None => None,
        };

        let kind = match non_blank(self.kind).as_deref() {
            None => None,
            Some("course") => Some(CatalogKind::Course),
            Some("activity") => Some(CatalogKind::Activity),
            Some(other) => {
                return Err(BookingError::MalformedRequest(format!(
                    "unknown kind `{}`",
                    other
                )))
            }
        };

        let customer_id = non_blank(self.customer_id)
            .map(|id| Uuid::parse_str(&id).map_err(|_| BookingError::InvalidId(id.clone())))
            .transpose()?;

        let filter = BookingFilter {
            status,
            from: parse_date("from", self.from)?,
            to: parse_date("to", self.to)?,
            customer_id,
            kind,
        };

        let page = PageRequest::new(
            parse_number("page", self.page)?,
            parse_number("limit", self.limit)?,
        );

        Ok((filter, page))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(name: &str, value: Option<String>) -> Result<Option<Date>, BookingError> {
    non_blank(value)
        .map(|v| {
            date_format::parse(&v)
                .map_err(|e| BookingError::MalformedRequest(format!("{} `{}`: {}", name, v, e)))
        })
        .transpose()
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<i64>, BookingError> {
    non_blank(value)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| BookingError::MalformedRequest(format!("{} `{}` is not a number", name, v)))
        })
        .transpose()
}
