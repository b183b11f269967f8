use serde::Serialize;

use crate::booking::{Booking, Pagination};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    List {
        bookings: Vec<Booking>,
        pagination: Pagination,
    },
}
