use serde::Serialize;
use warp::reject;

use crate::errors::BookingError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BookingError,
}

impl Rejection {
    pub fn new(context: Context, error: BookingError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            kind: self.error.kind().as_str(),
            message: self.error.public_message(),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) kind: &'static str,
    pub(crate) message: String,
}

/// The operation that failed, and what it was working on.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Context {
    Create { entry_point: &'static str },
    Delete { id: String },
    List,
    Notes { id: String },
    Retrieve { id: String },
    Statistics,
    Transition { id: String },
}

impl Context {
    pub fn create(entry_point: &'static str) -> Context {
        Context::Create { entry_point }
    }

    pub fn delete(id: String) -> Context {
        Context::Delete { id }
    }

    pub fn list() -> Context {
        Context::List
    }

    pub fn notes(id: String) -> Context {
        Context::Notes { id }
    }

    pub fn retrieve(id: String) -> Context {
        Context::Retrieve { id }
    }

    pub fn statistics() -> Context {
        Context::Statistics
    }

    pub fn transition(id: String) -> Context {
        Context::Transition { id }
    }
}
