use std::time::{Duration, Instant};

use log::debug;
use uuid::Uuid;
use warp::{
    http::StatusCode,
    hyper::body::Bytes,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::booking::request::{BookingRequest, EntryPoint};
use crate::booking::BookingStatus;
use crate::db::AdminTokens;
use crate::engine;
use crate::environment::Environment;
use crate::errors::BookingError;
use crate::normalization;
use crate::policy::{Actor, AuthorizationPolicy};
use crate::routes::{
    query::ListQuery,
    rejection::{Context, Rejection},
    response::SuccessResponse,
};

const SERVER_TIMING_HEADER: &str = "server-timing";
const BEARER_PREFIX: &str = "Bearer ";

type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

#[derive(serde::Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(serde::Deserialize)]
struct NotesBody {
    #[serde(default, deserialize_with = "normalization::deserialize_text")]
    notes: Option<String>,
}

pub async fn create(environment: Environment, body: Bytes) -> RouteResult {
    create_from(environment, EntryPoint::Public, None, body).await
}

pub async fn inquiry(environment: Environment, body: Bytes) -> RouteResult {
    create_from(environment, EntryPoint::Inquiry, None, body).await
}

pub async fn direct(
    environment: Environment,
    authorization: Option<String>,
    body: Bytes,
) -> RouteResult {
    create_from(environment, EntryPoint::Admin, authorization, body).await
}

async fn create_from(
    environment: Environment,
    entry_point: EntryPoint,
    authorization: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::create(entry_point_name(entry_point)), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let request: BookingRequest = parse_body(&body).map_err(error_handler)?;

        debug!(environment.logger, "Creating booking..."; "entry_point" => ?entry_point);
        let booking = engine::create_booking(
            &*environment.db,
            &environment.logger,
            environment.caller(actor),
            entry_point,
            request,
        )
        .await
        .map_err(error_handler)?;

        let location = environment.urls.booking(&booking.id());

        with_header(
            with_status(json(&booking), StatusCode::CREATED),
            "location",
            location.as_str(),
        )
    }
}

pub async fn list(
    environment: Environment,
    authorization: Option<String>,
    query: ListQuery,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::list(), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let (filter, page) = query.parse().map_err(error_handler)?;

        let page = engine::list_bookings(&*environment.db, environment.caller(actor), filter, page)
            .await
            .map_err(error_handler)?;

        json(&SuccessResponse::List {
            bookings: page.bookings,
            pagination: page.pagination,
        })
    }
}

pub async fn statistics(environment: Environment, authorization: Option<String>) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::statistics(), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let statistics = engine::statistics(&*environment.db, environment.caller(actor))
            .await
            .map_err(error_handler)?;

        json(&statistics)
    }
}

pub async fn retrieve(
    environment: Environment,
    id: String,
    authorization: Option<String>,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::retrieve(id.clone()), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let id = parse_id(&id).map_err(error_handler)?;
        debug!(environment.logger, "Retrieving booking..."; "booking_id" => %id);

        let booking = engine::get_booking(&*environment.db, environment.caller(actor), &id)
            .await
            .map_err(error_handler)?;

        json(&booking)
    }
}

pub async fn transition(
    environment: Environment,
    id: String,
    authorization: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::transition(id.clone()), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let id = parse_id(&id).map_err(error_handler)?;
        let StatusBody { status } = parse_body(&body).map_err(error_handler)?;
        let target: BookingStatus = status.trim().parse().map_err(error_handler)?;

        let booking = engine::transition_booking(
            &*environment.db,
            &environment.logger,
            environment.caller(actor),
            &id,
            target,
        )
        .await
        .map_err(error_handler)?;

        json(&booking)
    }
}

pub async fn notes(
    environment: Environment,
    id: String,
    authorization: Option<String>,
    body: Bytes,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::notes(id.clone()), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let id = parse_id(&id).map_err(error_handler)?;
        let NotesBody { notes } = parse_body(&body).map_err(error_handler)?;

        let booking = engine::update_booking_notes(
            &*environment.db,
            &environment.logger,
            environment.caller(actor),
            &id,
            notes,
        )
        .await
        .map_err(error_handler)?;

        json(&booking)
    }
}

pub async fn delete(
    environment: Environment,
    id: String,
    authorization: Option<String>,
) -> RouteResult {
    timed! {
        let error_handler = |e: BookingError| Rejection::new(Context::delete(id.clone()), e);

        let actor = identify(&environment, authorization).await.map_err(error_handler)?;
        let id = parse_id(&id).map_err(error_handler)?;

        engine::delete_booking(&*environment.db, &environment.logger, environment.caller(actor), &id)
            .await
            .map_err(error_handler)?;

        StatusCode::NO_CONTENT
    }
}

/// Works out who sent a request from its `Authorization` header. Without
/// enforcement, everybody is an administrator. A well-formed bearer token
/// that isn't an active admin token identifies a non-administrator.
async fn identify(
    environment: &Environment,
    authorization: Option<String>,
) -> Result<Actor, BookingError> {
    if environment.config.policy == AuthorizationPolicy::Disabled {
        return Ok(Actor::Administrator(Uuid::nil()));
    }

    let token = match authorization
        .as_deref()
        .and_then(|header| header.trim().strip_prefix(BEARER_PREFIX))
        .and_then(|token| Uuid::parse_str(token.trim()).ok())
    {
        Some(token) => token,
        None => return Ok(Actor::Anonymous),
    };

    if environment.db.is_admin_token(&token).await? {
        Ok(Actor::Administrator(token))
    } else {
        Ok(Actor::Customer)
    }
}

fn parse_id(id: &str) -> Result<Uuid, BookingError> {
    Uuid::parse_str(id).map_err(|_| BookingError::InvalidId(id.to_owned()))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, BookingError> {
    serde_json::from_slice(body).map_err(|e| BookingError::MalformedRequest(e.to_string()))
}

fn entry_point_name(entry_point: EntryPoint) -> &'static str {
    match entry_point {
        EntryPoint::Public => "public",
        EntryPoint::Inquiry => "inquiry",
        EntryPoint::Admin => "direct",
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
