use std::sync::Arc;

use log::{error, warn, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::{BookingError, ErrorKind};

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The largest request body to accept. Booking requests are small JSON
/// objects, so anything bigger is a mistake.
const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if e.kind() == ErrorKind::Persistence {
            error!(logger, "Storage error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            warn!(logger, "Request failed"; "context" => ?r.context, "kind" => e.kind().as_str(), "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status));
    }

    Err(rej)
}

fn status_code_for(e: &BookingError) -> StatusCode {
    match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidTransition | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::body::{bytes, content_length_limit};
    use warp::filters::BoxedFilter;
    use warp::header::optional;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, patch, path as p, path::param as par, post, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let r = environment.urls.bookings_path.clone();

            let $route_variable = warp::any()
                .map(move || environment.clone())
                .and(p(r));

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    fn auth() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Copy {
        optional::<String>("authorization")
    }

    fn body() -> impl Filter<Extract = (warp::hyper::body::Bytes,), Error = warp::Rejection> + Copy {
        content_length_limit(MAX_CONTENT_LENGTH).and(bytes())
    }

    route!(make_create_route => create, rt; end(), post(), body());
    route!(make_inquiry_route => inquiry, rt; p("inquiries"), end(), post(), body());
    route!(make_direct_route => direct, rt; p("direct"), end(), post(), auth(), body());
    route!(make_list_route => list, rt; end(), g(), auth(), query::<q::ListQuery>());
    route!(make_statistics_route => statistics, rt; p("statistics"), end(), g(), auth());
    route!(make_retrieve_route => retrieve, rt; p("id"), par::<String>(), end(), g(), auth());
    route!(make_transition_route => transition, rt; p!("id" / String / "status"), end(), patch(), auth(), body());
    route!(make_notes_route => notes, rt; p!("id" / String / "notes"), end(), patch(), auth(), body());
    route!(make_delete_route => delete, rt; p("id"), par::<String>(), end(), delete(), auth());

    /// Every booking route, combined.
    pub fn make_booking_routes(environment: Environment) -> Route {
        make_create_route(environment.clone())
            .or(make_inquiry_route(environment.clone()))
            .unify()
            .or(make_direct_route(environment.clone()))
            .unify()
            .or(make_statistics_route(environment.clone()))
            .unify()
            .or(make_list_route(environment.clone()))
            .unify()
            .or(make_retrieve_route(environment.clone()))
            .unify()
            .or(make_transition_route(environment.clone()))
            .unify()
            .or(make_notes_route(environment.clone()))
            .unify()
            .or(make_delete_route(environment))
            .unify()
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use time::Date;
    use uuid::Uuid;
    use warp::http::StatusCode;
    use warp::Filter;

    use crate::db::mock::MockDb;
    use crate::environment::{Config, Environment};
    use crate::policy::{AuthorizationPolicy, BookingRules};
    use crate::urls::Urls;

    fn environment(db: Arc<MockDb>, policy: AuthorizationPolicy) -> Environment {
        let logger = Arc::new(log::discard_logger());
        let urls = Arc::new(Urls::new("http://localhost:8080/", "bookings").unwrap());
        let config = Config::new(policy, BookingRules::default());

        Environment::new(logger, db, urls, config)
            .with_clock(Arc::new(|| Date::try_from_ymd(2026, 7, 1).unwrap()))
    }

    fn mock_db() -> Arc<MockDb> {
        Arc::new(MockDb::new().with_course(1, "Surf Initiation", 8000))
    }

    fn routes(
        environment: Environment,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let logger = environment.logger.clone();

        super::make_booking_routes(environment)
            .recover(move |r| super::format_rejection(logger.clone(), r))
    }

    fn booking_body() -> Value {
        json!({
            "courseId": 1,
            "name": "Jane",
            "phone": "0612345678",
            "date": "2026-07-14",
            "time": "10:00",
            "participants": 2,
            "totalPrice": 0,
        })
    }

    fn body_json(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn public_booking_is_created() {
        let filter = routes(environment(mock_db(), AuthorizationPolicy::Enforced));

        let response = warp::test::request()
            .method("POST")
            .path("/bookings")
            .json(&booking_body())
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("server-timing"));

        let body = body_json(&response);
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["total_price"], 160.0);
        assert_eq!(body["item"]["kind"], "course");
        assert_eq!(body["date"], "2026-07-14");

        let location = response.headers()["location"].to_str().unwrap();
        assert_eq!(
            location,
            format!("http://localhost:8080/bookings/id/{}", body["id"].as_str().unwrap())
        );
    }

    #[tokio::test]
    async fn errors_have_kinds_and_statuses() {
        let filter = routes(environment(mock_db(), AuthorizationPolicy::Enforced));

        let mut missing = booking_body();
        missing["courseId"] = json!(999_999);
        let response = warp::test::request()
            .method("POST")
            .path("/bookings")
            .json(&missing)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(&response);
        assert_eq!(body["operation"], "create");
        assert_eq!(body["entry_point"], "public");
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["message"], "course 999999 not found");

        let response = warp::test::request()
            .method("POST")
            .path("/bookings")
            .body("{not json")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["kind"], "validation");
    }

    #[tokio::test]
    async fn admin_routes_need_a_token() {
        let db = mock_db();
        let token = db.add_admin_token();
        let filter = routes(environment(db, AuthorizationPolicy::Enforced));

        let response = warp::test::request()
            .method("GET")
            .path("/bookings/statistics")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warp::test::request()
            .method("GET")
            .path("/bookings/statistics")
            .header("authorization", format!("Bearer {}", Uuid::new_v4()))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = warp::test::request()
            .method("GET")
            .path("/bookings/statistics")
            .header("authorization", format!("Bearer {}", token))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["total"], 0);
    }

    #[tokio::test]
    async fn status_changes_follow_the_table() {
        let filter = routes(environment(mock_db(), AuthorizationPolicy::Disabled));

        let response = warp::test::request()
            .method("POST")
            .path("/bookings")
            .json(&booking_body())
            .reply(&filter)
            .await;
        let id = body_json(&response)["id"].as_str().unwrap().to_owned();
        let status_path = format!("/bookings/id/{}/status", id);

        let response = warp::test::request()
            .method("PATCH")
            .path(&status_path)
            .json(&json!({"status": "COMPLETED"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(&response)["kind"], "invalid_transition");

        let response = warp::test::request()
            .method("PATCH")
            .path(&status_path)
            .json(&json!({"status": "SHIPPED"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("PATCH")
            .path(&status_path)
            .json(&json!({"status": "CONFIRMED"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["status"], "CONFIRMED");

        let response = warp::test::request()
            .method("PATCH")
            .path(&format!("/bookings/id/{}/notes", id))
            .json(&json!({"notes": "Arrives late"}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["notes"], "Arrives late");

        let response = warp::test::request()
            .method("GET")
            .path("/bookings?status=CONFIRMED&limit=10")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(&response);
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["bookings"][0]["id"], id.as_str());

        let response = warp::test::request()
            .method("DELETE")
            .path(&format!("/bookings/id/{}", id))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/bookings/id/{}", id))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let filter = routes(environment(mock_db(), AuthorizationPolicy::Disabled));

        let response = warp::test::request()
            .method("GET")
            .path("/bookings/id/not-a-uuid")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["id"], "not-a-uuid");
    }
}
