// MiniSvc
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the REST server.

use crate::driver::Driver;
use crate::model::DriverId;
use axum::Router;
use axum::http::HeaderMap;
use minisvc_core::metrics::{Metrics, instrument};
use minisvc_core::rest::{RestError, RestResult, single_header};
use std::sync::Arc;

mod events_post;
mod trip_action_post;
mod trip_get;
mod trips_get;
#[cfg(test)]
mod testutils;

/// Name of the header that carries the identity of the calling driver.
const USER_ID_HEADER: &str = "user_id";

/// Extracts the identity of the calling driver from the request `headers`.
fn get_user_id(headers: &HeaderMap) -> RestResult<DriverId> {
    match single_header(headers, USER_ID_HEADER)? {
        Some(value) => Ok(DriverId::new(value)?),
        None => Err(RestError::InvalidRequest("No user_id".to_owned())),
    }
}

/// Creates the router for the application, reporting the requests it serves to `metrics`.
pub(crate) fn app(driver: Driver, metrics: Arc<Metrics>) -> Router {
    use axum::routing::{get, post};
    let api = Router::new()
        .route("/events", post(events_post::handler))
        .route("/trips", get(trips_get::handler))
        .route("/trips/:trip_id", get(trip_get::handler))
        .route("/trips/:trip_id/:action", post(trip_action_post::handler))
        .with_state(driver);
    instrument(api, metrics)
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use axum::http::{self, HeaderValue};
    use minisvc_core::rest::testutils::*;

    #[tokio::test]
    async fn test_metrics_count_requests_per_route() {
        let context = TestContext::setup(&[]).await;

        OneShotBuilder::new(context.app(), (http::Method::GET, "/trips/t1"))
            .with_header("user_id", "d1")
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Trip not found")
            .await;
        for _ in 0..3 {
            OneShotBuilder::new(context.app(), (http::Method::POST, "/trips/t1/accept"))
                .send_empty()
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_error("No user_id")
                .await;
        }

        OneShotBuilder::new(context.app(), (http::Method::GET, "/metrics"))
            .send_empty()
            .await
            .expect_text(r#"http_requests_total\{handler="GET /trips/:trip_id"\} 1"#)
            .await;
        OneShotBuilder::new(context.app(), (http::Method::GET, "/metrics"))
            .send_empty()
            .await
            .expect_text(r#"http_requests_total\{handler="POST /trips/:trip_id/:action"\} 3"#)
            .await;
    }

    #[test]
    fn test_get_user_id_ok() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("d1"));
        assert_eq!(DriverId::new("d1").unwrap(), get_user_id(&headers).unwrap());
    }

    #[test]
    fn test_get_user_id_missing() {
        assert_eq!(
            RestError::InvalidRequest("No user_id".to_owned()),
            get_user_id(&HeaderMap::new()).unwrap_err()
        );
    }

    #[test]
    fn test_get_user_id_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(""));
        assert_eq!(
            RestError::InvalidRequest("driver id cannot be empty".to_owned()),
            get_user_id(&headers).unwrap_err()
        );
    }

    #[test]
    fn test_get_user_id_duplicate() {
        let mut headers = HeaderMap::new();
        headers.append(USER_ID_HEADER, HeaderValue::from_static("d1"));
        headers.append(USER_ID_HEADER, HeaderValue::from_static("d2"));
        match get_user_id(&headers).unwrap_err() {
            RestError::InvalidRequest(msg) => assert!(msg.contains("repeated")),
            e => panic!("Unexpected error: {:?}", e),
        }
    }
}
