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

//! API for a driver to act on a trip.

use crate::driver::Driver;
use crate::model::{Trip, TripAction, TripId};
use crate::rest::get_user_id;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use minisvc_core::rest::{EmptyBody, RestError, RestResult};
use serde::Deserialize;

/// Optional query parameters.
#[derive(Deserialize)]
pub(crate) struct ActionQuery {
    /// Explanation of the action to attach to the emitted command.
    reason: Option<String>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path((trip_id, action)): Path<(String, String)>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Json<Trip>> {
    // Unknown actions behave like unknown routes.
    let action = action
        .parse::<TripAction>()
        .map_err(|e| RestError::NotFound(e.to_string()))?;
    let user_id = get_user_id(&headers)?;
    let trip_id = TripId::new(trip_id)?;
    let reason = query.reason.filter(|r| !r.is_empty());

    let trip = driver.update_status(trip_id, user_id, action, reason).await?;
    Ok(Json(trip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TripStatus;
    use crate::model::testutils::*;
    use crate::rest::testutils::*;
    use axum::http;
    use minisvc_core::rest::testutils::*;
    use serde::Serialize;

    fn route(trip_id: &str, action: &str) -> (http::Method, String) {
        (http::Method::POST, format!("/trips/{}/{}", trip_id, action))
    }

    #[derive(Serialize)]
    struct Params<'a> {
        reason: &'a str,
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", None, TripStatus::DriverSearch)).await;

        for (action, status) in [
            ("accept", TripStatus::DriverFound),
            ("start", TripStatus::Started),
            ("end", TripStatus::Ended),
        ] {
            let response = OneShotBuilder::new(context.app(), route("t1", action))
                .with_header("user_id", "d1")
                .send_empty()
                .await
                .expect_json::<Trip>()
                .await;
            assert_eq!(trip("t1", Some("d1"), status), response);
        }

        assert_eq!(trip("t1", Some("d1"), TripStatus::Ended), context.get_trip("t1").await);
        assert_eq!(
            vec!["trip.command.accept", "trip.command.start", "trip.command.end"],
            context
                .get_commands("t1")
                .await
                .iter()
                .map(|c| c.command_type.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_cancel_with_reason() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", Some("d1"), TripStatus::Started)).await;

        let response = OneShotBuilder::new(context.app(), route("t1", "cancel"))
            .with_query(Params { reason: "passenger left" })
            .with_header("user_id", "d1")
            .send_empty()
            .await
            .expect_json::<Trip>()
            .await;
        assert_eq!(trip("t1", Some("d1"), TripStatus::Canceled), response);

        let commands = context.get_commands("t1").await;
        assert_eq!(1, commands.len());
        assert_eq!("trip.command.cancel", commands[0].command_type);
        assert_eq!(Some("passenger left".to_owned()), commands[0].data.reason);
    }

    #[tokio::test]
    async fn test_wrong_driver() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", Some("d1"), TripStatus::DriverFound)).await;

        OneShotBuilder::new(context.app(), route("t1", "start"))
            .with_header("user_id", "d2")
            .send_empty()
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("WRONG_DRIVER")
            .await;

        assert_eq!(trip("t1", Some("d1"), TripStatus::DriverFound), context.get_trip("t1").await);
    }

    #[tokio::test]
    async fn test_wrong_status() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", Some("d1"), TripStatus::Ended)).await;

        OneShotBuilder::new(context.app(), route("t1", "cancel"))
            .with_header("user_id", "d1")
            .send_empty()
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("WRONG_STATUS")
            .await;

        assert!(context.get_commands("t1").await.is_empty());
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup(&[]).await;

        OneShotBuilder::new(context.app(), route("t1", "accept"))
            .with_header("user_id", "d1")
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Trip not found")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", None, TripStatus::DriverSearch)).await;

        OneShotBuilder::new(context.app(), route("t1", "fly"))
            .with_header("user_id", "d1")
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Unknown trip action 'fly'")
            .await;

        assert_eq!(trip("t1", None, TripStatus::DriverSearch), context.get_trip("t1").await);
    }

    #[tokio::test]
    async fn test_no_user_id() {
        let context = TestContext::setup(&[]).await;
        context.create_trip(&trip("t1", None, TripStatus::DriverSearch)).await;

        OneShotBuilder::new(context.app(), route("t1", "accept"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("No user_id")
            .await;

        assert_eq!(trip("t1", None, TripStatus::DriverSearch), context.get_trip("t1").await);
    }

    test_payload_must_be_empty!(TestContext::setup(&[]).await.into_app(), route("t1", "accept"));
}
