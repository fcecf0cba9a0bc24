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

//! API to find the drivers near a location.

use crate::driver::Driver;
use crate::model::{self, LatLng, Radius};
use axum::Json;
use axum::extract::{Query, State};
use minisvc_core::rest::{EmptyBody, RestError, RestResult};
use serde::Deserialize;

/// Raw query parameters, validated by the handler to produce precise error messages.
#[derive(Deserialize)]
pub(crate) struct DriversQuery {
    /// Latitude of the center of the search.
    lat: Option<String>,

    /// Longitude of the center of the search.
    lng: Option<String>,

    /// Search radius in kilometers.
    radius: Option<String>,
}

/// Parses the query parameter `name` with raw `value` as a number.
fn parse_param(name: &str, value: Option<String>) -> RestResult<f64> {
    match value {
        None => Err(RestError::InvalidRequest(format!("Empty query parameter {}", name))),
        Some(value) if value.is_empty() => {
            Err(RestError::InvalidRequest(format!("Empty query parameter {}", name)))
        }
        Some(value) => value.parse::<f64>().map_err(|e| {
            RestError::InvalidRequest(format!("Invalid query parameter {}: {}", name, e))
        }),
    }
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<DriversQuery>,
    _: EmptyBody,
) -> RestResult<Json<Vec<model::Driver>>> {
    let lat = parse_param("lat", query.lat)?;
    let lng = parse_param("lng", query.lng)?;
    let radius = parse_param("radius", query.radius)?;

    let center = LatLng::new(lat, lng)?;
    let radius = Radius::new(radius)?;

    let drivers = driver.find_drivers(center, radius).await?;
    if drivers.is_empty() {
        return Err(RestError::NotFound("Drivers not found".to_owned()));
    }
    Ok(Json(drivers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutils::*;
    use crate::rest::testutils::*;
    use axum::http;
    use minisvc_core::rest::testutils::*;
    use serde::Serialize;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/drivers".to_owned())
    }

    #[derive(Serialize)]
    struct Params<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        lat: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lng: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        radius: Option<&'a str>,
    }

    const MOSCOW: Params<'static> =
        Params { lat: Some("55.75"), lng: Some("37.61"), radius: Some("20") };

    #[tokio::test]
    async fn test_found() {
        let context = TestContext::setup().await;
        context.create_driver(&driver("mid", 55.80, 37.70)).await;
        context.create_driver(&driver("near", 55.76, 37.62)).await;
        context.create_driver(&driver("far", 56.0, 38.0)).await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_query(MOSCOW)
            .send_empty()
            .await
            .expect_json::<Vec<model::Driver>>()
            .await;
        assert_eq!(vec![driver("near", 55.76, 37.62), driver("mid", 55.80, 37.70)], response);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;
        context.create_driver(&driver("far", 56.0, 38.0)).await;

        OneShotBuilder::new(context.app(), route())
            .with_query(MOSCOW)
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Drivers not found")
            .await;
    }

    #[tokio::test]
    async fn test_missing_params() {
        let context = TestContext::setup().await;

        for (params, name) in [
            (Params { lat: None, ..MOSCOW }, "lat"),
            (Params { lng: Some(""), ..MOSCOW }, "lng"),
            (Params { radius: None, ..MOSCOW }, "radius"),
        ] {
            OneShotBuilder::new(context.app(), route())
                .with_query(params)
                .send_empty()
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_error(&format!("Empty query parameter {}", name))
                .await;
        }
    }

    #[tokio::test]
    async fn test_bad_numbers() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query(Params { lng: Some("east"), ..MOSCOW })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Invalid query parameter lng")
            .await;

        OneShotBuilder::new(context.app(), route())
            .with_query(Params { lat: Some("91"), ..MOSCOW })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Latitude 91 out of range")
            .await;

        OneShotBuilder::new(context.app(), route())
            .with_query(Params { radius: Some("-1"), ..MOSCOW })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Radius -1 must be a non-negative number")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
