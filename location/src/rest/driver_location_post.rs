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

//! API to report the current location of a driver.

use crate::driver::Driver;
use crate::model::{DriverId, LatLng};
use axum::Json;
use axum::extract::{Path, State};
use minisvc_core::rest::RestResult;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(driver_id): Path<String>,
    Json(location): Json<LatLng>,
) -> RestResult<&'static str> {
    let driver_id = DriverId::new(driver_id)?;
    driver.update_driver_location(driver_id, location).await?;
    Ok("Success operation\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutils::*;
    use crate::rest::testutils::*;
    use axum::http;
    use minisvc_core::rest::testutils::*;

    fn route(driver_id: &str) -> (http::Method, String) {
        (http::Method::POST, format!("/drivers/{}/location", driver_id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        context.create_driver(&driver("d1", 1.0, 2.0)).await;
        context.create_driver(&driver("d2", 3.0, 4.0)).await;

        OneShotBuilder::new(context.app(), route("d1"))
            .send_json(latlng(55.75, 37.61))
            .await
            .expect_text("^Success operation\n$")
            .await;

        assert_eq!(
            vec![driver("d1", 55.75, 37.61), driver("d2", 3.0, 4.0)],
            context.get_drivers().await
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route("d1"))
            .send_json(latlng(55.75, 37.61))
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Entity not found")
            .await;
    }

    #[tokio::test]
    async fn test_missing_field() {
        let context = TestContext::setup().await;
        context.create_driver(&driver("d1", 1.0, 2.0)).await;

        OneShotBuilder::new(context.app(), route("d1"))
            .send_json(serde_json::json!({"lat": 10.0}))
            .await
            .expect_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            .expect_text("missing field `lng`")
            .await;

        assert_eq!(vec![driver("d1", 1.0, 2.0)], context.get_drivers().await);
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route("d1"));
}
