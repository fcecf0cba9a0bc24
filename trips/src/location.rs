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

//! Client to query the location service for drivers near a point.

use crate::model::{DriverId, LatLng};
use async_trait::async_trait;
use log::warn;
use minisvc_core::driver::{DriverError, DriverResult};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

/// Converts a `reqwest::Error` to a `DriverError`.
fn reqwest_error_to_driver_error(e: reqwest::Error) -> DriverError {
    DriverError::BackendError(format!("Location service request failed: {}", e))
}

/// Converts a `reqwest::Response` with an unexpected status to a `DriverError`.
async fn http_response_to_driver_error(response: Response) -> DriverError {
    let status = response.status();
    match response.text().await {
        Ok(text) => DriverError::BackendError(format!(
            "Location service returned status {} with text '{}'",
            status, text
        )),
        Err(e) => DriverError::BackendError(format!(
            "Location service returned status {} and failed to get text due to {}",
            status, e
        )),
    }
}

/// Finds drivers around a location.
#[async_trait]
pub trait LocationClient {
    /// Returns the identifiers of the drivers within `radius_km` kilometers of `center`.
    async fn find_drivers(&self, center: &LatLng, radius_km: f64) -> DriverResult<Vec<DriverId>>;
}

/// A driver entry as returned by the location service.  Fields other than the id are ignored.
#[derive(Deserialize)]
struct DriverEntry {
    /// Identifier of the driver.
    id: DriverId,
}

/// Location client backed by the REST API of the location service.
#[derive(Clone, Debug)]
pub struct HttpLocationClient {
    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,

    /// Base URL of the location service API.
    base: Url,
}

impl HttpLocationClient {
    /// Creates a new client that talks to the location service at `base`.
    pub fn new(base: &str) -> Result<Self, String> {
        let base = Url::parse(base).map_err(|e| format!("Invalid location URL '{}': {}", base, e))?;
        if base.cannot_be_a_base() {
            return Err(format!("Invalid location URL '{}': cannot be a base", base));
        }
        Ok(Self { client: Client::default(), base })
    }

    /// Computes the URL to query for drivers around `center`.
    fn drivers_url(&self, center: &LatLng, radius_km: f64) -> DriverResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DriverError::BackendError("Invalid location URL".to_owned()))?
            .pop_if_empty()
            .push("drivers");
        url.query_pairs_mut()
            .append_pair("lat", &center.lat().to_string())
            .append_pair("lng", &center.lng().to_string())
            .append_pair("radius", &radius_km.to_string());
        Ok(url)
    }
}

#[async_trait]
impl LocationClient for HttpLocationClient {
    async fn find_drivers(&self, center: &LatLng, radius_km: f64) -> DriverResult<Vec<DriverId>> {
        let url = self.drivers_url(center, radius_km)?;

        let response =
            self.client.get(url.clone()).send().await.map_err(reqwest_error_to_driver_error)?;
        match response.status() {
            StatusCode::OK => {
                let entries: Vec<DriverEntry> =
                    response.json().await.map_err(reqwest_error_to_driver_error)?;
                Ok(entries.into_iter().map(|e| e.id).collect())
            }
            StatusCode::NOT_FOUND => Ok(vec![]),
            _ => {
                let e = http_response_to_driver_error(response).await;
                warn!("Query {} failed: {}", url, e);
                Err(e)
            }
        }
    }
}
