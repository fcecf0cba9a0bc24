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

//! API to receive events about trips.

use crate::driver::Driver;
use crate::model::Event;
use axum::extract::State;
use axum::{Json, http};
use minisvc_core::rest::RestResult;
use serde::{Deserialize, Serialize};

/// Message returned by this API.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct EventsPostResponse {
    /// Number of drivers the trip was offered to.
    pub(crate) offered: usize,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(event): Json<Event>,
) -> RestResult<(http::StatusCode, Json<EventsPostResponse>)> {
    let offered = driver.new_trip(event).await?;
    Ok((http::StatusCode::ACCEPTED, Json(EventsPostResponse { offered })))
}
