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

//! API to get the details of a trip.

use crate::driver::Driver;
use crate::model::{Trip, TripId};
use crate::rest::get_user_id;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use minisvc_core::rest::{EmptyBody, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(trip_id): Path<String>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Json<Trip>> {
    let user_id = get_user_id(&headers)?;
    let trip_id = TripId::new(trip_id)?;
    let trip = driver.get_trip(trip_id, user_id).await?;
    Ok(Json(trip))
}
