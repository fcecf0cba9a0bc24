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
use axum::Router;
use minisvc_core::metrics::{Metrics, instrument};
use std::sync::Arc;

mod driver_location_post;
mod drivers_get;
mod drivers_post;
#[cfg(test)]
mod testutils;

/// Creates the router for the application, reporting the requests it serves to `metrics`.
pub(crate) fn app(driver: Driver, metrics: Arc<Metrics>) -> Router {
    use axum::routing::{get, post};
    let api = Router::new()
        .route("/drivers", get(drivers_get::handler).post(drivers_post::handler))
        .route("/drivers/:driver_id/location", post(driver_location_post::handler))
        .with_state(driver);
    instrument(api, metrics)
}
