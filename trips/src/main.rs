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

//! Entry point to the trips service.

#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use minisvc_core::db::postgres::{self, PostgresOptions};
use minisvc_core::env::{get_optional_var, get_required_var};
use minisvc_trips::location::HttpLocationClient;
use minisvc_trips::{TripsOptions, serve};
use std::net::Ipv4Addr;
use std::process;
use std::sync::Arc;

/// Prefix of all configuration variables.
const ENV_PREFIX: &str = "TRIPS";

/// Runs the service, returning an error message on failure.
async fn run() -> Result<(), String> {
    let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(8080);
    let location_url = get_required_var::<String>(ENV_PREFIX, "LOCATION_URL")?;
    let location = HttpLocationClient::new(&location_url)?;
    let opts = TripsOptions::from_env(ENV_PREFIX)?;

    let db_opts = PostgresOptions::from_env(&format!("{}_DB", ENV_PREFIX))?;
    let db = postgres::connect(db_opts).map_err(|e| e.to_string())?;

    serve((Ipv4Addr::UNSPECIFIED, port), Arc::new(db), Arc::new(location), opts)
        .await
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        process::exit(1);
    }
}
