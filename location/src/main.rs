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

//! Entry point to the location service.

#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use minisvc_core::db::postgres::{self, PostgresOptions};
use minisvc_core::env::get_optional_var;
use minisvc_location::{LocationOptions, serve};
use std::net::Ipv4Addr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of all configuration variables.
const ENV_PREFIX: &str = "LOCATION";

/// Idle timeout of database connections when neither `<prefix>_DB_IDLE_TIMEOUT` nor
/// `<prefix>_IDLE_TIMEOUT` are set.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads the database settings under `<prefix>_DB_*`.
///
/// `<prefix>_IDLE_TIMEOUT` is the legacy name of `<prefix>_DB_IDLE_TIMEOUT` and only applies when
/// the latter is unset.
fn db_options_from_env(prefix: &str) -> Result<PostgresOptions, String> {
    let mut db_opts = PostgresOptions::from_env(&format!("{}_DB", prefix))?;
    if db_opts.idle_timeout.is_none() {
        let idle_timeout = get_optional_var::<Duration>(prefix, "IDLE_TIMEOUT")?;
        db_opts.idle_timeout = Some(idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT));
    }
    Ok(db_opts)
}

/// Runs the service, returning an error message on failure.
async fn run() -> Result<(), String> {
    let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(8080);
    let opts = LocationOptions::from_env(ENV_PREFIX)?;

    let db_opts = db_options_from_env(ENV_PREFIX)?;
    let db = postgres::connect(db_opts).map_err(|e| e.to_string())?;

    serve((Ipv4Addr::UNSPECIFIED, port), Arc::new(db), opts).await.map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        process::exit(1);
    }
}
