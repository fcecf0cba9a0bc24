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

//! Business logic for the service.

use log::warn;
use minisvc_core::db::Db;
use minisvc_core::driver::{DriverError, DriverResult};
use minisvc_core::env::get_optional_var;
use minisvc_core::metrics::Metrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

mod drivers;
#[cfg(test)]
pub(crate) mod testutils;

/// Default value for `LocationOptions::op_timeout`.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration options for the business logic.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationOptions {
    /// Maximum time any single operation may take, including its database accesses.
    pub op_timeout: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self { op_timeout: DEFAULT_OP_TIMEOUT }
    }
}

impl LocationOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_OP_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            op_timeout: get_optional_var::<Duration>(prefix, "OP_TIMEOUT")?
                .unwrap_or(DEFAULT_OP_TIMEOUT),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot" and consume the driver in an
/// attempt to minimize the possibility of executing two operations that should be atomic.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Registry where database activity is reported.
    metrics: Arc<Metrics>,

    /// Configuration options.
    opts: LocationOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        metrics: Arc<Metrics>,
        opts: LocationOptions,
    ) -> Self {
        Self { db, metrics, opts }
    }
}

/// Runs `op` and aborts it if it does not complete within `timeout`.
async fn with_timeout<T, F>(timeout: Duration, op: F) -> DriverResult<T>
where
    F: Future<Output = DriverResult<T>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Operation did not complete within {:?}", timeout);
            Err(DriverError::BackendError("Operation timed out".to_owned()))
        }
    }
}
