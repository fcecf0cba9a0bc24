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

use crate::location::LocationClient;
use crate::waitlist::Waitlist;
use minisvc_core::clocks::Clock;
use minisvc_core::db::Db;
use minisvc_core::env::get_optional_var;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
pub(crate) mod testutils;
mod trips;

/// Default value for `TripsOptions::search_radius_km`.
const DEFAULT_SEARCH_RADIUS_KM: f64 = 20.0;

/// Default value for `TripsOptions::poll_interval`.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default value for `TripsOptions::poll_timeout`.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration options for the business logic.
#[derive(Clone, Debug, PartialEq)]
pub struct TripsOptions {
    /// Radius around the pickup point in which to look for drivers when a trip is created.
    pub search_radius_km: f64,

    /// Delay between checks for new offers while a driver waits for trips.
    pub poll_interval: Duration,

    /// Maximum time a driver waits for trips before getting an empty reply.
    pub poll_timeout: Duration,
}

impl Default for TripsOptions {
    fn default() -> Self {
        Self {
            search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl TripsOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_SEARCH_RADIUS`, `<prefix>_POLL_INTERVAL` and
    /// `<prefix>_POLL_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let search_radius_km = get_optional_var::<f64>(prefix, "SEARCH_RADIUS")?
            .unwrap_or(DEFAULT_SEARCH_RADIUS_KM);
        if !search_radius_km.is_finite() || search_radius_km <= 0.0 {
            return Err(format!(
                "Invalid value in environment variable {}_SEARCH_RADIUS: must be positive",
                prefix
            ));
        }

        let poll_interval = get_optional_var::<Duration>(prefix, "POLL_INTERVAL")?
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(format!(
                "Invalid value in environment variable {}_POLL_INTERVAL: must be positive",
                prefix
            ));
        }

        Ok(Self {
            search_radius_km,
            poll_interval,
            poll_timeout: get_optional_var::<Duration>(prefix, "POLL_TIMEOUT")?
                .unwrap_or(DEFAULT_POLL_TIMEOUT),
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

    /// Clock instance to obtain the current time and to wait between polls.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Client to find drivers near a trip.
    location: Arc<dyn LocationClient + Send + Sync>,

    /// Trips offered to drivers and not yet collected by them.
    waitlist: Arc<Waitlist>,

    /// Configuration options.
    opts: TripsOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        location: Arc<dyn LocationClient + Send + Sync>,
        opts: TripsOptions,
    ) -> Self {
        Self { db, clock, location, waitlist: Arc::new(Waitlist::default()), opts }
    }
}
