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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::{Driver, TripsOptions};
use crate::location::testutils::MockLocationClient;
use crate::model::{Command, DriverId, Trip, TripId};
use minisvc_core::clocks::testutils::SettableClock;
use minisvc_core::db::sqlite::testutils::setup;
use minisvc_core::db::{Db, Executor};
use std::sync::Arc;
use time::macros::datetime;

/// Extracts the identifiers of `trips`, preserving their order.
pub(crate) fn ids(trips: &[Trip]) -> Vec<TripId> {
    trips.iter().map(|t| t.id.clone()).collect()
}

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    clock: Arc<SettableClock>,
    location: Arc<MockLocationClient>,
    driver: Driver,
}

impl TestContext {
    /// Sets up a driver with default options whose location client always finds `drivers`.
    pub(crate) async fn setup(drivers: &[&str]) -> Self {
        Self::setup_with_opts(drivers, TripsOptions::default()).await
    }

    /// Sets up a driver with `opts` whose location client always finds `drivers`.
    pub(crate) async fn setup_with_opts(drivers: &[&str], opts: TripsOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(datetime!(2023-12-01 10:00:00 UTC)));
        let location = Arc::new(MockLocationClient::new(drivers));
        let driver = Driver::new(db.clone(), clock.clone(), location.clone(), opts);
        Self { db, clock, location, driver }
    }

    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    pub(crate) fn location(&self) -> &MockLocationClient {
        &self.location
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Drains the offers pending for `driver`.
    pub(crate) async fn take_offers(&self, driver: &str) -> Vec<TripId> {
        self.driver.waitlist.take(&DriverId::new(driver).unwrap()).await
    }

    pub(crate) async fn create_trip(&self, trip: &Trip) {
        db::create_trip(&mut self.ex().await, trip).await.unwrap();
    }

    pub(crate) async fn get_trip(&self, id: &str) -> Trip {
        db::get_trip(&mut self.ex().await, &TripId::new(id).unwrap()).await.unwrap()
    }

    pub(crate) async fn get_commands(&self, trip_id: &str) -> Vec<Command> {
        db::get_commands(&mut self.ex().await, &TripId::new(trip_id).unwrap()).await.unwrap()
    }
}
