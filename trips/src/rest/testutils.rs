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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::{Driver, TripsOptions};
use crate::location::testutils::MockLocationClient;
use crate::model::{Command, Trip, TripId};
use crate::rest::app;
use axum::Router;
use minisvc_core::clocks::testutils::SettableClock;
use minisvc_core::db::Db;
use minisvc_core::db::sqlite::testutils::setup;
use minisvc_core::metrics::Metrics;
use std::sync::Arc;
use time::macros::datetime;

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    app: Router,
}

impl TestContext {
    /// Sets up the app with a location client that always finds `drivers`.
    pub(crate) async fn setup(drivers: &[&str]) -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(datetime!(2023-12-01 10:00:00 UTC)));
        let location = Arc::new(MockLocationClient::new(drivers));
        let driver = Driver::new(db.clone(), clock, location, TripsOptions::default());
        let app = app(driver, Arc::new(Metrics::default()));
        Self { db, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn create_trip(&self, trip: &Trip) {
        db::create_trip(&mut self.db.ex().await.unwrap(), trip).await.unwrap();
    }

    pub(crate) async fn get_trip(&self, id: &str) -> Trip {
        db::get_trip(&mut self.db.ex().await.unwrap(), &TripId::new(id).unwrap()).await.unwrap()
    }

    pub(crate) async fn get_commands(&self, trip_id: &str) -> Vec<Command> {
        db::get_commands(&mut self.db.ex().await.unwrap(), &TripId::new(trip_id).unwrap())
            .await
            .unwrap()
    }
}
