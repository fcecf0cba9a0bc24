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
use crate::driver::{Driver, LocationOptions};
use crate::model;
use crate::rest::app;
use axum::Router;
use minisvc_core::db::Db;
use minisvc_core::db::sqlite::testutils::setup;
use minisvc_core::metrics::Metrics;
use std::sync::Arc;

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let metrics = Arc::new(Metrics::default());
        let driver = Driver::new(db.clone(), metrics.clone(), LocationOptions::default());
        let app = app(driver, metrics);
        Self { db, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn create_driver(&self, driver: &model::Driver) {
        db::create_driver(&mut self.db.ex().await.unwrap(), driver).await.unwrap();
    }

    pub(crate) async fn get_drivers(&self) -> Vec<model::Driver> {
        db::get_drivers(&mut self.db.ex().await.unwrap()).await.unwrap()
    }
}
