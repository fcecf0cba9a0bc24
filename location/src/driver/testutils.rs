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
use crate::driver::{Driver, LocationOptions};
use crate::model;
use async_trait::async_trait;
use minisvc_core::db::sqlite::testutils::setup;
use minisvc_core::db::{Db, DbResult, Executor, TxExecutor};
use minisvc_core::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;

/// Database whose operations never complete.
pub(crate) struct StalledDb;

#[async_trait]
impl Db for StalledDb {
    async fn ex(&self) -> DbResult<Executor> {
        std::future::pending().await
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        std::future::pending().await
    }

    async fn close(&self) {}
}

pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    metrics: Arc<Metrics>,
    driver: Driver,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let metrics = Arc::new(Metrics::default());
        let driver = Driver::new(db.clone(), metrics.clone(), LocationOptions::default());
        Self { db, metrics, driver }
    }

    /// Creates a driver that talks to a database that never responds and reports to `metrics`.
    pub(crate) fn setup_stalled(op_timeout: Duration, metrics: Arc<Metrics>) -> Driver {
        Driver::new(Arc::new(StalledDb), metrics, LocationOptions { op_timeout })
    }

    pub(crate) fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    pub(crate) async fn create_driver(&self, driver: &model::Driver) {
        db::create_driver(&mut self.ex().await, driver).await.unwrap();
    }

    pub(crate) async fn get_drivers(&self) -> Vec<model::Driver> {
        db::get_drivers(&mut self.ex().await).await.unwrap()
    }
}
