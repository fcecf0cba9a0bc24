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

//! Operations on drivers and their locations.

use crate::db;
use crate::driver::{Driver, with_timeout};
use crate::model::{self, DriverId, LatLng, Radius, distance_km};
use log::debug;
use minisvc_core::driver::DriverResult;

impl Driver {
    /// Registers a new `driver` at its reported location.
    pub(crate) async fn create_driver(self, driver: model::Driver) -> DriverResult<()> {
        with_timeout(self.opts.op_timeout, async move {
            let _query = self.metrics.start_query();
            db::create_driver(&mut self.db.ex().await?, &driver).await?;
            Ok(())
        })
        .await
    }

    /// Finds all drivers within `radius` of `center`, nearest first.
    ///
    /// Drivers at the same distance are returned in id order.
    pub(crate) async fn find_drivers(
        self,
        center: LatLng,
        radius: Radius,
    ) -> DriverResult<Vec<model::Driver>> {
        with_timeout(self.opts.op_timeout, async move {
            let _query = self.metrics.start_query();
            let drivers = db::get_drivers(&mut self.db.ex().await?).await?;
            let total = drivers.len();

            let mut nearby: Vec<(f64, model::Driver)> = drivers
                .into_iter()
                .map(|d| (distance_km(&center, &d.location), d))
                .filter(|(distance, _)| *distance <= radius.km())
                .collect();
            nearby.sort_by(|(d1, a), (d2, b)| d1.total_cmp(d2).then_with(|| a.id.cmp(&b.id)));

            debug!(
                "Found {} of {} drivers within {} km of {:?}",
                nearby.len(),
                total,
                radius.km(),
                center
            );
            Ok(nearby.into_iter().map(|(_, d)| d).collect())
        })
        .await
    }

    /// Moves the existing driver `id` to `location`.
    pub(crate) async fn update_driver_location(
        self,
        id: DriverId,
        location: LatLng,
    ) -> DriverResult<()> {
        with_timeout(self.opts.op_timeout, async move {
            let _query = self.metrics.start_query();
            db::update_driver_location(&mut self.db.ex().await?, &id, &location).await?;
            Ok(())
        })
        .await
    }
}
