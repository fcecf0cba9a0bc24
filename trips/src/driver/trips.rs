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

//! Operations on trips on behalf of drivers.

use crate::db;
use crate::driver::Driver;
use crate::model::{
    Command, DriverId, Event, TRIP_CREATED_EVENT, Trip, TripAction, TripCreatedData, TripId,
    TripStatus,
};
use log::{debug, info};
use minisvc_core::db::DbError;
use minisvc_core::driver::{DriverError, DriverResult};

/// Error message returned when a driver touches a trip assigned to someone else.
const WRONG_DRIVER: &str = "WRONG_DRIVER";

/// Error message returned when an action is not valid for the current status of a trip.
const WRONG_STATUS: &str = "WRONG_STATUS";

/// Converts a database error from looking up a trip into a driver error.
fn trip_lookup_error(e: DbError) -> DriverError {
    match e {
        DbError::NotFound => DriverError::NotFound("Trip not found".to_owned()),
        e => e.into(),
    }
}

impl Driver {
    /// Processes an inbound `event`, returning the number of drivers a new trip was offered to.
    ///
    /// Events other than trip creations are ignored.
    pub(crate) async fn new_trip(self, event: Event) -> DriverResult<usize> {
        if event.event_type != TRIP_CREATED_EVENT {
            info!("Ignoring event {} of type {}", event.id, event.event_type);
            return Ok(0);
        }

        let data: TripCreatedData = serde_json::from_value(event.data).map_err(|e| {
            DriverError::InvalidInput(format!("Invalid {} payload: {}", TRIP_CREATED_EVENT, e))
        })?;
        let trip = Trip {
            id: data.trip_id,
            driver_id: None,
            from: data.from,
            to: data.to,
            price: data.price,
            status: TripStatus::DriverSearch,
        };
        // The trip is only stored once the search succeeds so that a redelivered event can retry.
        let drivers = self.location.find_drivers(&trip.from, self.opts.search_radius_km).await?;
        db::create_trip(&mut self.db.ex().await?, &trip).await?;

        for driver in &drivers {
            self.waitlist.offer(driver.clone(), trip.id.clone()).await;
        }
        info!("Offered trip {} to {} drivers", trip.id, drivers.len());
        Ok(drivers.len())
    }

    /// Waits for trips offered to `driver` and returns those that are still looking for a driver.
    ///
    /// Returns an empty list if nothing shows up before the poll timeout.
    pub(crate) async fn poll_trips(self, driver: DriverId) -> DriverResult<Vec<Trip>> {
        let deadline = self.clock.now_utc() + self.opts.poll_timeout;
        loop {
            let ids = self.waitlist.take(&driver).await;
            if !ids.is_empty() {
                let mut ex = self.db.ex().await?;
                let mut trips = Vec::with_capacity(ids.len());
                for id in ids {
                    match db::get_trip(&mut ex, &id).await {
                        Ok(trip) if trip.status == TripStatus::DriverSearch => trips.push(trip),
                        Ok(trip) => debug!("Skipping trip {} in status {:?}", id, trip.status),
                        Err(DbError::NotFound) => debug!("Skipping unknown trip {}", id),
                        Err(e) => return Err(e.into()),
                    }
                }
                if !trips.is_empty() {
                    return Ok(trips);
                }
            }

            if self.clock.now_utc() >= deadline {
                debug!("No trips for driver {} before the poll timeout", driver);
                return Ok(vec![]);
            }
            self.clock.sleep(self.opts.poll_interval).await;
        }
    }

    /// Gets the trip `trip_id` as seen by `driver`.
    ///
    /// A trip with an assigned driver is only visible to that driver.
    pub(crate) async fn get_trip(self, trip_id: TripId, driver: DriverId) -> DriverResult<Trip> {
        let trip =
            db::get_trip(&mut self.db.ex().await?, &trip_id).await.map_err(trip_lookup_error)?;
        match &trip.driver_id {
            Some(assigned) if *assigned != driver => {
                Err(DriverError::Unauthorized(WRONG_DRIVER.to_owned()))
            }
            _ => Ok(trip),
        }
    }

    /// Applies `action` by `driver` to the trip `trip_id` and records the resulting command.
    ///
    /// `reason` is an optional explanation that is attached to the command.
    pub(crate) async fn update_status(
        self,
        trip_id: TripId,
        driver: DriverId,
        action: TripAction,
        reason: Option<String>,
    ) -> DriverResult<Trip> {
        let mut tx = self.db.begin().await?;

        let old = db::get_trip(tx.ex(), &trip_id).await.map_err(trip_lookup_error)?;

        if old.status != TripStatus::DriverSearch && old.driver_id.as_ref() != Some(&driver) {
            return Err(DriverError::Unauthorized(WRONG_DRIVER.to_owned()));
        }

        let mut trip = old.clone();
        trip.status = old
            .status
            .transition(action)
            .ok_or_else(|| DriverError::InvalidState(WRONG_STATUS.to_owned()))?;
        if action == TripAction::Accept {
            trip.driver_id = Some(driver.clone());
        }
        match db::update_trip(tx.ex(), &old, &trip).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                debug!("Trip {} changed while applying {:?}", trip_id, action);
                return Err(DriverError::InvalidState(WRONG_STATUS.to_owned()));
            }
            Err(e) => return Err(e.into()),
        }

        let command = Command::new(action, trip_id, driver, reason, self.clock.now_utc());
        db::put_command(tx.ex(), &command).await?;

        tx.commit().await?;
        self.waitlist.withdraw(&trip.id).await;
        info!("Trip {} moved to {:?} by {}", trip.id, trip.status, command.data.driver);
        Ok(trip)
    }
}
