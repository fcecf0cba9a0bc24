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

//! In-memory registry of the trips offered to each driver and not yet collected.

use crate::model::{DriverId, TripId};
use futures::lock::Mutex;
use std::collections::HashMap;

/// Maximum number of uncollected offers kept per driver.  Older offers are dropped first.
const MAX_OFFERS_PER_DRIVER: usize = 100;

/// Pending trip offers keyed by the driver they were offered to.
pub(crate) struct Waitlist {
    /// Trips offered to each driver, in offer order.
    offers: Mutex<HashMap<DriverId, Vec<TripId>>>,

    /// Maximum length of each list in `offers`.
    limit: usize,
}

impl Default for Waitlist {
    fn default() -> Self {
        Self::with_limit(MAX_OFFERS_PER_DRIVER)
    }
}

impl Waitlist {
    /// Creates an empty waitlist that keeps up to `limit` offers per driver.
    pub(crate) fn with_limit(limit: usize) -> Self {
        assert!(limit > 0, "Waitlist limit must be positive");
        Self { offers: Mutex::default(), limit }
    }

    /// Records that `trip` was offered to `driver`.  Offering the same trip twice is a no-op.
    pub(crate) async fn offer(&self, driver: DriverId, trip: TripId) {
        let mut offers = self.offers.lock().await;
        let pending = offers.entry(driver).or_default();
        if pending.contains(&trip) {
            return;
        }
        if pending.len() == self.limit {
            pending.remove(0);
        }
        pending.push(trip);
    }

    /// Removes and returns all trips offered to `driver`.
    pub(crate) async fn take(&self, driver: &DriverId) -> Vec<TripId> {
        let mut offers = self.offers.lock().await;
        offers.remove(driver).unwrap_or_default()
    }

    /// Forgets every offer of `trip`, dropping drivers left without offers.
    pub(crate) async fn withdraw(&self, trip: &TripId) {
        let mut offers = self.offers.lock().await;
        offers.retain(|_, pending| {
            pending.retain(|id| id != trip);
            !pending.is_empty()
        });
    }

    /// Returns the number of drivers with pending offers.
    #[cfg(test)]
    async fn drivers(&self) -> usize {
        self.offers.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(id: &str) -> DriverId {
        DriverId::new(id).unwrap()
    }

    fn trip(id: &str) -> TripId {
        TripId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_take_empty() {
        let waitlist = Waitlist::default();
        assert!(waitlist.take(&driver("d1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_offer_and_take() {
        let waitlist = Waitlist::default();
        waitlist.offer(driver("d1"), trip("t1")).await;
        waitlist.offer(driver("d2"), trip("t1")).await;
        waitlist.offer(driver("d1"), trip("t2")).await;

        assert_eq!(vec![trip("t1"), trip("t2")], waitlist.take(&driver("d1")).await);
        assert!(waitlist.take(&driver("d1")).await.is_empty());
        assert_eq!(vec![trip("t1")], waitlist.take(&driver("d2")).await);
    }

    #[tokio::test]
    async fn test_offer_skips_duplicates() {
        let waitlist = Waitlist::default();
        waitlist.offer(driver("d1"), trip("t1")).await;
        waitlist.offer(driver("d1"), trip("t1")).await;
        waitlist.offer(driver("d1"), trip("t2")).await;
        waitlist.offer(driver("d1"), trip("t1")).await;

        assert_eq!(vec![trip("t1"), trip("t2")], waitlist.take(&driver("d1")).await);
    }

    #[tokio::test]
    async fn test_offer_drops_oldest_beyond_limit() {
        let waitlist = Waitlist::with_limit(2);
        waitlist.offer(driver("d1"), trip("t1")).await;
        waitlist.offer(driver("d1"), trip("t2")).await;
        waitlist.offer(driver("d1"), trip("t3")).await;
        waitlist.offer(driver("d2"), trip("t1")).await;

        assert_eq!(vec![trip("t2"), trip("t3")], waitlist.take(&driver("d1")).await);
        assert_eq!(vec![trip("t1")], waitlist.take(&driver("d2")).await);
    }

    #[tokio::test]
    async fn test_withdraw() {
        let waitlist = Waitlist::default();
        waitlist.offer(driver("d1"), trip("t1")).await;
        waitlist.offer(driver("d1"), trip("t2")).await;
        waitlist.offer(driver("d2"), trip("t1")).await;
        waitlist.offer(driver("d3"), trip("t3")).await;

        waitlist.withdraw(&trip("t1")).await;
        assert_eq!(2, waitlist.drivers().await);
        assert_eq!(vec![trip("t2")], waitlist.take(&driver("d1")).await);
        assert!(waitlist.take(&driver("d2")).await.is_empty());
        assert_eq!(vec![trip("t3")], waitlist.take(&driver("d3")).await);

        waitlist.withdraw(&trip("t9")).await;
        assert_eq!(0, waitlist.drivers().await);
    }
}
