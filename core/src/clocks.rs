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

//! Time sources.
//!
//! Code that reads the time or waits goes through a `Clock` so that tests can fake both.

use async_trait::async_trait;
use std::time::Duration;
use time::OffsetDateTime;

/// Source of the current time and of delays.
#[async_trait]
pub trait Clock {
    /// Current time in UTC.
    fn now_utc(&self) -> OffsetDateTime;

    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the operating system and tokio timers.
#[derive(Clone, Default)]
pub struct SystemClock {}

#[async_trait]
impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        // Drop sub-second precision below microseconds so that timestamps survive a round trip
        // through the database unchanged.
        let now = OffsetDateTime::now_utc();
        let micros = now.microsecond();
        now.replace_microsecond(micros).unwrap_or(now)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Fake clocks for tests.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use std::sync::Mutex;

    /// State of a `SettableClock`.
    struct State {
        /// Current fake time.
        now: OffsetDateTime,

        /// Number of times `sleep` has been called.
        sleeps: usize,
    }

    /// Clock frozen at an instant chosen by the test.
    ///
    /// `sleep` moves the instant forward by the requested duration and returns right away.
    pub struct SettableClock {
        state: Mutex<State>,
    }

    impl SettableClock {
        /// Creates a clock frozen at `now`.
        pub fn new(now: OffsetDateTime) -> Self {
            Self { state: Mutex::new(State { now, sleeps: 0 }) }
        }

        /// Moves the clock to `now`.
        pub fn set(&self, now: OffsetDateTime) {
            self.state.lock().unwrap().now = now;
        }

        /// Moves the clock forward by `delta`.
        pub fn advance(&self, delta: Duration) {
            let mut state = self.state.lock().unwrap();
            state.now += delta;
        }

        /// Number of completed `sleep` calls.
        pub fn sleeps(&self) -> usize {
            self.state.lock().unwrap().sleeps
        }
    }

    #[async_trait]
    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            self.state.lock().unwrap().now
        }

        async fn sleep(&self, duration: Duration) {
            {
                let mut state = self.state.lock().unwrap();
                state.now += duration;
                state.sleeps += 1;
            }
            tokio::task::yield_now().await;
        }
    }

}
