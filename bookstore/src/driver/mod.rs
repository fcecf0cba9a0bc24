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

use crate::store::BookStore;
use futures::lock::Mutex;
use std::sync::Arc;

mod books;
#[cfg(test)]
pub(crate) mod testutils;

/// Business logic.
///
/// The catalog is loaded and saved as a whole, so every operation holds `lock` for the duration of
/// its read-modify-write cycle.  Operations consume the driver to discourage issuing multiple
/// operations that are expected to be atomic together.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The storage backend for the catalog.
    store: Arc<dyn BookStore + Send + Sync>,

    /// Serializes all accesses to `store`.
    lock: Arc<Mutex<()>>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(store: Arc<dyn BookStore + Send + Sync>) -> Self {
        Self { store, lock: Arc::from(Mutex::new(())) }
    }
}
