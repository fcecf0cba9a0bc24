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

//! Error types of the business logic layer.
//!
//! Each service defines a cloneable `Driver` that bundles its injected dependencies, usually as
//! trait objects:
//!
//! ```rust
//! use minisvc_core::clocks::Clock;
//! use minisvc_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub struct Driver {
//!     /// Persistence for the entities of the service.
//!     db: Arc<dyn Db + Send + Sync>,
//!
//!     /// Source of the current time.
//!     clock: Arc<dyn Clock + Send + Sync>,
//! }
//! ```
//!
//! Operations take `self` by value.  A handler that needs two operations has to clone the driver,
//! which makes it visible that the two do not run in the same transaction.

use crate::db::DbError;
use crate::model::ModelError;

/// Failures of a business operation.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// The entity to create is already present.
    #[error("{0}")]
    AlreadyExists(String),

    /// A dependency such as the database or another service failed.
    #[error("{0}")]
    BackendError(String),

    /// The caller supplied invalid data.
    #[error("{0}")]
    InvalidInput(String),

    /// The entity is not in a state that allows the operation.
    #[error("{0}")]
    InvalidState(String),

    /// The entity to operate on is missing.
    #[error("{0}")]
    NotFound(String),

    /// The caller may not operate on the entity.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
