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

//! Persistence primitives shared by the services.
//!
//! Services talk to PostgreSQL in production and to in-memory SQLite in tests.  Each service
//! writes its queries once per backend and picks the right one by matching on `Executor`.

use crate::model::ModelError;
use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Failures reported by the persistence layer.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// A row with the same key is already stored.
    #[error("Already exists")]
    AlreadyExists,

    /// The backend failed in a way we do not classify.
    #[error("Database error: {0}")]
    BackendError(String),

    /// A stored row does not decode into a valid model object.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The row being read or modified is missing.
    #[error("Entity not found")]
    NotFound,

    /// The backend refused the connection, usually due to load.
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Handle to issue queries against whichever backend is configured.
///
/// The handle may be a plain pooled connection or an open transaction.  Callers match on the
/// variant to pick the SQL dialect.
pub enum Executor {
    /// PostgreSQL connection or transaction.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// SQLite connection or transaction.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An `Executor` bound to an open transaction.  Dropping it without `commit` rolls back.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Gives access to the executor to issue queries within the transaction.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Makes the changes of the transaction durable.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(e) => e.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Connection pool of a service.
#[async_trait]
pub trait Db {
    /// Checks out a connection that runs each query on its own.
    async fn ex(&self) -> DbResult<Executor>;

    /// Opens a transaction.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Shuts the pool down once the connections in use are returned.
    async fn close(&self);
}

/// Macros to run one suite of database tests against every backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Defines the test `name` as a call to `module::name` with the database built by `setup`,
    /// optionally tagged with the `extra` attribute.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Defines one test per `name`, each backed by a fresh database built by `setup`.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}
