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

//! PostgreSQL backend, used by the services in production.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::{info, warn};
use sqlx::Transaction;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgPool, PgPoolOptions, Postgres,
};
use std::time::Duration;

/// Classifies a PostgreSQL SQLSTATE `code` into our error types.
fn map_sqlstate(code: &str, e: &PgDatabaseError) -> DbError {
    match code {
        "23503" => DbError::NotFound,
        "23505" => DbError::AlreadyExists,
        "53300" => DbError::Unavailable,
        _ => DbError::BackendError(format!("PostgreSQL error {}: {}", code, e)),
    }
}

/// Converts an error returned by `sqlx` while talking to PostgreSQL.
///
/// Foreign key violations become `NotFound` because they mean that a referenced row is missing.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.try_downcast_ref::<PgDatabaseError>() {
            Some(pg) => map_sqlstate(pg.code(), pg),
            None => DbError::BackendError(e.to_string()),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection and pool settings for a PostgreSQL server.
#[derive(Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Server name or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Name of the database holding the service tables.
    pub database: String,

    /// Role to log in as.
    pub username: String,

    /// Password of `username`.  Never printed.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Connections the pool keeps open even when idle.
    pub min_connections: Option<u32>,

    /// Upper bound on concurrently open connections.
    pub max_connections: Option<u32>,

    /// How long an unused connection stays in the pool.
    pub idle_timeout: Option<Duration>,
}

impl PostgresOptions {
    /// Reads the settings from `<prefix>_HOST`, `<prefix>_PORT`, `<prefix>_DATABASE`,
    /// `<prefix>_USERNAME` and `<prefix>_PASSWORD`, which are required, plus the optional
    /// `<prefix>_MIN_CONNECTIONS`, `<prefix>_MAX_CONNECTIONS` and `<prefix>_IDLE_TIMEOUT`.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            idle_timeout: get_optional_var::<Duration>(prefix, "IDLE_TIMEOUT")?,
        })
    }

    /// Builds the pool settings, leaving `sqlx` defaults for anything unset.
    fn pool_options(&self) -> PgPoolOptions {
        let mut pool = PgPoolOptions::new();
        if let Some(n) = self.min_connections {
            pool = pool.min_connections(n);
        }
        if let Some(n) = self.max_connections {
            pool = pool.max_connections(n);
        }
        if let Some(timeout) = self.idle_timeout {
            pool = pool.idle_timeout(timeout);
        }
        pool
    }
}

/// Creates a pool for the server described by `opts` without connecting yet.
pub fn connect(opts: PostgresOptions) -> DbResult<PostgresDb> {
    let target = PgConnectOptions::new()
        .host(&opts.host)
        .port(opts.port)
        .database(&opts.database)
        .username(&opts.username)
        .password(&opts.password);
    info!("Using PostgreSQL database {} on {}:{}", opts.database, opts.host, opts.port);
    Ok(PostgresDb { pool: opts.pool_options().connect_lazy_with(target) })
}

/// A PostgreSQL connection checked out of the pool, possibly inside a transaction.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// Autocommit connection.
    PoolExec(PoolConnection<Postgres>),

    /// Open transaction.
    TxExec(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Connection to run `sqlx` queries on.
    pub fn conn(&mut self) -> &mut PgConnection {
        match self {
            PostgresExecutor::PoolExec(conn) => &mut **conn,
            PostgresExecutor::TxExec(tx) => &mut **tx,
        }
    }

    /// Commits the open transaction.  Only valid on `TxExec`.
    pub(super) async fn commit(self) -> DbResult<()> {
        let PostgresExecutor::TxExec(tx) = self else {
            unreachable!("Only transactions can be committed");
        };
        tx.commit().await.map_err(map_sqlx_error)
    }
}

/// Pool of connections to a PostgreSQL server.
pub struct PostgresDb {
    /// Connections shared by all concurrent requests.
    pool: PgPool,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("PostgreSQL pool dropped while still open");
        }
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Executor::Postgres(PostgresExecutor::PoolExec(conn)))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Executes the semicolon-separated statements in `schema`.
pub async fn run_schema(e: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(e.conn()).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test helpers for the PostgreSQL backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the server named by the `PGSQL_TEST_*` variables.
    ///
    /// The pool holds exactly one connection whose `search_path` points at `pg_temp`, so all
    /// tables created by a test vanish when the pool closes.  Tests must not hold two executors
    /// at once.  Panics on any error.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let mut opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
        opts.min_connections = Some(1);
        opts.max_connections = Some(1);
        let db = connect(opts).unwrap();

        let mut conn = db.pool.acquire().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(&mut *conn).await.unwrap();
        db
    }
}
