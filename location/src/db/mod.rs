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

//! Database abstraction to manipulate driver locations.

use crate::model::{Driver, DriverId, LatLng};
#[cfg(feature = "postgres")]
use minisvc_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use minisvc_core::db::sqlite;
use minisvc_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Builds a `Driver` from the raw `id`, `latitude` and `longitude` columns of a row.
fn build_driver(id: String, latitude: f64, longitude: f64) -> DbResult<Driver> {
    let id = DriverId::new(id)?;
    let location = LatLng::new(latitude, longitude)?;
    Ok(Driver { id, location })
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Driver {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(postgres::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(postgres::map_sqlx_error)?;
        build_driver(id, latitude, longitude)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Driver {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(sqlite::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(sqlite::map_sqlx_error)?;
        build_driver(id, latitude, longitude)
    }
}

/// Registers a new `driver` at its current location.
pub(crate) async fn create_driver(ex: &mut Executor, driver: &Driver) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO drivers (id, latitude, longitude) VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(driver.id.as_str())
                .bind(driver.location.lat())
                .bind(driver.location.lng())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO drivers (id, latitude, longitude) VALUES (?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(driver.id.as_str())
                .bind(driver.location.lat())
                .bind(driver.location.lng())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets all known drivers, sorted by id.
pub(crate) async fn get_drivers(ex: &mut Executor) -> DbResult<Vec<Driver>> {
    let query_str = "SELECT id, latitude, longitude FROM drivers ORDER BY id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Driver::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Driver::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Moves the existing driver `id` to `location`.
pub(crate) async fn update_driver_location(
    ex: &mut Executor,
    id: &DriverId,
    location: &LatLng,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE drivers SET latitude = $1, longitude = $2 WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(location.lat())
                .bind(location.lng())
                .bind(id.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE drivers SET latitude = ?, longitude = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(location.lat())
                .bind(location.lng())
                .bind(id.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Update affected {} rows instead of 1", n))),
    }
}
