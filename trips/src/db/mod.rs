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

//! Database abstraction to manipulate trips and the outbox of commands.

use crate::model::{Command, DriverId, LatLng, Money, Trip, TripId};
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

/// Extracts a `Trip` from a `row`, mapping column errors with `map_err`.
///
/// The column accessors are the same for all backends but their types are not, hence the macro.
macro_rules! trip_from_row [
    ( $row:expr, $map_err:path ) => {{
        let row = $row;
        let id: String = row.try_get("id").map_err($map_err)?;
        let driver_id: Option<String> = row.try_get("driver_id").map_err($map_err)?;
        let from_lat: f64 = row.try_get("from_lat").map_err($map_err)?;
        let from_lng: f64 = row.try_get("from_lng").map_err($map_err)?;
        let to_lat: f64 = row.try_get("to_lat").map_err($map_err)?;
        let to_lng: f64 = row.try_get("to_lng").map_err($map_err)?;
        let price_amount: f64 = row.try_get("price_amount").map_err($map_err)?;
        let price_currency: String = row.try_get("price_currency").map_err($map_err)?;
        let status: String = row.try_get("status").map_err($map_err)?;

        Ok(Trip {
            id: TripId::new(id)?,
            driver_id: driver_id.map(DriverId::new).transpose()?,
            from: LatLng::new(from_lat, from_lng)?,
            to: LatLng::new(to_lat, to_lng)?,
            price: Money::new(price_amount, price_currency)?,
            status: status.parse()?,
        })
    }}
];

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Trip {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        trip_from_row!(row, postgres::map_sqlx_error)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Trip {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        trip_from_row!(row, sqlite::map_sqlx_error)
    }
}

/// Parses the JSON `payload` of a stored command.
#[cfg(test)]
fn parse_command(payload: &str) -> DbResult<Command> {
    serde_json::from_str(payload)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid command payload: {}", e)))
}

/// Stores a new `trip`.
pub(crate) async fn create_trip(ex: &mut Executor, trip: &Trip) -> DbResult<()> {
    let driver_id = trip.driver_id.as_ref().map(DriverId::as_str);
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO trips
                    (id, driver_id, from_lat, from_lng, to_lat, to_lng,
                    price_amount, price_currency, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
            let done = sqlx::query(query_str)
                .bind(trip.id.as_str())
                .bind(driver_id)
                .bind(trip.from.lat())
                .bind(trip.from.lng())
                .bind(trip.to.lat())
                .bind(trip.to.lng())
                .bind(trip.price.amount())
                .bind(trip.price.currency())
                .bind(trip.status.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO trips
                    (id, driver_id, from_lat, from_lng, to_lat, to_lng,
                    price_amount, price_currency, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(trip.id.as_str())
                .bind(driver_id)
                .bind(trip.from.lat())
                .bind(trip.from.lng())
                .bind(trip.to.lat())
                .bind(trip.to.lng())
                .bind(trip.price.amount())
                .bind(trip.price.currency())
                .bind(trip.status.as_str())
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

/// Gets the trip identified by `id`.
pub(crate) async fn get_trip(ex: &mut Executor, id: &TripId) -> DbResult<Trip> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM trips WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Trip::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM trips WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Trip::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Replaces the stored `old` trip with `new`, updating its assigned driver and its status.
///
/// The update only happens if the stored row still matches the status and driver of `old`.
/// Returns `NotFound` if the trip does not exist or if another writer modified it after `old`
/// was read.
pub(crate) async fn update_trip(ex: &mut Executor, old: &Trip, new: &Trip) -> DbResult<()> {
    debug_assert_eq!(old.id, new.id);
    let old_driver_id = old.driver_id.as_ref().map(DriverId::as_str);
    let new_driver_id = new.driver_id.as_ref().map(DriverId::as_str);
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE trips SET driver_id = $1, status = $2
                WHERE id = $3 AND status = $4 AND driver_id IS NOT DISTINCT FROM $5";
            let done = sqlx::query(query_str)
                .bind(new_driver_id)
                .bind(new.status.as_str())
                .bind(new.id.as_str())
                .bind(old.status.as_str())
                .bind(old_driver_id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE trips SET driver_id = ?, status = ?
                WHERE id = ? AND status = ? AND driver_id IS ?";
            let done = sqlx::query(query_str)
                .bind(new_driver_id)
                .bind(new.status.as_str())
                .bind(new.id.as_str())
                .bind(old.status.as_str())
                .bind(old_driver_id)
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
        n => Err(DbError::BackendError(format!("Update of {} affected {} rows", new.id, n))),
    }
}

/// Appends `command` to the outbox of its trip, keyed by the time the command was issued.
pub(crate) async fn put_command(ex: &mut Executor, command: &Command) -> DbResult<()> {
    let payload = serde_json::to_string(command)
        .map_err(|e| DbError::BackendError(format!("Cannot serialize command: {}", e)))?;
    let id = command.id.to_string();

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO commands (id, trip_id, command_type, created, payload)
                VALUES ($1, $2, $3, $4, $5)";
            let done = sqlx::query(query_str)
                .bind(&id)
                .bind(command.data.trip_id.as_str())
                .bind(&command.command_type)
                .bind(command.time)
                .bind(&payload)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_sec, created_nsec) = sqlite::unpack_timestamp(command.time)?;

            let query_str = "
                INSERT INTO commands
                    (id, trip_id, command_type, created_sec, created_nsec, payload)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(&id)
                .bind(command.data.trip_id.as_str())
                .bind(&command.command_type)
                .bind(created_sec)
                .bind(created_nsec)
                .bind(&payload)
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

/// Gets all commands recorded for `trip_id`, oldest first.
#[cfg(test)]
pub(crate) async fn get_commands(ex: &mut Executor, trip_id: &TripId) -> DbResult<Vec<Command>> {
    let payloads: Vec<String> = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT payload FROM commands WHERE trip_id = $1 ORDER BY seq";
            let rows = sqlx::query(query_str)
                .bind(trip_id.as_str())
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.iter()
                .map(|row| row.try_get("payload").map_err(postgres::map_sqlx_error))
                .collect::<DbResult<_>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT payload FROM commands WHERE trip_id = ? ORDER BY seq";
            let rows = sqlx::query(query_str)
                .bind(trip_id.as_str())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.iter()
                .map(|row| row.try_get("payload").map_err(sqlite::map_sqlx_error))
                .collect::<DbResult<_>>()?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    payloads.iter().map(|payload| parse_command(payload)).collect()
}
