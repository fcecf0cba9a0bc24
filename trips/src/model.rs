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

//! High-level data types.

use derive_more::Display;
use minisvc_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Event type that announces a new trip.
pub(crate) const TRIP_CREATED_EVENT: &str = "trip.event.created";

/// Source that identifies this service in outgoing commands.
const COMMAND_SOURCE: &str = "/driver";

/// Content type of the payload of outgoing commands.
const COMMAND_CONTENT_TYPE: &str = "application/json";

/// Generates a string newtype that cannot hold empty values.
macro_rules! nonempty_id [
    ( $name:ident, $what:expr ) => {
        #[doc = concat!("Identifier of a ", $what, ".")]
        #[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $what, " identifier, which must not be empty.")]
            pub fn new<S: Into<String>>(id: S) -> ModelResult<Self> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ModelError(format!("{} id cannot be empty", $what)));
                }
                Ok(Self(id))
            }

            /// Returns the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> ModelResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    }
];

nonempty_id!(TripId, "trip");
nonempty_id!(DriverId, "driver");

/// Unvalidated coordinates as they come from the wire.
#[derive(Deserialize)]
struct RawLatLng {
    /// Latitude in degrees.
    lat: f64,

    /// Longitude in degrees.
    lng: f64,
}

/// A point on Earth in decimal degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "RawLatLng")]
pub struct LatLng {
    /// Latitude in degrees, in the [-90, 90] range.
    lat: f64,

    /// Longitude in degrees, in the [-180, 180] range.
    lng: f64,
}

impl LatLng {
    /// Creates a new point after validating that the coordinates are in range.
    pub fn new(lat: f64, lng: f64) -> ModelResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ModelError(format!("Latitude {} out of range", lat)));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ModelError(format!("Longitude {} out of range", lng)));
        }
        Ok(Self { lat, lng })
    }

    /// Returns the latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns the longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl TryFrom<RawLatLng> for LatLng {
    type Error = ModelError;

    fn try_from(raw: RawLatLng) -> ModelResult<Self> {
        LatLng::new(raw.lat, raw.lng)
    }
}

/// Unvalidated amount of money as it comes from the wire.
#[derive(Deserialize)]
struct RawMoney {
    /// Amount in units of `currency`.
    amount: f64,

    /// Currency code.
    currency: String,
}

/// An amount of money in a specific currency.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    /// Non-negative amount in units of `currency`.
    amount: f64,

    /// Three-letter ISO 4217 currency code in uppercase.
    currency: String,
}

impl Money {
    /// Creates a new amount of money, normalizing the `currency` code to uppercase.
    pub fn new<S: AsRef<str>>(amount: f64, currency: S) -> ModelResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ModelError(format!("Amount {} must be a non-negative number", amount)));
        }
        let currency = currency.as_ref();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ModelError(format!("Invalid currency code '{}'", currency)));
        }
        Ok(Self { amount, currency: currency.to_ascii_uppercase() })
    }

    /// Returns the amount.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Returns the currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl TryFrom<RawMoney> for Money {
    type Error = ModelError;

    fn try_from(raw: RawMoney) -> ModelResult<Self> {
        Money::new(raw.amount, raw.currency)
    }
}

/// Actions a driver can take on a trip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TripAction {
    /// The driver takes an offered trip.
    Accept,

    /// The driver picked up the passenger.
    Start,

    /// The driver dropped off the passenger.
    End,

    /// The driver abandons the trip.
    Cancel,
}

impl TripAction {
    /// Returns the type of the command emitted when this action succeeds.
    pub fn command_type(self) -> &'static str {
        match self {
            TripAction::Accept => "trip.command.accept",
            TripAction::Start => "trip.command.start",
            TripAction::End => "trip.command.end",
            TripAction::Cancel => "trip.command.cancel",
        }
    }
}

impl FromStr for TripAction {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "accept" => Ok(TripAction::Accept),
            "start" => Ok(TripAction::Start),
            "end" => Ok(TripAction::End),
            "cancel" => Ok(TripAction::Cancel),
            _ => Err(ModelError(format!("Unknown trip action '{}'", s))),
        }
    }
}

/// Lifecycle of a trip.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    /// Waiting for a driver to accept the trip.
    DriverSearch,

    /// A driver accepted the trip and is on the way.
    DriverFound,

    /// The passenger is on board.
    Started,

    /// The trip completed.
    Ended,

    /// The trip was abandoned.
    Canceled,
}

impl TripStatus {
    /// Returns the textual representation of the status, as used in the database and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::DriverSearch => "DRIVER_SEARCH",
            TripStatus::DriverFound => "DRIVER_FOUND",
            TripStatus::Started => "STARTED",
            TripStatus::Ended => "ENDED",
            TripStatus::Canceled => "CANCELED",
        }
    }

    /// Returns true if no further actions are possible from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Ended | TripStatus::Canceled)
    }

    /// Computes the status that results from applying `action` to a trip in this status, or `None`
    /// if the action is not valid now.
    pub fn transition(self, action: TripAction) -> Option<TripStatus> {
        match (self, action) {
            (TripStatus::DriverSearch, TripAction::Accept) => Some(TripStatus::DriverFound),
            (TripStatus::DriverFound, TripAction::Start) => Some(TripStatus::Started),
            (TripStatus::Started, TripAction::End) => Some(TripStatus::Ended),
            (status, TripAction::Cancel) if !status.is_terminal() => Some(TripStatus::Canceled),
            _ => None,
        }
    }
}

impl FromStr for TripStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "DRIVER_SEARCH" => Ok(TripStatus::DriverSearch),
            "DRIVER_FOUND" => Ok(TripStatus::DriverFound),
            "STARTED" => Ok(TripStatus::Started),
            "ENDED" => Ok(TripStatus::Ended),
            "CANCELED" => Ok(TripStatus::Canceled),
            _ => Err(ModelError(format!("Unknown trip status '{}'", s))),
        }
    }
}

/// A trip as seen by drivers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Trip {
    /// Identifier of the trip.
    pub id: TripId,

    /// Driver assigned to the trip, if any.
    pub driver_id: Option<DriverId>,

    /// Pickup location.
    pub from: LatLng,

    /// Drop-off location.
    pub to: LatLng,

    /// Price offered for the trip.
    pub price: Money,

    /// Current status of the trip.
    pub status: TripStatus,
}

/// An inbound event in CloudEvents format.
///
/// The `data` payload is kept raw because its shape depends on `event_type`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Event {
    /// Unique identifier of the event.
    pub id: String,

    /// Producer of the event.
    pub source: String,

    /// Type of the event, which determines the shape of `data`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Content type of `data`.
    pub datacontenttype: String,

    /// Time when the event was produced.
    pub time: String,

    /// Event payload.
    pub data: serde_json::Value,
}

/// Payload of a `trip.event.created` event.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TripCreatedData {
    /// Identifier of the new trip.
    pub trip_id: TripId,

    /// Identifier of the offer the trip originates from.
    pub offer_id: String,

    /// Price offered for the trip.
    pub price: Money,

    /// Status of the trip as seen by its producer.
    pub status: String,

    /// Pickup location.
    pub from: LatLng,

    /// Drop-off location.
    pub to: LatLng,
}

/// Payload of an outbound command.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CommandData {
    /// Trip the command refers to.
    pub trip_id: TripId,

    /// Driver that issued the command.
    pub driver: DriverId,

    /// Free-form explanation of the command, if the driver gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// An outbound command in CloudEvents format, recording an action taken by a driver.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Command {
    /// Unique identifier of the command.
    pub id: Uuid,

    /// Producer of the command.
    pub source: String,

    /// Type of the command.
    #[serde(rename = "type")]
    pub command_type: String,

    /// Content type of `data`.
    pub datacontenttype: String,

    /// Time when the command was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,

    /// Command payload.
    pub data: CommandData,
}

impl Command {
    /// Creates the command that records `driver` taking `action` on `trip_id` at `now`.
    pub fn new(
        action: TripAction,
        trip_id: TripId,
        driver: DriverId,
        reason: Option<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: COMMAND_SOURCE.to_owned(),
            command_type: action.command_type().to_owned(),
            datacontenttype: COMMAND_CONTENT_TYPE.to_owned(),
            time: now,
            data: CommandData { trip_id, driver, reason },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use serde_test::{Token, assert_de_tokens_error, assert_tokens};
    use time::macros::datetime;

    #[test]
    fn test_ids() {
        assert_eq!("t1", TripId::new("t1").unwrap().as_str());
        assert_eq!("d1", DriverId::new("d1").unwrap().as_str());
        assert_eq!(ModelError("trip id cannot be empty".to_owned()), TripId::new("").unwrap_err());
        assert_eq!(
            ModelError("driver id cannot be empty".to_owned()),
            DriverId::new("").unwrap_err()
        );
    }

    #[test]
    fn test_ids_serde() {
        assert_tokens(&TripId::new("t1").unwrap(), &[Token::Str("t1")]);
        assert_de_tokens_error::<DriverId>(&[Token::Str("")], "driver id cannot be empty");
    }

    #[test]
    fn test_latlng_ranges() {
        LatLng::new(-90.0, 180.0).unwrap();
        LatLng::new(-90.1, 0.0).unwrap_err();
        LatLng::new(0.0, 180.1).unwrap_err();
        LatLng::new(f64::NAN, 0.0).unwrap_err();
    }

    #[test]
    fn test_money() {
        let money = Money::new(10.5, "usd").unwrap();
        assert_eq!(10.5, money.amount());
        assert_eq!("USD", money.currency());

        assert_eq!(
            ModelError("Amount -1 must be a non-negative number".to_owned()),
            Money::new(-1.0, "USD").unwrap_err()
        );
        assert_eq!(
            ModelError("Invalid currency code 'US'".to_owned()),
            Money::new(1.0, "US").unwrap_err()
        );
        Money::new(1.0, "U$D").unwrap_err();
    }

    #[test]
    fn test_money_serde_normalizes() {
        let money: Money = serde_json::from_str(r#"{"amount": 3.25, "currency": "eur"}"#).unwrap();
        assert_eq!(Money::new(3.25, "EUR").unwrap(), money);
        assert_eq!(r#"{"amount":3.25,"currency":"EUR"}"#, serde_json::to_string(&money).unwrap());
    }

    #[test]
    fn test_trip_action_from_str() {
        assert_eq!(TripAction::Accept, "accept".parse().unwrap());
        assert_eq!(TripAction::Start, "start".parse().unwrap());
        assert_eq!(TripAction::End, "end".parse().unwrap());
        assert_eq!(TripAction::Cancel, "cancel".parse().unwrap());
        assert_eq!(
            ModelError("Unknown trip action 'fly'".to_owned()),
            "fly".parse::<TripAction>().unwrap_err()
        );
    }

    #[test]
    fn test_trip_status_strings() {
        for status in [
            TripStatus::DriverSearch,
            TripStatus::DriverFound,
            TripStatus::Started,
            TripStatus::Ended,
            TripStatus::Canceled,
        ] {
            assert_eq!(status, status.as_str().parse().unwrap());
            assert_eq!(
                format!("\"{}\"", status.as_str()),
                serde_json::to_string(&status).unwrap()
            );
        }
        "DRIVER_FOUN".parse::<TripStatus>().unwrap_err();
    }

    #[test]
    fn test_trip_status_transitions() {
        use TripAction::*;
        use TripStatus::*;

        assert_eq!(Some(DriverFound), DriverSearch.transition(Accept));
        assert_eq!(Some(Started), DriverFound.transition(Start));
        assert_eq!(Some(Ended), Started.transition(End));
        assert_eq!(Some(Canceled), DriverSearch.transition(Cancel));
        assert_eq!(Some(Canceled), DriverFound.transition(Cancel));
        assert_eq!(Some(Canceled), Started.transition(Cancel));

        assert_eq!(None, DriverSearch.transition(Start));
        assert_eq!(None, DriverSearch.transition(End));
        assert_eq!(None, DriverFound.transition(Accept));
        assert_eq!(None, DriverFound.transition(End));
        assert_eq!(None, Started.transition(Accept));
        assert_eq!(None, Started.transition(Start));
        for action in [Accept, Start, End, Cancel] {
            assert_eq!(None, Ended.transition(action));
            assert_eq!(None, Canceled.transition(action));
        }
    }

    #[test]
    fn test_trip_json() {
        let json = serde_json::to_value(trip("t1", None, TripStatus::DriverSearch)).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": "t1",
                "driver_id": null,
                "from": {"lat": 55.75, "lng": 37.61},
                "to": {"lat": 55.80, "lng": 37.70},
                "price": {"amount": 450.0, "currency": "RUB"},
                "status": "DRIVER_SEARCH",
            }),
            json
        );
    }

    #[test]
    fn test_event_parse() {
        let raw = r#"{
            "id": "e1",
            "source": "/trip",
            "type": "trip.event.created",
            "datacontenttype": "application/json",
            "time": "2023-12-01T10:00:00Z",
            "data": {
                "trip_id": "t1",
                "offer_id": "o1",
                "price": {"amount": 100, "currency": "RUB"},
                "status": "DRIVER_SEARCH",
                "from": {"lat": 1, "lng": 2},
                "to": {"lat": 3, "lng": 4}
            }
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(TRIP_CREATED_EVENT, event.event_type);

        let data: TripCreatedData = serde_json::from_value(event.data).unwrap();
        assert_eq!(TripId::new("t1").unwrap(), data.trip_id);
        assert_eq!(latlng(1.0, 2.0), data.from);
        assert_eq!(Money::new(100.0, "RUB").unwrap(), data.price);
    }

    #[test]
    fn test_command_new_and_json() {
        let command = Command::new(
            TripAction::Accept,
            TripId::new("t1").unwrap(),
            DriverId::new("d1").unwrap(),
            None,
            datetime!(2023-12-01 10:15:30 UTC),
        );
        assert_eq!(4, command.id.get_version_num());

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(command.id.to_string(), json["id"]);
        assert_eq!("/driver", json["source"]);
        assert_eq!("trip.command.accept", json["type"]);
        assert_eq!("application/json", json["datacontenttype"]);
        assert_eq!("2023-12-01T10:15:30Z", json["time"]);
        assert_eq!(serde_json::json!({"trip_id": "t1", "driver": "d1"}), json["data"]);

        let command2: Command = serde_json::from_value(json).unwrap();
        assert_eq!(command, command2);
    }

    #[test]
    fn test_command_reason() {
        let command = Command::new(
            TripAction::Cancel,
            TripId::new("t1").unwrap(),
            DriverId::new("d1").unwrap(),
            Some("flat tire".to_owned()),
            datetime!(2023-12-01 10:15:30 UTC),
        );
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!("trip.command.cancel", json["type"]);
        assert_eq!("flat tire", json["data"]["reason"]);
    }
}
