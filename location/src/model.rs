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

/// Number of statute miles in one nautical mile, approximately.
const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.1515;

/// Number of kilometers in a statute mile.
const KM_PER_STATUTE_MILE: f64 = 1.609344;

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

/// Computes the great-circle distance between `a` and `b` in kilometers.
///
/// Uses the spherical law of cosines.  Rounding errors can push the cosine slightly out of the
/// [-1, 1] domain of `acos` for (nearly) identical or antipodal points, so it is clamped.
pub fn distance_km(a: &LatLng, b: &LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (a.lng - b.lng).to_radians();

    let cos_angle = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * delta_lambda.cos();
    let angle = cos_angle.clamp(-1.0, 1.0).acos().to_degrees();

    // One minute of arc is one nautical mile.
    angle * 60.0 * STATUTE_MILES_PER_NAUTICAL_MILE * KM_PER_STATUTE_MILE
}

/// Identifier of a driver.
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct DriverId(String);

impl DriverId {
    /// Creates a new driver identifier, which must not be empty.
    pub fn new<S: Into<String>>(id: S) -> ModelResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError("Driver id cannot be empty".to_owned()));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DriverId {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        DriverId::new(value)
    }
}

impl From<DriverId> for String {
    fn from(value: DriverId) -> Self {
        value.0
    }
}

/// A driver and its last known location.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Driver {
    /// Identifier of the driver.
    pub id: DriverId,

    /// Last reported location of the driver.
    pub location: LatLng,
}

/// A search radius in kilometers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Radius(f64);

impl Radius {
    /// Creates a new radius, which must be finite and non-negative.
    pub fn new(km: f64) -> ModelResult<Self> {
        if !km.is_finite() || km < 0.0 {
            return Err(ModelError(format!("Radius {} must be a non-negative number", km)));
        }
        Ok(Self(km))
    }

    /// Returns the radius in kilometers.
    pub fn km(&self) -> f64 {
        self.0
    }
}
