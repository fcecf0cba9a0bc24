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

//! Typed access to configuration passed through environment variables.
//!
//! Settings are named `<PREFIX>_<SUFFIX>`, where the prefix names the service or component (for
//! example `TRIPS` or `TRIPS_DB`) and the suffix names the setting.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Result type for this module.
type Result<T> = std::result::Result<T, String>;

/// Text of a variable before conversion.
pub struct Value(String);

/// Types that a setting can be read as.
pub trait FromValue: Sized {
    /// Converts the raw `value` or explains why it is not acceptable.
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value.0)
    }
}

/// Durations are given in whole seconds.
impl FromValue for Duration {
    fn from_value(value: Value) -> Result<Self> {
        match value.0.parse::<u64>() {
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(format!("Invalid duration in seconds: {}", e)),
        }
    }
}

/// Parses `value` as a `T` using its `FromStr` implementation.
fn parse_number<T>(value: Value, type_name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.0.parse::<T>().map_err(|e| format!("Invalid {}: {}", type_name, e))
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        parse_number(value, "f64")
    }
}

impl FromValue for u16 {
    fn from_value(value: Value) -> Result<Self> {
        parse_number(value, "u16")
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self> {
        parse_number(value, "u32")
    }
}

/// Reads `<prefix>_<suffix>` as a `T`, or `None` if it is not set.
pub fn get_optional_var<T: FromValue>(prefix: &str, suffix: &str) -> Result<Option<T>> {
    let name = format!("{}_{}", prefix, suffix);
    let raw = match env::var(&name) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(format!("Environment variable {} is not valid UTF-8", name));
        }
    };
    match T::from_value(Value(raw)) {
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(format!("Bad value in environment variable {}: {}", name, e)),
    }
}

/// Reads `<prefix>_<suffix>` as a `T` and fails if it is not set.
pub fn get_required_var<T: FromValue>(prefix: &str, suffix: &str) -> Result<T> {
    get_optional_var(prefix, suffix)?
        .ok_or_else(|| format!("Missing required environment variable {}_{}", prefix, suffix))
}
