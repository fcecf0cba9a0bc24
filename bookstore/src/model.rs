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

/// Identifier of a book in the catalog.
///
/// Identifiers are free-form but cannot be empty or contain whitespace because they appear as a
/// path component in the REST API.
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(String);

impl BookId {
    /// Creates a new identifier from an untrusted `id`.
    pub fn new<S: Into<String>>(id: S) -> ModelResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError("Book id cannot be empty".to_owned()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ModelError(format!("Book id '{}' cannot contain whitespace", id)));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookId {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        BookId::new(value)
    }
}

impl From<BookId> for String {
    fn from(value: BookId) -> Self {
        value.0
    }
}

/// A book in the catalog.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Book {
    /// Unique identifier of the book.
    pub id: BookId,

    /// Title of the book.
    pub title: String,

    /// Name of the author.
    pub author: String,

    /// Price of the book, kept verbatim as provided by the client.
    pub price: String,

    /// Link to the cover image of the book.
    pub image_url: String,
}

/// Reply sent by the mutating APIs on success.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Message {
    /// Human-readable confirmation.
    #[serde(rename = "Msg")]
    pub msg: String,
}

impl Message {
    /// Creates a new message with the given text.
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self { msg: msg.into() }
    }
}
