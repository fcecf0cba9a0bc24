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

//! API to replace an existing book.

use crate::driver::Driver;
use crate::model::{Book, BookId, Message};
use axum::Json;
use axum::extract::{Path, State};
use minisvc_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    Json(book): Json<Book>,
) -> Result<Json<Message>, RestError> {
    let id = BookId::new(id)?;
    if book.id != id {
        return Err(RestError::InvalidRequest(format!(
            "Book id {} in the body does not match {} in the path",
            book.id, id
        )));
    }

    driver.update_book(book).await?;
    Ok(Json(Message::new("Book updated successfully")))
}
