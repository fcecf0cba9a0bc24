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

//! API to delete a book.

use crate::driver::Driver;
use crate::model::{BookId, Message};
use axum::Json;
use axum::extract::{Path, State};
use minisvc_core::rest::{EmptyBody, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<Json<Message>, RestError> {
    let id = BookId::new(id)?;
    driver.delete_book(&id).await?;
    Ok(Json(Message::new("Book deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testutils::book;
    use crate::rest::testutils::*;
    use axum::http;
    use minisvc_core::rest::testutils::*;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/v1/books/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup();
        context.put_books(&[book("a"), book("b")]).await;

        let response = OneShotBuilder::new(context.app(), route("a"))
            .send_empty()
            .await
            .expect_json::<Message>()
            .await;
        assert_eq!(Message::new("Book deleted successfully"), response);

        assert_eq!(vec![book("b")], context.books().await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup();
        context.put_books(&[book("a")]).await;

        OneShotBuilder::new(context.app(), route("b"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Book not found")
            .await;

        assert_eq!(vec![book("a")], context.books().await);
    }

    test_payload_must_be_empty!(TestContext::setup().app(), route("a"));
}
