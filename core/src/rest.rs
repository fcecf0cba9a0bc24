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

//! HTTP-facing error types, extractors and test helpers shared by the services.
//!
//! Each service exposes an `app` function in its `rest` module that builds the `Router`.  Handlers
//! live in one file per endpoint, named `<entity>_<method>.rs`, and the tests in that file only
//! ever target the endpoint returned by their local `route` function.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use log::warn;
use serde::{Deserialize, Serialize};

/// Errors returned to HTTP clients.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// The operation is not valid for the current state of the entity.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not allowed to act on the entity.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Anything the client cannot fix by changing the request.
    #[error("{0}")]
    InternalError(String),

    /// The request is malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// The entity named by the request does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The endpoint takes no body but the request carried one.
    #[error("Content should be empty")]
    UnexpectedBody,
}

impl RestError {
    /// Returns the HTTP status code that represents this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::Conflict(_) => StatusCode::CONFLICT,
            RestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::UnexpectedBody => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        let message = e.to_string();
        match e {
            DriverError::AlreadyExists(_) | DriverError::InvalidInput(_) => {
                RestError::InvalidRequest(message)
            }
            DriverError::BackendError(_) => RestError::InternalError(message),
            DriverError::InvalidState(_) => RestError::Conflict(message),
            DriverError::NotFound(_) => RestError::NotFound(message),
            DriverError::Unauthorized(_) => RestError::Forbidden(message),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed with internal error: {}", self);
        }
        (status, Json(ErrorResponse { message: self.to_string() })).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// JSON body of every failed response.
#[derive(Debug, Deserialize, Serialize)]
struct ErrorResponse {
    /// Human-readable description of the failure.
    message: String,
}

/// Extractor for endpoints that take no request body.
pub struct EmptyBody;

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !req.into_body().is_end_stream() {
            return Err(RestError::UnexpectedBody);
        }
        Ok(EmptyBody)
    }
}

/// Returns the textual value of the `name` header, if present.
///
/// Repeated headers and values that are not visible ASCII are rejected.
pub fn single_header<'a>(headers: &'a HeaderMap, name: &str) -> RestResult<Option<&'a str>> {
    let mut values = headers.get_all(name).iter();
    let Some(value) = values.next() else {
        return Ok(None);
    };
    if values.next().is_some() {
        return Err(RestError::InvalidRequest(format!("Header {} is repeated", name)));
    }
    match value.to_str() {
        Ok(text) => Ok(Some(text)),
        Err(_) => Err(RestError::InvalidRequest(format!("Header {} is not valid text", name))),
    }
}

/// Helpers to drive a `Router` in-process from tests.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{HeaderName, HeaderValue, Method};
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    /// Upper bound on the size of the responses the tests will read.
    const MAX_BODY_SIZE: usize = 64 * 1024;

    /// Request under construction for a single call into a `Router`.
    #[must_use]
    pub struct OneShotBuilder {
        /// Application that will receive the request.
        app: Router,

        /// Method, URI and headers collected so far.
        builder: axum::http::request::Builder,
    }

    impl OneShotBuilder {
        /// Starts a request for the `(method, uri)` endpoint of `app`.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (Method, U)) -> Self {
            Self { app, builder: Request::builder().method(method).uri(uri.as_ref()) }
        }

        /// Appends `query`, encoded as a form, to the URI.
        pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
            let path = self.builder.uri_ref().expect("URI must be valid").to_string();
            assert!(!path.contains('?'), "Query already present in {}", path);
            let query = serde_urlencoded::to_string(query).expect("Query must be serializable");
            self.builder = self.builder.uri(format!("{}?{}", path, query));
            self
        }

        /// Adds a `name: value` header to the request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<axum::http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<axum::http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Sends the request with `body`, labeled as `content_type` if given.
        async fn send(self, content_type: Option<&str>, body: Body) -> ResponseChecker {
            let mut builder = self.builder;
            if let Some(content_type) = content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            let request = builder.body(body).expect("Request must be valid");
            let response = self.app.oneshot(request).await.expect("Router cannot fail");
            ResponseChecker { response, exp_status: StatusCode::OK }
        }

        /// Sends the request without a body.
        pub async fn send_empty(self) -> ResponseChecker {
            self.send(None, Body::empty()).await
        }

        /// Sends the request with a plain text body.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            self.send(Some(mime::TEXT_PLAIN.as_ref()), Body::from(text.into())).await
        }

        /// Sends the request with `value` serialized as its JSON body.
        pub async fn send_json<T: Serialize>(self, value: T) -> ResponseChecker {
            let body = serde_json::to_vec(&value).expect("Value must be serializable");
            self.send(Some(mime::APPLICATION_JSON.as_ref()), Body::from(body)).await
        }
    }

    /// Assertions over the response to a request sent by `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Response returned by the router.
        response: hyper::Response<Body>,

        /// Status the response must carry.  Defaults to 200.
        exp_status: StatusCode,
    }

    impl ResponseChecker {
        /// Expects the response to carry `status` instead of 200.
        pub fn expect_status(mut self, status: StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Checks the status and returns the raw body.
        async fn checked_body(self) -> Vec<u8> {
            assert_eq!(self.exp_status, self.response.status());
            let bytes = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE)
                .await
                .expect("Body must be readable");
            bytes.to_vec()
        }

        /// Checks the status and returns the body as text.
        async fn checked_text(self) -> String {
            String::from_utf8(self.checked_body().await).expect("Body must be UTF-8")
        }

        /// Expects a response without a body.
        pub async fn expect_empty(self) {
            let body = self.checked_text().await;
            assert!(body.is_empty(), "Expected no body but got {}", body);
        }

        /// Expects an error response whose message matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.checked_text().await;
            let error: ErrorResponse = serde_json::from_str(&body)
                .unwrap_or_else(|e| panic!("Body {} is not an error response: {}", body, e));
            let re = regex::Regex::new(exp_re).expect("Regex must be valid");
            assert!(
                re.is_match(&error.message),
                "Error '{}' does not match '{}'",
                error.message,
                exp_re
            );
        }

        /// Expects a JSON body and returns it deserialized as `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            let body = self.checked_body().await;
            serde_json::from_slice(&body).expect("Body must be valid JSON for the type")
        }

        /// Expects a non-error text body that matches `exp_re`.
        pub async fn expect_text(self, exp_re: &str) {
            assert!(!exp_re.is_empty(), "Empty bodies are checked with expect_empty");
            let body = self.checked_text().await;
            assert!(!body.contains("\"message\":"), "Error bodies are checked with expect_error");
            let re = regex::Regex::new(exp_re).expect("Regex must be valid");
            assert!(re.is_match(&body), "Body '{}' does not match '{}'", body, exp_re);
        }
    }

    /// Generates `test_payload_must_be_json` for an endpoint that consumes JSON.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                use $crate::rest::testutils::OneShotBuilder;
                use axum::http::{StatusCode, header::CONTENT_TYPE};

                OneShotBuilder::new($app, $route)
                    .send_text("plain words")
                    .await
                    .expect_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
                    .expect_text("Content-Type")
                    .await;

                OneShotBuilder::new($app, $route)
                    .with_header(CONTENT_TYPE, "application/json")
                    .send_text("plain words")
                    .await
                    .expect_status(StatusCode::BAD_REQUEST)
                    .expect_text("expected ident")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates `test_payload_must_be_empty` for an endpoint that takes no body.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("unwanted")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}
