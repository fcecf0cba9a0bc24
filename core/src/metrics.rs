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

//! Prometheus instrumentation of the REST services.
//!
//! Every service owns a `Metrics` registry, counts the requests served by each route through
//! `instrument` and exposes the registry in the Prometheus text format under `/metrics`.

use axum::Router;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics::Gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use std::sync::Arc;

/// Counter of served requests, labeled by `handler`.
const REQUESTS_TOTAL: &str = "http_requests_total";

/// Gauge of database queries that have started but not finished.
const QUERIES_IN_FLIGHT: &str = "db_queries_in_flight";

/// Content type of the Prometheus text exposition format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Registry of the metrics of one service instance.
pub struct Metrics {
    /// Storage for all metrics.  Not installed globally so that tests get their own.
    recorder: PrometheusRecorder,
}

impl Default for Metrics {
    fn default() -> Self {
        Self { recorder: PrometheusBuilder::new().build_recorder() }
    }
}

impl Metrics {
    /// Records one request served by `handler`.
    pub fn count_request(&self, handler: &str) {
        let handler = handler.to_owned();
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(REQUESTS_TOTAL, "handler" => handler).increment(1);
        });
    }

    /// Marks the start of a database query, which ends when the returned guard is dropped.
    pub fn start_query(&self) -> QueryGuard {
        let gauge = metrics::with_local_recorder(&self.recorder, || {
            metrics::gauge!(QUERIES_IN_FLIGHT)
        });
        gauge.increment(1.0);
        QueryGuard(gauge)
    }

    /// Formats all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }
}

/// A database query in progress.
#[must_use]
pub struct QueryGuard(Gauge);

impl Drop for QueryGuard {
    fn drop(&mut self) {
        self.0.decrement(1.0);
    }
}

/// Middleware that counts each request under its method and route pattern.
async fn count_requests(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    match request.extensions().get::<MatchedPath>() {
        Some(path) => metrics.count_request(&format!("{} {}", request.method(), path.as_str())),
        None => metrics.count_request(request.method().as_str()),
    }
    next.run(request).await
}

/// Serves the contents of the registry.
async fn metrics_get(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, TEXT_FORMAT)], metrics.render())
}

/// Counts the requests to every route already in `app` and adds the `/metrics` endpoint.
pub fn instrument(app: Router, metrics: Arc<Metrics>) -> Router {
    app.route_layer(middleware::from_fn_with_state(metrics.clone(), count_requests))
        .route("/metrics", get(metrics_get).with_state(metrics))
}
