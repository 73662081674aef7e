//! `pathmock` is an in-process HTTP mock server for tests. It stubs out an HTTP dependency by
//! answering requests for registered paths with a configured response, and it records every
//! request it receives so tests can assert on them afterwards.
//!
//! The server runs on a background thread with its own runtime and listens on a free loopback
//! port. It can be used from synchronous and asynchronous tests alike.
//!
//! # Getting Started
//! ```rust
//! use pathmock::MockServer;
//!
//! // Register a path and configure its response.
//! let mut server = MockServer::new();
//! server
//!     .add_path("/translate")
//!     .payload("Привет")
//!     .header("Content-Type", "text/plain; charset=UTF-8");
//!
//! // Start listening on a free port.
//! server.start().unwrap();
//!
//! // Send a request to the server. This simulates your code.
//! let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
//! let response = client.get(server.url("/translate?word=hello").unwrap()).send().unwrap();
//!
//! // Ensure the server responded as configured and saw the request.
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.text().unwrap(), "Привет");
//! assert_eq!(server.path("/translate").unwrap().hits(), 1);
//! assert_eq!(server.next_path_hit(), "/translate");
//! ```
//!
//! # Routing
//! Paths match exactly, there are no wildcards. The only exception is a lone `/` registration:
//! if `/` is the *only* registered path, it answers requests to every path. As soon as a second
//! path is registered, `/` only answers requests to `/` and unknown paths get `404 Not Found`.
//!
//! A path accepts `GET` unless configured otherwise with [PathHandle::methods]. Requests with
//! another method are answered with `403 Forbidden` and are not counted for the path.
//!
//! Unless a payload or status is configured explicitly, the response depends on the method:
//! `POST` echoes the request body with `202`, `PUT` echoes it with `201`, `DELETE` answers `204`
//! with an empty body and everything else answers `200` with the configured payload.
//!
//! # Recorded Requests
//! Every request the server receives is recorded, including requests answered with `404` or
//! `403`:
//!
//! * [MockServer::hits] counts all of them,
//! * [MockServer::hit_records] returns them in arrival order as [HitRecord]s,
//! * [MockServer::next_path_hit] and its variants hand out their paths one by one in arrival
//!   order, blocking until the next request arrives.
//!
//! # Logging
//! `pathmock` logs through [tracing](https://docs.rs/tracing). Install any subscriber or `log`
//! compatible logger (e.g. `env_logger`) in your tests to see what the server is doing. An
//! access log line per request can be turned on with [MockServerBuilder::print_access_log].
pub use api::{MockServer, PathHandle};
pub use common::data::HitRecord;
pub use server::{Error, HandlerError, MockServerBuilder};

mod api;
mod common;
mod server;

/// Everything needed to work with a mock server.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{Error, HandlerError, HitRecord, MockServer, MockServerBuilder, PathHandle};
}
