use crate::{
    common::data::{HitRecord, RoutedResponse},
    server::{
        handler::Error::ResponseConversionError,
        state::StateManager,
        RequestMetadata,
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::sync::Arc;
use thiserror::Error;

/// Why a request could not be answered with its configured response. Such requests get a `500`
/// and are reported through [`crate::Error::RouterError`] in the logs.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid status code: {0}")]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("cannot convert response: {0}")]
    ResponseConversionError(http::Error),
}

#[async_trait]
pub(crate) trait Handler {
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// Records every request and answers it according to the registered paths.
pub(crate) struct PathHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    state: Arc<S>,
}

impl<S> PathHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    pub fn new(state: Arc<S>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl<S> Handler for PathHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let body_read_failed = req
            .extensions()
            .get::<RequestMetadata>()
            .is_some_and(|m| m.body_read_failed);

        let record = HitRecord::from_request(&req, body_read_failed);
        let record = self.state.record(record).await;

        let routed = self.state.serve(&record)?;
        tracing::trace!(
            "Routed {} {} to status {}",
            record.method(),
            record.path(),
            routed.status
        );

        to_response(routed)
    }
}

fn to_response(routed: RoutedResponse) -> Result<Response<Bytes>, Error> {
    let mut response = Response::builder()
        .status(routed.status)
        .body(routed.body)
        .map_err(ResponseConversionError)?;

    *response.headers_mut() = routed.headers;
    Ok(response)
}
