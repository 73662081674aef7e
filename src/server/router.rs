use crate::{
    common::data::{normalize_method, RoutedResponse},
    server::{
        handler::Error::{self, InvalidHeader},
        registry::Registry,
    },
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::str::FromStr;

/// Decides how to answer a request and updates the hit counter of the serving path.
///
/// Requests that resolve to no registration get `404` with body `Not Found`. Requests whose
/// method is not accepted by the resolved registration get `403` with an empty body and do not
/// count as a hit on that registration.
///
/// Configured headers and status codes are validated before the hit is counted. An invalid one
/// is returned as an error and leaves the hit counter unchanged.
pub(crate) fn route(
    registry: &mut Registry,
    method: &str,
    path: &str,
    body: &Bytes,
) -> Result<RoutedResponse, Error> {
    let registration = match registry.resolve_mut(path) {
        Some(registration) => registration,
        None => {
            tracing::trace!("No registration found for path '{}'", path);
            return Ok(RoutedResponse::not_found());
        }
    };

    let method = normalize_method(method);
    let config = &registration.config;
    let headers = to_header_map(&config.headers)?;

    if !config.accepts(&method) {
        tracing::trace!("Method {} is not accepted on path '{}'", method, path);
        return Ok(RoutedResponse::forbidden(headers));
    }

    let (default_body, default_status) = match method.as_str() {
        "POST" => (body.clone(), StatusCode::ACCEPTED),
        "PUT" => (body.clone(), StatusCode::CREATED),
        "DELETE" => (Bytes::new(), StatusCode::NO_CONTENT),
        _ => (Bytes::new(), StatusCode::OK),
    };

    let status = match config.status.filter(|code| *code != 0) {
        Some(code) => StatusCode::from_u16(code)?,
        None => default_status,
    };

    let response = RoutedResponse {
        status,
        body: config.payload.clone().unwrap_or(default_body),
        headers,
    };

    registration.hits += 1;

    Ok(response)
}

fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let name = HeaderName::from_str(name)
            .map_err(|err| InvalidHeader(format!("invalid header key: {}", err)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| InvalidHeader(format!("invalid header value: {}", err)))?;
        map.append(name, value);
    }

    Ok(map)
}
