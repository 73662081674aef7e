use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A snapshot of a single request received by the mock server.
///
/// Hit records are taken *before* the request is routed, so requests that end up with a
/// `404` or `403` response are recorded as well.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HitRecord {
    method: String,
    path: String,
    query: BTreeMap<String, Vec<String>>,
    headers: Vec<(String, String)>,
    body: Bytes,
    body_read_failed: bool,
}

impl HitRecord {
    pub(crate) fn new(
        method: String,
        path: String,
        query: BTreeMap<String, Vec<String>>,
        headers: Vec<(String, String)>,
        body: Bytes,
        body_read_failed: bool,
    ) -> Self {
        Self {
            method,
            path,
            query,
            headers,
            body,
            body_read_failed,
        }
    }

    /// Builds a hit record from a buffered HTTP request.
    ///
    /// The path is taken verbatim from the request URI (no percent-decoding), the query string
    /// is decoded into a multi-valued map. Header values that are not valid UTF-8 are converted
    /// lossily.
    pub(crate) fn from_request(req: &http::Request<Bytes>, body_read_failed: bool) -> Self {
        let query = req.uri().query().map(parse_query).unwrap_or_default();

        let headers = req
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                )
            })
            .collect();

        Self::new(
            req.method().as_str().to_string(),
            req.uri().path().to_string(),
            query,
            headers,
            req.body().clone(),
            body_read_failed,
        )
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// All query parameters, each name mapped to its values in the order they appeared.
    pub fn query(&self) -> &BTreeMap<String, Vec<String>> {
        &self.query
    }

    /// Returns the first value of the query parameter `name`, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the first value of header `name`. Header names are compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// `true` if reading the request body failed. The body is empty in that case.
    pub fn body_read_failed(&self) -> bool {
        self.body_read_failed
    }
}

fn parse_query(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

/// Response configuration of a registered path.
///
/// `None` means "not configured": the router then falls back to the method based defaults.
/// A status of `0` is treated as not configured as well.
/// An explicitly configured empty payload is different from an unset one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathConfig {
    pub payload: Option<Bytes>,
    pub status: Option<u16>,
    pub methods: Vec<String>,
    pub headers: Vec<(String, String)>,
}

impl PathConfig {
    /// Checks whether `method` is accepted. Without configured methods only `GET` is accepted.
    /// `method` is expected to be normalized already (see [`normalize_method`]).
    pub fn accepts(&self, method: &str) -> bool {
        if self.methods.is_empty() {
            return method == "GET";
        }

        self.methods.iter().any(|m| m == method)
    }
}

/// Upper-cases a method name and maps the empty method to `GET`.
pub(crate) fn normalize_method(method: &str) -> String {
    if method.is_empty() {
        return "GET".to_string();
    }
    method.to_ascii_uppercase()
}

/// The outcome of routing a request. Status and headers are validated already, so converting
/// it into an HTTP response cannot fail on configured values.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl RoutedResponse {
    pub(crate) fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from_static(b"Not Found"),
            headers: HeaderMap::new(),
        }
    }

    pub(crate) fn forbidden(headers: HeaderMap) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            body: Bytes::new(),
            headers,
        }
    }
}
