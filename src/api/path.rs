use crate::server::state::MockServerStateManager;
use bytes::Bytes;
use std::sync::Arc;

/// A handle to a path registered on a [`MockServer`](crate::MockServer).
///
/// All setters configure the registration in place and return the handle, so calls can be
/// chained. Handles to the same path share one registration: a change made through one handle
/// is visible through every other handle of that path. Configuration may change while the
/// server is running; it applies to all requests received afterwards.
///
/// **Example**:
/// ```
/// use pathmock::MockServer;
///
/// let server = MockServer::new();
///
/// server
///     .add_path("/foo/bar")
///     .methods(["GET", "POST"])
///     .payload("some return payload")
///     .status(200)
///     .header("Content-Type", "text/plain");
///
/// assert_eq!(server.path_count(), 1);
/// ```
#[derive(Clone)]
pub struct PathHandle {
    state: Arc<MockServerStateManager>,
    path: String,
}

impl PathHandle {
    pub(crate) fn new(state: Arc<MockServerStateManager>, path: String) -> Self {
        Self { state, path }
    }

    /// The exact path string this handle was registered with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sets the response body. It takes precedence over the method based default body,
    /// even if it is empty.
    pub fn payload<B: AsRef<[u8]>>(self, payload: B) -> Self {
        let payload = Bytes::copy_from_slice(payload.as_ref());
        self.state
            .configure_path(&self.path, |c| c.payload = Some(payload));
        self
    }

    /// Sets the response status code. It takes precedence over the method based default.
    /// `0` unsets the status, so the method based default applies again. Other codes are sent
    /// as is; codes outside of `100..=999` lead to a `500` response.
    pub fn status(self, status: u16) -> Self {
        self.state
            .configure_path(&self.path, |c| c.status = (status != 0).then_some(status));
        self
    }

    /// Sets the accepted HTTP methods, replacing earlier ones. Names are upper-cased.
    /// Without configured methods only `GET` is accepted. Other methods are answered with
    /// `403 Forbidden`.
    pub fn methods<I, S>(self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods: Vec<String> = methods
            .into_iter()
            .map(|m| m.as_ref().to_ascii_uppercase())
            .collect();
        self.state.configure_path(&self.path, |c| c.methods = methods);
        self
    }

    /// Adds a response header. Calling this twice with the same name sends both values.
    pub fn header<K, V>(self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let header = (name.into(), value.into());
        self.state
            .configure_path(&self.path, |c| c.headers.push(header));
        self
    }

    /// Sets the response headers, replacing all previously configured ones.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.state.configure_path(&self.path, |c| c.headers = headers);
        self
    }

    /// The number of requests this path has served. Requests rejected with `403` do not count.
    pub fn hits(&self) -> usize {
        self.state.path_hits(&self.path).unwrap_or(0)
    }
}

impl std::fmt::Debug for PathHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathHandle")
            .field("path", &self.path)
            .field("hits", &self.hits())
            .finish()
    }
}
