pub(crate) mod builder;
pub(crate) mod handler;
pub(crate) mod recorder;
pub(crate) mod registry;
pub(crate) mod router;
#[allow(clippy::module_inception)]
pub(crate) mod server;
pub(crate) mod state;

pub use builder::MockServerBuilder;
pub use handler::Error as HandlerError;
pub use server::Error;

/// Per-request information the HTTP layer attaches to a buffered request as an extension.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestMetadata {
    pub body_read_failed: bool,
}
