pub use path::PathHandle;
pub use server::MockServer;

mod path;
mod server;
