//! HTTP service that drives the request metrics and serves the scrape.

mod handlers;
mod listener;

pub use handlers::{EVENT_PATH, RESERVED_PATHS, handle_request};
pub use listener::ApiServer;
