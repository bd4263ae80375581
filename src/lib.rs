//! Order history acquisition.
//!
//! Signs in to a retail account with a browser session, walks the paginated
//! order history into a durable link store, resolves each product's detail
//! page over plain HTTP and writes a cleaned CSV table.

pub mod config;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod http_client;
pub mod models;
pub mod pipeline;
pub mod session;

pub use config::{Credentials, RunConfig};
pub use pipeline::Pipeline;
