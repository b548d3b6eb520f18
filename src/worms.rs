mod client;
mod client_builder;
mod error;
mod models;
mod result;

pub use client::Client;
pub use client_builder::{ClientBuilder, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::AphiaRecord;
pub use result::Result;
