// nbsetup-api: Async Rust client for the NetBox REST API

pub mod client;
pub mod collection;
pub mod error;
pub mod filter;
pub mod record;
pub mod transport;
pub mod validation;

pub use client::NetBoxClient;
pub use collection::Collection;
pub use error::Error;
pub use filter::Filter;
pub use record::Record;
pub use transport::{TlsMode, TransportConfig};
pub use validation::{FieldErrors, ValidationErrors};
