//! HTTP boundary: translates wire samples to and from the core types. Holds
//! no state of its own beyond the repository handle.

pub mod params;
pub mod server;

pub use params::{parse_timestamp, RangeParams};
pub use server::{create_router, start_server, AppState};
