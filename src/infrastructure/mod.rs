//! Infrastructure layer: storage backends, password hashing and logging

pub mod logging;
pub mod user;

pub use logging::init_logging;
