//! Application layer - Use cases and orchestration
//!
//! Contains the fetch-or-cache orchestration and the port definitions it
//! drives. Adapters in the infrastructure layer implement the ports.

pub mod error;
pub mod ports;
pub mod services;

pub use error::{ApplicationError, BoxError, ErrorKind};
pub use ports::*;
pub use services::*;
