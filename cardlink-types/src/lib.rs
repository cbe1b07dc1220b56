//! Type definitions for cardlink
//!
//! The value types produced by a card session and consumed by higher-level
//! services: status codes, responses and response bodies. No I/O lives here.

pub mod error;
pub mod response;
pub mod status;

pub use error::{Error, Result};
pub use response::{Response, ResponseBody};
pub use status::Status;
