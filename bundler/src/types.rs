//! Types for organization data and the protocol documents generated from it.

mod entity;
mod metadata;
mod offer;
mod request;

pub use self::entity::*;
pub use self::metadata::*;
pub use self::offer::*;
pub use self::request::*;
