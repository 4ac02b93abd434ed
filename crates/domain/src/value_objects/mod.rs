//! Value Objects - Immutable, identity-less domain primitives

mod location_name;
mod reading_id;

pub use location_name::LocationName;
pub use reading_id::ReadingId;
