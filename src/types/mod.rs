mod geo_type;
mod geo_id;

pub use geo_type::GeographyScale;
pub use geo_id::{IdSet, NormalizedId};
