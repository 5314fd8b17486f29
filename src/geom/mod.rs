mod bbox;
mod crs;
mod geom;
mod proj;

pub use crs::Crs;
pub use geom::PreparedPolygon;
pub use proj::Reprojector;
