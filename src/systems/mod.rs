mod plants;
mod seasons;
mod spatial;

pub use plants::PlantSystem;
pub use seasons::SeasonSystem;
pub use spatial::SpatialIndexSystem;
