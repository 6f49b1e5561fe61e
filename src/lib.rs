pub mod engine;
pub mod plant;
pub mod rng;
pub mod scenario;
pub mod season;
pub mod snapshot;
pub mod spatial;
pub mod systems;
pub mod terrain;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickReport};
pub use plant::{Plant, PlantCatalog};
pub use scenario::{Scenario, ScenarioLoader};
pub use season::{Season, SeasonManager};
pub use spatial::SpatialGrid;
pub use world::World;
