use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Rebuilds the spatial grid from scratch after plants have updated.
pub struct SpatialIndexSystem;

impl SpatialIndexSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpatialIndexSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SpatialIndexSystem {
    fn name(&self) -> &str {
        "spatial"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.rebuild_grid();
        Ok(())
    }
}
