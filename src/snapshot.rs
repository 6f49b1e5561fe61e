use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::debug;

use crate::world::World;

/// Writes a JSON world snapshot every `interval` ticks; 0 disables snapshots.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn maybe_write(&self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        let tick = world.tick();
        if self.interval == 0 || tick % self.interval != 0 {
            return Ok(None);
        }

        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("tick_{tick:06}.json"));
        let json = serde_json::to_string_pretty(&world.snapshot(scenario_name))
            .context("Failed to serialize world snapshot")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(tick, path = %path.display(), "snapshot written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        plant::PlantCatalog, season::SeasonManager, spatial::SpatialGrid, terrain::FlatTerrain,
    };

    fn world() -> World {
        World::new(
            SeasonManager::new(10.0).unwrap(),
            PlantCatalog::defaults(),
            Box::new(FlatTerrain(0.5)),
            SpatialGrid::new(64.0, 64.0, 8.0).unwrap(),
            1.0,
        )
    }

    #[test]
    fn test_writes_on_interval() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 5);
        let mut world = world();
        world.spawn_plant("flax", "coastal", 3.0, 4.0).unwrap();

        for _ in 0..4 {
            world.advance_time();
            assert!(writer.maybe_write(&world, "unit").unwrap().is_none());
        }
        world.advance_time();
        let path = writer.maybe_write(&world, "unit").unwrap().unwrap();
        assert_eq!(path, temp.path().join("unit").join("tick_000005.json"));

        let data = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["tick"], 5);
        assert_eq!(value["season"], "summer");
        assert_eq!(value["plants"][0]["kind"], "flax");
    }

    #[test]
    fn test_zero_interval_disables() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 0);
        let mut world = world();
        world.advance_time();
        assert!(writer.maybe_write(&world, "unit").unwrap().is_none());
        assert!(!temp.path().join("unit").exists());
    }
}
