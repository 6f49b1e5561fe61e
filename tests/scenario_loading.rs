use std::fs;

use tussock::scenario::ScenarioLoader;
use tempfile::tempdir;

#[test]
fn fixture_scenario_builds_world() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/high_country.yaml")
        .expect("scenario should load");
    assert_eq!(scenario.name, "high_country");
    assert_eq!(scenario.ticks(None), 480);

    let world = scenario.build_world().expect("world builds");
    let counts = world.plant_counts();
    assert_eq!(counts.growing, 95);
    assert_eq!(world.seasons().current_key(), "summer");
    assert_eq!(
        world.migration_hint().as_deref(),
        Some("moa: Stay high, takahe: Alpine tussock")
    );

    // subalpine tussock sits on the high eastern ridge
    let high = world
        .plant_ids()
        .into_iter()
        .filter_map(|id| world.plant(id))
        .filter(|plant| plant.biome() == "subalpine")
        .all(|plant| plant.elevation() > 0.5);
    assert!(high);
}

#[test]
fn missing_file_reports_path() {
    let temp = tempdir().expect("tempdir");
    let loader = ScenarioLoader::new(temp.path());
    let err = loader.load("nowhere.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("nowhere.yaml"));
}

#[test]
fn invalid_scenarios_are_rejected() {
    let temp = tempdir().expect("tempdir");
    let loader = ScenarioLoader::new(temp.path());
    let cases = [
        ("bad_dt.yaml", "name: x\nseed: 1\ndt: -1\nworld: {width: 10, height: 10}\n"),
        (
            "bad_cell.yaml",
            "name: x\nseed: 1\nworld: {width: 10, height: 10, cell_size: 0}\n",
        ),
        (
            "bad_placeable.yaml",
            "name: x\nseed: 1\nworld: {width: 10, height: 10}\nplants:\n  - kind: herb\n    biome: coastal\n    placeable: 3\n",
        ),
        (
            "ragged.yaml",
            "name: x\nseed: 1\nworld: {width: 10, height: 10}\nterrain:\n  kind: sampled\n  spacing: 5\n  rows: [[0.1, 0.2], [0.3]]\n",
        ),
        ("not_yaml.yaml", "name: [unterminated\n"),
    ];
    for (file, text) in cases {
        fs::write(temp.path().join(file), text).expect("write scenario");
    }

    for (file, _) in &cases[..3] {
        let err = loader.load(file).unwrap_err();
        assert!(
            format!("{err:#}").contains("validation"),
            "{file} should fail validation: {err:#}"
        );
    }

    let ragged = loader
        .load("ragged.yaml")
        .expect("terrain rows are checked when the world is built");
    assert!(ragged.build_world().is_err());
    assert!(loader.load("not_yaml.yaml").is_err());
}
