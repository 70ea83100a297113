use std::path::PathBuf;

use starroute_lib::{load_catalog, load_destinations, resolve_dataset_path, Error, Position};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .join(name)
}

#[test]
fn explicit_path_wins() {
    let path = fixture("systems.json");
    let resolved = resolve_dataset_path(Some(&path)).expect("fixture exists");
    assert_eq!(resolved, path);
}

#[test]
fn fixture_catalog_loads_every_system() {
    let catalog = load_catalog(&fixture("systems.json")).expect("fixture loads");

    assert_eq!(catalog.len(), 8);
    assert_eq!(
        catalog.find("Zeta").map(|l| l.position),
        Some(Position::new(15.0, 6.0, 4.0))
    );
}

#[test]
fn misspelled_system_suggests_alternatives() {
    let catalog = load_catalog(&fixture("systems.json")).unwrap();
    let err = catalog.resolve("Gamm").expect_err("unknown name");

    match &err {
        Error::UnknownLocation { suggestions, .. } => {
            assert!(suggestions.iter().any(|s| s == "Gamma"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Did you mean"));
}

#[test]
fn destinations_inherit_catalog_positions() {
    let mut catalog = load_catalog(&fixture("systems.json")).unwrap();
    let destinations = load_destinations(&fixture("destinations.json"), &mut catalog).unwrap();

    let names: Vec<&str> = destinations.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Beta", "Delta", "Epsilon"]);
    assert_eq!(destinations[0].position, Position::new(20.0, 0.0, 0.0));
    assert_eq!(destinations[0].planets[0].settlements, vec!["Haven", "Forge"]);
    assert!(destinations[2].planets[0].settlements.is_empty());

    // Destination records replace the bare catalog entries.
    assert_eq!(catalog.len(), 8);
    assert_eq!(catalog.find("Delta").unwrap().planets.len(), 1);
}
