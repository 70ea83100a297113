//! Location and destination loaders.
//!
//! Datasets are JSON arrays of location records, optionally gzip-compressed:
//!
//! ```json
//! [{ "name": "Sol", "coords": { "x": 0.0, "y": 0.0, "z": 0.0 } }]
//! ```
//!
//! Destination files use the same records with an optional `planets` list of
//! `{ "name": .., "settlements": [..] }` entries. Destination coordinates may
//! be omitted when the catalog already knows the location.

use std::env;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, Location, Planet, Position};
use crate::error::{Error, Result};

/// Environment variable overriding the dataset location.
pub const DATASET_ENV: &str = "STARROUTE_DATA";

/// Default filename for the bundled systems dataset.
const DATASET_FILENAME: &str = "systems.json.gz";

/// Raw record as it appears in a dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(default)]
    pub coords: Option<Position>,
    #[serde(default)]
    pub planets: Vec<Planet>,
}

/// Resolve the default dataset location using platform-specific project directories.
pub fn default_dataset_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("org", "starroute", "starroute").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(DATASET_FILENAME))
}

/// Locate the systems dataset.
///
/// The resolution order is:
/// 1. Explicit `target` argument when provided.
/// 2. `STARROUTE_DATA` environment variable.
/// 3. Platform-specific project data directory.
pub fn resolve_dataset_path(target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(explicit) => explicit.to_path_buf(),
        None => match env::var_os(DATASET_ENV) {
            Some(from_env) => PathBuf::from(from_env),
            None => default_dataset_path()?,
        },
    };

    if !path.is_file() {
        return Err(Error::DatasetNotFound { path });
    }
    debug!(path = %path.display(), "resolved dataset path");
    Ok(path)
}

/// Parse location records from `path`, gunzipping files ending in `.gz`.
pub fn read_records(path: &Path) -> Result<Vec<LocationRecord>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::DatasetNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(err),
    })?;

    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    parse_records(BufReader::new(reader)).map_err(|err| match err {
        Error::Json(json) => Error::UnsupportedFormat {
            path: path.to_path_buf(),
            message: json.to_string(),
        },
        other => other,
    })
}

/// Parse location records from any JSON reader.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<LocationRecord>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Load every record of `path` into a new catalog.
///
/// All records must carry coordinates.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let records = read_records(path)?;
    let mut catalog = Catalog::new();
    for record in records {
        let Some(position) = record.coords else {
            return Err(Error::InvalidLocation {
                name: record.name,
                message: "missing coordinates".to_string(),
            });
        };
        let location = Location::new(record.name, position).with_planets(record.planets);
        location.validate()?;
        catalog.add(location);
    }

    info!(locations = catalog.len(), path = %path.display(), "loaded catalog");
    Ok(catalog)
}

/// Load tour destinations from `path`.
///
/// Records with coordinates are added to (or replace entries in) the catalog
/// so point-to-point costs can reach them. Records without coordinates take
/// their position from the catalog.
pub fn load_destinations(path: &Path, catalog: &mut Catalog) -> Result<Vec<Arc<Location>>> {
    let records = read_records(path)?;
    let destinations = resolve_destinations(records, catalog)?;
    info!(
        destinations = destinations.len(),
        path = %path.display(),
        "loaded destinations"
    );
    Ok(destinations)
}

/// Turn destination records into catalog-backed locations.
pub fn resolve_destinations(
    records: Vec<LocationRecord>,
    catalog: &mut Catalog,
) -> Result<Vec<Arc<Location>>> {
    let mut destinations = Vec::with_capacity(records.len());
    for record in records {
        let position = match record.coords {
            Some(position) => position,
            None => catalog.resolve(&record.name)?.position,
        };
        let location = Location::new(record.name, position).with_planets(record.planets);
        location.validate()?;

        let name = location.name.clone();
        catalog.add(location);
        if let Some(stored) = catalog.find(&name) {
            destinations.push(stored);
        }
    }
    Ok(destinations)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    use super::*;

    const SYSTEMS: &str = r#"[
        {"name": "Sol", "coords": {"x": 0.0, "y": 0.0, "z": 0.0}},
        {"name": "Vega", "coords": {"x": 25.0, "y": 0.0, "z": 0.0}}
    ]"#;

    #[test]
    fn loads_plain_json_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("systems.json");
        std::fs::write(&path, SYSTEMS).unwrap();

        let catalog = load_catalog(&path).expect("catalog loads");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.find("Vega").unwrap().position,
            Position::new(25.0, 0.0, 0.0)
        );
    }

    #[test]
    fn loads_gzip_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("systems.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SYSTEMS.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let catalog = load_catalog(&path).expect("gzip catalog loads");
        assert!(catalog.contains("Sol"));
    }

    #[test]
    fn catalog_records_need_coordinates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("systems.json");
        std::fs::write(&path, r#"[{"name": "Nowhere"}]"#).unwrap();

        let err = load_catalog(&path).expect_err("missing coords");
        assert!(err.to_string().contains("missing coordinates"));
    }

    #[test]
    fn non_array_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("systems.json");
        std::fs::write(&path, r#"{"name": "Sol"}"#).unwrap();

        assert!(matches!(
            load_catalog(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_dataset_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            read_records(&path),
            Err(Error::DatasetNotFound { .. })
        ));
        assert!(matches!(
            resolve_dataset_path(Some(&path)),
            Err(Error::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn destinations_fill_coordinates_from_catalog() {
        let mut catalog = parse_records(SYSTEMS.as_bytes())
            .unwrap()
            .into_iter()
            .map(|r| Location::new(r.name, r.coords.unwrap()))
            .collect::<Catalog>();
        let records = parse_records(
            r#"[
                {"name": "Vega", "planets": [{"name": "Vega 2", "settlements": ["Dock"]}]},
                {"name": "New Hope", "coords": {"x": 1.0, "y": 2.0, "z": 3.0}}
            ]"#
            .as_bytes(),
        )
        .unwrap();

        let destinations = resolve_destinations(records, &mut catalog).unwrap();
        assert_eq!(destinations.len(), 2);
        assert_eq!(destinations[0].position, Position::new(25.0, 0.0, 0.0));
        assert_eq!(destinations[0].planets[0].settlements, vec!["Dock"]);
        assert!(catalog.contains("New Hope"));
    }

    #[test]
    fn unknown_destination_without_coordinates_fails() {
        let mut catalog = Catalog::new();
        let records = parse_records(r#"[{"name": "Ghost"}]"#.as_bytes()).unwrap();
        let err = resolve_destinations(records, &mut catalog).expect_err("unknown");
        assert!(matches!(err, Error::UnknownLocation { .. }));
    }
}
