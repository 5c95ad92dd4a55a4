//! Dataset loading.
//!
//! Two source formats are accepted:
//! - a JSON array of wire records (what `GET /collection` returns), and
//! - the flat CSV pair: `pokemon.csv` plus an optional `damage_relations.csv`
//!   merged in by id.
//!
//! Rows that cannot become a [`Record`] (no id, no name, no primary type) are
//! skipped with a warning; the rest of the dataset still loads.

use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::record::Record;
use crate::wire::WireRecord;
use crate::Catalog;

pub const CREATURES_CSV: &str = "pokemon.csv";
pub const DAMAGE_CSV: &str = "damage_relations.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Json(PathBuf),
    Csv {
        creatures: PathBuf,
        damage: Option<PathBuf>,
    },
}

impl DatasetSource {
    /// Pick a source from a path: a directory means the CSV pair inside it, a
    /// `.csv` file means that table (damage table looked up as a sibling),
    /// anything else is JSON.
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            let damage = path.join(DAMAGE_CSV);
            return DatasetSource::Csv {
                creatures: path.join(CREATURES_CSV),
                damage: damage.exists().then_some(damage),
            };
        }
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            let damage = path
                .parent()
                .map(|dir| dir.join(DAMAGE_CSV))
                .filter(|p| p.exists() && p.as_path() != path);
            return DatasetSource::Csv {
                creatures: path.to_path_buf(),
                damage,
            };
        }
        DatasetSource::Json(path.to_path_buf())
    }

    /// Short human-facing description.
    pub fn label(&self) -> String {
        match self {
            DatasetSource::Json(p) => p.display().to_string(),
            DatasetSource::Csv { creatures, damage } => match damage {
                Some(d) => format!("{} + {}", creatures.display(), d.display()),
                None => creatures.display().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
    /// Rows whose declared `base_stat_total` disagreed with the stat sum.
    pub corrected_totals: usize,
}

#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub summary: LoadSummary,
    pub source: DatasetSource,
}

pub fn load_path(path: &Path) -> Result<LoadedCatalog, CatalogError> {
    load(DatasetSource::detect(path))
}

pub fn load(source: DatasetSource) -> Result<LoadedCatalog, CatalogError> {
    let wire = match &source {
        DatasetSource::Json(path) => read_json(path)?,
        DatasetSource::Csv { creatures, damage } => read_csv_pair(creatures, damage.as_deref())?,
    };
    let (catalog, summary) = build_catalog(wire)?;
    tracing::info!(
        source = %source.label(),
        loaded = summary.loaded,
        skipped = summary.skipped,
        "dataset loaded"
    );
    Ok(LoadedCatalog {
        catalog,
        summary,
        source,
    })
}

/// Parse a JSON dataset held in memory.
pub fn catalog_from_json_str(text: &str) -> Result<(Catalog, LoadSummary), CatalogError> {
    let wire: Vec<WireRecord> = serde_json::from_str(text).map_err(|source| CatalogError::Json {
        path: PathBuf::from("<memory>"),
        source,
    })?;
    build_catalog(wire)
}

/// Turn wire rows into a catalog, skipping rows that are not records.
pub fn build_catalog(wire: Vec<WireRecord>) -> Result<(Catalog, LoadSummary), CatalogError> {
    let mut summary = LoadSummary::default();
    let mut records = Vec::with_capacity(wire.len());

    for (row, w) in wire.into_iter().enumerate() {
        let declared = w.declared_total();
        match Record::try_from(w) {
            Ok(record) => {
                if let Some(declared) = declared {
                    if declared != record.base_stat_total() {
                        tracing::warn!(
                            id = record.id,
                            declared,
                            computed = record.base_stat_total(),
                            "base_stat_total disagrees with stat sum; using the sum"
                        );
                        summary.corrected_totals += 1;
                    }
                }
                records.push(record);
            }
            Err(err) => {
                tracing::warn!(row, error = %err, "skipping dataset row");
                summary.skipped += 1;
            }
        }
    }

    summary.loaded = records.len();
    Ok((Catalog::from_records(records)?, summary))
}

fn read_json(path: &Path) -> Result<Vec<WireRecord>, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv_rows(path: &Path) -> Result<Vec<HashMap<String, String>>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let mut rows = Vec::new();
    for row in reader.deserialize::<HashMap<String, String>>() {
        let row = row.map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_csv_pair(creatures: &Path, damage: Option<&Path>) -> Result<Vec<WireRecord>, CatalogError> {
    let mut wire: Vec<WireRecord> = read_csv_rows(creatures)?
        .iter()
        .map(WireRecord::from_columns)
        .collect();

    let Some(damage) = damage else {
        return Ok(wire);
    };

    let mut by_id: HashMap<u32, HashMap<String, String>> = HashMap::new();
    for row in read_csv_rows(damage)? {
        let id = row
            .get("id")
            .and_then(|raw| crate::wire::parse_id_list(raw).first().copied());
        match id {
            Some(id) => {
                by_id.insert(id, row);
            }
            None => tracing::warn!(path = %damage.display(), "skipping damage row without id"),
        }
    }

    for w in &mut wire {
        if let Some(row) = w.id().and_then(|id| by_id.get(&id)) {
            w.merge_damage_columns(row);
        }
    }
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeTag;
    use std::fs;
    use tempfile::tempdir;

    const CREATURES: &str = "\
id,name,species,generation,primary_type,secondary_type,hp,attack,defense,special_attack,special_defense,speed,base_stat_total,previous_evolution_id,next_evolution_id,is_legendary
4,charmander,Lizard Pokémon,1,fire,,39,52,43,60,50,65,309,,5,0
5,charmeleon,Flame Pokémon,1,fire,,58,64,58,80,65,80,405,4.0,6,0
6,charizard,Flame Pokémon,1,fire,flying,78,84,78,109,85,100,534,5,,0
bad,missingno,,,,,,,,,,,,,,
";

    const DAMAGE: &str = "\
id,double_damage_from,half_damage_from,no_damage_from
4,\"ground,rock,water\",\"bug,fairy,fire,grass,ice,steel\",
6,\"electric,rock,water\",\"bug,fairy,fighting,fire,grass,steel\",ground
";

    #[test]
    fn csv_pair_merges_damage_by_id() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CREATURES_CSV), CREATURES).unwrap();
        fs::write(dir.path().join(DAMAGE_CSV), DAMAGE).unwrap();

        let loaded = load_path(dir.path()).unwrap();
        assert!(matches!(loaded.source, DatasetSource::Csv { damage: Some(_), .. }));
        assert_eq!(loaded.summary.loaded, 3);
        assert_eq!(loaded.summary.skipped, 1);

        let c = &loaded.catalog;
        let charizard = c.get(6).unwrap();
        assert_eq!(charizard.secondary_type, Some(TypeTag::Flying));
        assert_eq!(charizard.damage.no_damage_from, vec![TypeTag::Ground]);
        // 5 has no damage row.
        assert!(c.get(5).unwrap().damage.double_damage_from.is_empty());
        assert_eq!(c.get(5).unwrap().previous_evolution_id, Some(4));
        assert_eq!(c.evolution_chain(6).stages, vec![vec![4], vec![5], vec![6]]);
    }

    #[test]
    fn single_csv_without_damage_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creatures.csv");
        fs::write(&path, CREATURES).unwrap();
        let loaded = load_path(&path).unwrap();
        assert_eq!(
            loaded.source,
            DatasetSource::Csv {
                creatures: path,
                damage: None
            }
        );
        assert_eq!(loaded.catalog.len(), 3);
    }

    #[test]
    fn json_dataset_counts_corrected_totals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[
                {"id": 2, "name": "ivysaur", "primary_type": "grass", "hp": 60, "base_stat_total": 61},
                {"id": 1, "name": "bulbasaur", "primary_type": "grass", "hp": 45, "base_stat_total": 45}
            ]"#,
        )
        .unwrap();
        let loaded = load_path(&path).unwrap();
        assert_eq!(loaded.summary.corrected_totals, 1);
        let ids: Vec<u32> = loaded.catalog.ids().collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_path(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn duplicate_ids_fail_the_load() {
        let err = catalog_from_json_str(
            r#"[{"id": 1, "name": "a", "primary_type": "fire"},
                {"id": 1, "name": "b", "primary_type": "fire"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(1)));
    }
}
