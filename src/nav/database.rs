use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Airway, AirwayLookup, FixLookup, Procedure, ProcedureDefinition, ProcedureKind, ProcedureLookup, Runway};

/// Named fix positions as `(lat, lon)`.
#[derive(Debug, Clone, Default)]
pub struct FixDatabase {
    fixes: HashMap<String, (f64, f64)>,
}

impl FixDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, position: (f64, f64)) {
        self.fixes.insert(name.to_uppercase(), position);
    }

    pub fn remove(&mut self, name: &str) -> Option<(f64, f64)> {
        self.fixes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<(f64, f64)> {
        self.fixes.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

impl FixLookup for FixDatabase {
    fn find_position_by_name(&self, name: &str) -> Option<(f64, f64)> {
        self.get(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayDefinition {
    pub name: String,
    pub position: (f64, f64),
}

/// Airport data file layout (`data/airports/*.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportFile {
    pub icao: String,
    #[serde(default)]
    pub runways: Vec<RunwayDefinition>,
    #[serde(default)]
    pub fixes: BTreeMap<String, (f64, f64)>,
    #[serde(default)]
    pub airways: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub sids: BTreeMap<String, ProcedureDefinition>,
    #[serde(default)]
    pub stars: BTreeMap<String, ProcedureDefinition>,
}

/// In-memory fixes, airways, procedures and runways for one or more airports.
#[derive(Debug, Clone, Default)]
pub struct NavigationData {
    fixes: FixDatabase,
    airways: HashMap<String, Arc<Airway>>,
    sids: HashMap<String, Arc<Procedure>>,
    stars: HashMap<String, Arc<Procedure>>,
    runways: HashMap<String, Runway>,
}

impl NavigationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single airport file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut nav = Self::new();
        nav.load_airport_file(path)?;
        Ok(nav)
    }

    /// Load every `*.json` airport file in a directory.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read airport directory: {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();

        let mut nav = Self::new();
        for path in paths {
            nav.load_airport_file(&path)?;
        }

        Ok(nav)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let airport: AirportFile =
            serde_json::from_str(json).context("Failed to parse airport JSON")?;
        let mut nav = Self::new();
        nav.add_airport(airport);
        Ok(nav)
    }

    fn load_airport_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read airport file: {:?}", path))?;
        let airport: AirportFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse airport JSON: {:?}", path))?;

        self.add_airport(airport);
        Ok(())
    }

    /// Register an airport's data. Airways and procedures that do not
    /// validate are skipped with a warning.
    pub fn add_airport(&mut self, airport: AirportFile) {
        let icao = airport.icao.to_uppercase();

        for (name, position) in &airport.fixes {
            self.fixes.insert(name, *position);
        }

        for definition in &airport.runways {
            let runway = Runway::new(&icao, &definition.name, definition.position);
            self.fixes.insert(&runway.procedure_key(), runway.position());
            self.runways.insert(runway.procedure_key(), runway);
        }

        for (name, fix_names) in airport.airways {
            match Airway::new(&name, fix_names, &self.fixes) {
                Ok(airway) => {
                    self.airways.insert(airway.name().to_string(), Arc::new(airway));
                }
                Err(e) => warn!("[NAVDATA] Skipping airway {}: {}", name, e),
            }
        }

        for (kind, definitions) in [
            (ProcedureKind::Sid, airport.sids),
            (ProcedureKind::Star, airport.stars),
        ] {
            for (name, definition) in definitions {
                let procedure = match Procedure::from_definition(&icao, &name, kind, definition) {
                    Ok(procedure) => procedure,
                    Err(e) => {
                        warn!("[NAVDATA] Skipping {} {}: {}", kind, name, e);
                        continue;
                    }
                };

                let missing: Vec<String> = procedure
                    .all_fix_names_in_use()
                    .into_iter()
                    .filter(|fix| !self.fixes.contains(fix))
                    .collect();
                if !missing.is_empty() {
                    debug!("[NAVDATA] {} {} references unknown fixes: {:?}", kind, name, missing);
                }

                let table = match kind {
                    ProcedureKind::Sid => &mut self.sids,
                    ProcedureKind::Star => &mut self.stars,
                };
                table.insert(procedure.name().to_string(), Arc::new(procedure));
            }
        }

        info!(
            "[NAVDATA] Loaded {}: {} fixes, {} airways, {} SIDs, {} STARs",
            icao,
            self.fixes.len(),
            self.airways.len(),
            self.sids.len(),
            self.stars.len()
        );
    }

    pub fn fixes(&self) -> &FixDatabase {
        &self.fixes
    }

    pub fn runway(&self, icao: &str, name: &str) -> Option<&Runway> {
        self.runways
            .get(&format!("{}{}", icao.to_uppercase(), name.to_uppercase()))
    }

    pub fn runways(&self) -> impl Iterator<Item = &Runway> {
        self.runways.values()
    }

    pub fn procedure_names(&self, kind: ProcedureKind) -> Vec<&str> {
        let table = match kind {
            ProcedureKind::Sid => &self.sids,
            ProcedureKind::Star => &self.stars,
        };
        let mut names: Vec<&str> = table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FixLookup for NavigationData {
    fn find_position_by_name(&self, name: &str) -> Option<(f64, f64)> {
        self.fixes.get(name)
    }
}

impl ProcedureLookup for NavigationData {
    fn find_procedure(&self, name: &str, kind: ProcedureKind) -> Option<Arc<Procedure>> {
        let table = match kind {
            ProcedureKind::Sid => &self.sids,
            ProcedureKind::Star => &self.stars,
        };
        table.get(name).cloned()
    }
}

impl AirwayLookup for NavigationData {
    fn find_airway(&self, name: &str) -> Option<Arc<Airway>> {
        self.airways.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIRPORT: &str = r#"{
        "icao": "ktst",
        "runways": [{ "name": "09", "position": [36.0, -115.2] }],
        "fixes": {
            "ALPHA": [36.1, -115.0],
            "BRAVO": [36.2, -114.8],
            "CHRLY": [36.3, -114.6]
        },
        "airways": {
            "V1": ["ALPHA", "BRAVO", "CHRLY"],
            "V2": ["ALPHA", "GHOST"]
        },
        "sids": {
            "ALPHA1": {
                "rwy": { "KTST09": ["KTST09"] },
                "body": [["ALPHA", "A50+"]],
                "exitPoints": { "CHRLY": ["BRAVO", "CHRLY"] }
            },
            "BROKEN1": { "body": ["ALPHA"] }
        }
    }"#;

    #[test]
    fn test_from_json_str() -> Result<()> {
        let nav = NavigationData::from_json_str(AIRPORT)?;

        assert_eq!(nav.find_position_by_name("KTST09"), Some((36.0, -115.2)));
        assert!(nav.runway("KTST", "09").is_some());
        assert!(nav.find_airway("V1").is_some());
        // V2 references an unknown fix
        assert!(nav.find_airway("V2").is_none());

        assert!(nav.find_procedure("ALPHA1", ProcedureKind::Sid).is_some());
        assert!(nav.find_procedure("ALPHA1", ProcedureKind::Star).is_none());
        assert!(nav.find_procedure("BROKEN1", ProcedureKind::Sid).is_none());
        assert_eq!(nav.procedure_names(ProcedureKind::Sid), vec!["ALPHA1"]);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = NavigationData::load("data/airports/nope.json");
        assert!(result.is_err());
    }
}
