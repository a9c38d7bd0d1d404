use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};

/// Runway in use at one airport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRunway {
    pub icao: String,
    pub runway: String,
}

/// Profile configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    /// Airport file or directory of airport files, relative to the profile
    pub nav_data: PathBuf,
    #[serde(default)]
    pub departure_runway: Option<ActiveRunway>,
    #[serde(default)]
    pub arrival_runway: Option<ActiveRunway>,
    #[serde(default)]
    pub routes: Vec<String>,
}

impl ProfileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {:?}", path))?;
        let mut config: ProfileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse profile JSON: {:?}", path))?;

        if config.nav_data.is_relative() {
            if let Some(dir) = path.parent() {
                config.nav_data = dir.join(&config.nav_data);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_profile() -> Result<()> {
        let profile = ProfileConfig::load("data/profiles/klas.json")?;

        println!("Nav data: {:?}", profile.nav_data);
        println!("Routes: {:?}", profile.routes);

        assert!(profile.nav_data.ends_with("airports/klas.json"));
        assert!(!profile.routes.is_empty());
        assert_eq!(profile.departure_runway.map(|r| r.runway).as_deref(), Some("07R"));

        Ok(())
    }

    #[test]
    fn test_load_missing_profile() {
        assert!(ProfileConfig::load("data/profiles/missing.json").is_err());
    }
}
