use crate::error::RouteError;
use crate::route::Waypoint;

use super::FixLookup;

/// A named, ordered chain of fixes that can be flown in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Airway {
    name: String,
    fix_names: Vec<String>,
}

impl Airway {
    pub fn new<F>(name: &str, fix_names: Vec<String>, fixes: &F) -> Result<Self, RouteError>
    where
        F: FixLookup + ?Sized,
    {
        if fix_names.len() < 2 {
            return Err(RouteError::Format(format!(
                "airway {} needs at least 2 fixes, found {}",
                name,
                fix_names.len()
            )));
        }

        if let Some(missing) = fix_names
            .iter()
            .find(|fix| fixes.find_position_by_name(fix).is_none())
        {
            return Err(RouteError::NotFound(format!(
                "fix {} on airway {}",
                missing, name
            )));
        }

        Ok(Self {
            name: name.to_uppercase(),
            fix_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fix_names(&self) -> &[String] {
        &self.fix_names
    }

    pub fn has_fix(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fix_names.iter().position(|fix| fix == name)
    }

    /// Fix names from `entry` to `exit` inclusive, in the direction of travel.
    pub fn fix_names_between(&self, entry: &str, exit: &str) -> Option<Vec<&str>> {
        if entry == exit {
            return None;
        }

        let entry_index = self.index_of(entry)?;
        let exit_index = self.index_of(exit)?;

        let names: Vec<&str> = if entry_index < exit_index {
            self.fix_names[entry_index..=exit_index]
                .iter()
                .map(String::as_str)
                .collect()
        } else {
            self.fix_names[exit_index..=entry_index]
                .iter()
                .rev()
                .map(String::as_str)
                .collect()
        };

        Some(names)
    }

    /// Unrestricted waypoints from `entry` to `exit` inclusive. `None` when
    /// either end is not on this airway or both ends are the same fix.
    pub fn resolve<F>(&self, entry: &str, exit: &str, fixes: &F) -> Option<Vec<Waypoint>>
    where
        F: FixLookup + ?Sized,
    {
        self.fix_names_between(entry, exit)?
            .into_iter()
            .map(|name| Waypoint::parse(name, None, fixes).ok())
            .collect()
    }
}
