use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::route::{HoldParameters, Waypoint};

use super::FixLookup;

/// Suffix used on drawing labels, e.g. `ENI*`.
const DRAW_LABEL_SUFFIX: char = '*';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    Sid,
    Star,
}

impl ProcedureKind {
    /// Human readable name used in readbacks.
    pub fn description(&self) -> &'static str {
        match self {
            ProcedureKind::Sid => "departure",
            ProcedureKind::Star => "arrival",
        }
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcedureKind::Sid => write!(f, "SID"),
            ProcedureKind::Star => write!(f, "STAR"),
        }
    }
}

/// One fix in a procedure definition: either `"NAME"` or `["NAME", "A80+|S250-"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixToken {
    Name(String),
    Restricted(String, String),
}

impl FixToken {
    pub fn name(&self) -> &str {
        match self {
            FixToken::Name(name) | FixToken::Restricted(name, _) => name,
        }
    }

    pub fn restrictions(&self) -> Option<&str> {
        match self {
            FixToken::Name(_) => None,
            FixToken::Restricted(_, restrictions) => Some(restrictions),
        }
    }
}

/// Procedure as written in the airport file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcedureDefinition {
    pub rwy: BTreeMap<String, Vec<FixToken>>,
    pub entry_points: BTreeMap<String, Vec<FixToken>>,
    pub body: Vec<FixToken>,
    pub exit_points: BTreeMap<String, Vec<FixToken>>,
    pub draw: Vec<Vec<String>>,
    pub holds: BTreeMap<String, HoldParameters>,
}

/// A SID or STAR. Expanding it for an `(entry, exit)` pair yields
/// `entry ++ body ++ exit`.
///
/// A SID enters from a runway and leaves by an exit point; a STAR enters by an
/// entry point and ends at a runway.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    icao: String,
    name: String,
    kind: ProcedureKind,
    entry_points: BTreeMap<String, Vec<FixToken>>,
    body: Vec<FixToken>,
    exit_points: BTreeMap<String, Vec<FixToken>>,
    draw: Vec<Vec<String>>,
    holds: BTreeMap<String, HoldParameters>,
}

impl Procedure {
    pub fn from_definition(
        icao: &str,
        name: &str,
        kind: ProcedureKind,
        definition: ProcedureDefinition,
    ) -> Result<Self, RouteError> {
        let ProcedureDefinition {
            rwy,
            entry_points,
            body,
            exit_points,
            draw,
            holds,
        } = definition;

        let (entry_points, exit_points) = match kind {
            ProcedureKind::Sid => (rwy, exit_points),
            ProcedureKind::Star => (entry_points, rwy),
        };

        if entry_points.is_empty() || exit_points.is_empty() {
            return Err(RouteError::Format(format!(
                "{} {} must declare at least one entry and one exit",
                kind, name
            )));
        }

        Ok(Self {
            icao: icao.to_uppercase(),
            name: name.to_uppercase(),
            kind,
            entry_points,
            body,
            exit_points,
            draw,
            holds,
        })
    }

    pub fn icao(&self) -> &str {
        &self.icao
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entry_points.keys().map(String::as_str).collect()
    }

    pub fn exit_names(&self) -> Vec<&str> {
        self.exit_points.keys().map(String::as_str).collect()
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entry_points.contains_key(name)
    }

    pub fn has_exit(&self, name: &str) -> bool {
        self.exit_points.contains_key(name)
    }

    pub fn first_entry_point(&self) -> Option<&str> {
        self.entry_points.keys().next().map(String::as_str)
    }

    pub fn has_only_one_entry(&self) -> bool {
        self.entry_points.len() == 1
    }

    pub fn draw_segments(&self) -> &[Vec<String>] {
        &self.draw
    }

    pub fn default_hold(&self, fix_name: &str) -> Option<&HoldParameters> {
        self.holds.get(fix_name)
    }

    /// Expand the procedure for the given entry and exit keys.
    pub fn resolve<F>(&self, entry: &str, exit: &str, fixes: &F) -> Result<Vec<Waypoint>, RouteError>
    where
        F: FixLookup + ?Sized,
    {
        let entry_tokens = self.entry_points.get(entry).ok_or_else(|| {
            RouteError::NotFound(format!("{} is not a valid entry for {}", entry, self.name))
        })?;
        let exit_tokens = self.exit_points.get(exit).ok_or_else(|| {
            RouteError::NotFound(format!("{} is not a valid exit for {}", exit, self.name))
        })?;

        entry_tokens
            .iter()
            .chain(self.body.iter())
            .chain(exit_tokens.iter())
            .map(|token| {
                let waypoint = Waypoint::from_token(token, fixes)?;
                Ok(match self.holds.get(waypoint.name()) {
                    Some(hold) => waypoint.with_default_hold_parameters(hold.clone()),
                    None => waypoint,
                })
            })
            .collect()
    }

    /// Every fix referenced by this procedure, including drawing segments.
    pub fn all_fix_names_in_use(&self) -> BTreeSet<String> {
        let tokens = self
            .entry_points
            .values()
            .chain(self.exit_points.values())
            .flatten()
            .chain(self.body.iter())
            .map(FixToken::name);
        let drawn = self.draw.iter().flatten().map(String::as_str);

        tokens
            .chain(drawn)
            .filter_map(clean_fix_name)
            .collect()
    }

    pub fn random_exit(&self) -> Option<&str> {
        let names = self.exit_names();
        names.choose(&mut rand::thread_rng()).copied()
    }

    /// A random exit that expands cleanly from `entry`. Every exit is tried at most once.
    pub fn random_resolvable_exit<F>(&self, entry: &str, fixes: &F) -> Option<String>
    where
        F: FixLookup + ?Sized,
    {
        let mut names = self.exit_names();
        names.shuffle(&mut rand::thread_rng());

        names
            .into_iter()
            .find(|exit| self.resolve(entry, exit, fixes).is_ok())
            .map(str::to_string)
    }
}

fn clean_fix_name(name: &str) -> Option<String> {
    let name = name
        .trim_end_matches(DRAW_LABEL_SUFFIX)
        .trim_start_matches(['^', '@']);

    if name.is_empty() || name.starts_with('#') {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::FixDatabase;
    use crate::utils::navigation::TurnDirection;

    const TYSSN4: &str = r##"{
        "entryPoints": {
            "BCE": ["BCE", "CANYN"],
            "PGS": ["PGS"]
        },
        "body": ["TYSSN", ["SUNST", "A120+|S280-"], ["KADDY", "A100+"]],
        "rwy": {
            "KLAS07R": [["RUSSY", "A70"], "KLAS07R"],
            "KLAS25L": ["KLAS25L"]
        },
        "draw": [["BCE*", "CANYN", "TYSSN"], ["PGS*", "TYSSN"], ["KADDY", "#250"]],
        "holds": {
            "KADDY": { "inboundHeading": 270, "legLength": "1min", "turnDirection": "left", "speedMaximum": 210 }
        }
    }"##;

    fn fixes() -> FixDatabase {
        let mut db = FixDatabase::new();
        for (name, pos) in [
            ("BCE", (37.689, -112.3031)),
            ("CANYN", (36.9, -113.5)),
            ("PGS", (35.6248, -113.5441)),
            ("TYSSN", (36.3, -114.3)),
            ("SUNST", (36.25, -114.6)),
            ("KADDY", (36.15, -114.8)),
            ("RUSSY", (36.05, -115.02)),
            ("KLAS07R", (36.0714, -115.1634)),
            ("KLAS25L", (36.0823, -115.1260)),
        ] {
            db.insert(name, pos);
        }
        db
    }

    fn tyssn4() -> Procedure {
        let definition: ProcedureDefinition = serde_json::from_str(TYSSN4).unwrap();
        Procedure::from_definition("KLAS", "TYSSN4", ProcedureKind::Star, definition).unwrap()
    }

    #[test]
    fn test_star_uses_runways_as_exits() {
        let star = tyssn4();
        assert_eq!(star.entry_names(), vec!["BCE", "PGS"]);
        assert_eq!(star.exit_names(), vec!["KLAS07R", "KLAS25L"]);
        assert_eq!(star.first_entry_point(), Some("BCE"));
        assert!(!star.has_only_one_entry());
    }

    #[test]
    fn test_resolve_applies_restrictions_and_holds() {
        let star = tyssn4();
        let waypoints = star.resolve("PGS", "KLAS07R", &fixes()).unwrap();
        let names: Vec<&str> = waypoints.iter().map(|wp| wp.name()).collect();
        assert_eq!(names, vec!["PGS", "TYSSN", "SUNST", "KADDY", "RUSSY", "KLAS07R"]);

        assert_eq!(waypoints[2].altitude_minimum(), Some(12000));
        assert_eq!(waypoints[2].speed_maximum(), Some(280));
        assert_eq!(waypoints[4].altitude_maximum(), Some(7000));

        let hold = waypoints[3].default_hold_parameters();
        assert_eq!(hold.inbound_heading, Some(270.0));
        assert_eq!(hold.turn_direction, TurnDirection::Left);
        assert_eq!(hold.speed_maximum, Some(210));
    }

    #[test]
    fn test_published_hold_starts_from_defaults() {
        let definition: ProcedureDefinition = serde_json::from_str(
            r#"{
                "entryPoints": { "PGS": ["PGS"] },
                "body": [["@KADDY", "S250-"], "RUSSY"],
                "rwy": { "KLAS07R": ["KLAS07R"] },
                "holds": {
                    "KADDY": { "inboundHeading": 90, "turnDirection": "left", "speedMaximum": 210 }
                }
            }"#,
        )
        .unwrap();
        let star = Procedure::from_definition("KLAS", "KADDY1", ProcedureKind::Star, definition).unwrap();

        let waypoints = star.resolve("PGS", "KLAS07R", &fixes()).unwrap();
        let kaddy = &waypoints[1];
        assert!(kaddy.is_hold());
        assert_eq!(kaddy.hold_parameters().inbound_heading, Some(90.0));
        assert_eq!(kaddy.hold_parameters().turn_direction, TurnDirection::Left);
        assert_eq!(kaddy.speed_maximum(), Some(210));
        assert_eq!(kaddy.restriction_speed_maximum(), Some(250));
    }

    #[test]
    fn test_resolve_unknown_keys() {
        let star = tyssn4();
        assert!(matches!(star.resolve("MLF", "KLAS07R", &fixes()), Err(RouteError::NotFound(_))));
        assert!(matches!(star.resolve("PGS", "KLAS19R", &fixes()), Err(RouteError::NotFound(_))));
    }

    #[test]
    fn test_all_fix_names_in_use() {
        let names = tyssn4().all_fix_names_in_use();
        assert!(names.contains("BCE"));
        assert!(names.contains("RUSSY"));
        assert!(names.contains("KLAS25L"));
        assert!(!names.contains("BCE*"));
        assert!(!names.iter().any(|name| name.starts_with('#')));
    }

    #[test]
    fn test_requires_entries_and_exits() {
        let definition = ProcedureDefinition {
            body: vec![FixToken::Name("TYSSN".to_string())],
            ..ProcedureDefinition::default()
        };
        assert!(Procedure::from_definition("KLAS", "EMPTY1", ProcedureKind::Sid, definition).is_err());
    }

    #[test]
    fn test_random_resolvable_exit_skips_broken_exits() {
        let mut db = fixes();
        let star = tyssn4();
        for _ in 0..10 {
            let exit = star.random_resolvable_exit("PGS", &db).unwrap();
            assert!(star.has_exit(&exit));
        }

        // with RUSSY unknown only KLAS25L still expands
        db.remove("RUSSY");
        for _ in 0..10 {
            assert_eq!(star.random_resolvable_exit("PGS", &db).as_deref(), Some("KLAS25L"));
        }
        assert_eq!(star.random_resolvable_exit("NOPE", &db), None);
        assert!(star.random_exit().is_some());
    }
}
