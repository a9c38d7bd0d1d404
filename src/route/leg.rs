use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::RouteError;
use crate::nav::{Airway, NavData, Procedure, ProcedureKind, Runway};

use super::segment::{DIRECT_SEGMENT_DIVIDER, PROCEDURE_SEGMENT_DIVIDER};
use super::waypoint::Waypoint;

/// What a leg was built from. Each variant only carries the data its kind needs.
#[derive(Debug, Clone)]
pub enum LegKind {
    Direct,
    Airway {
        airway: Arc<Airway>,
        entry: String,
        exit: String,
    },
    Sid {
        procedure: Arc<Procedure>,
        runway: String,
        exit: String,
    },
    Star {
        procedure: Arc<Procedure>,
        entry: String,
        runway: String,
    },
}

/// One segment of a route, expanded into waypoints.
///
/// `consumed` holds the waypoints already flown; `consumed ++ waypoints` is the
/// leg's full expansion.
#[derive(Debug, Clone)]
pub struct Leg {
    kind: LegKind,
    route_string: String,
    waypoints: Vec<Waypoint>,
    consumed: Vec<Waypoint>,
}

impl Leg {
    /// Build a leg from a single segment such as `OAL`, `TNP.J92.OAL` or
    /// `KLAS07R.BOACH6.TNP`.
    pub fn new<N>(segment: &str, nav: &N) -> Result<Self, RouteError>
    where
        N: NavData + ?Sized,
    {
        if segment.contains(DIRECT_SEGMENT_DIVIDER) {
            return Err(RouteError::InvalidLeg(format!(
                "`{}` describes more than one leg",
                segment
            )));
        }

        let tokens: Vec<&str> = segment.split(PROCEDURE_SEGMENT_DIVIDER).collect();
        let leg = match tokens.as_slice() {
            [fix] => Self::direct(Waypoint::parse(fix, None, nav)?),
            [entry, name, exit] => Self::build_procedural(entry, name, exit, nav)?,
            _ => {
                return Err(RouteError::InvalidLeg(format!(
                    "`{}` must be a single fix or ENTRY.NAME.EXIT",
                    segment
                )))
            }
        };

        debug!("[LEG] Built {} with {} waypoints", leg.route_string, leg.waypoints.len());
        Ok(leg)
    }

    fn build_procedural<N>(entry: &str, name: &str, exit: &str, nav: &N) -> Result<Self, RouteError>
    where
        N: NavData + ?Sized,
    {
        if let Some(airway) = nav.find_airway(name) {
            return Self::from_airway(airway, entry, exit, nav);
        }

        if let Some(procedure) = nav.find_procedure(name, ProcedureKind::Sid) {
            let waypoints = procedure.resolve(entry, exit, nav)?;
            return Ok(Self::from_parts(
                LegKind::Sid {
                    procedure,
                    runway: entry.to_string(),
                    exit: exit.to_string(),
                },
                waypoints,
            ));
        }

        if let Some(procedure) = nav.find_procedure(name, ProcedureKind::Star) {
            let waypoints = procedure.resolve(entry, exit, nav)?;
            return Ok(Self::from_parts(
                LegKind::Star {
                    procedure,
                    entry: entry.to_string(),
                    runway: exit.to_string(),
                },
                waypoints,
            ));
        }

        Err(RouteError::InvalidLeg(format!(
            "{} is neither a known airway nor a known procedure",
            name
        )))
    }

    fn from_airway<N>(airway: Arc<Airway>, entry: &str, exit: &str, nav: &N) -> Result<Self, RouteError>
    where
        N: NavData + ?Sized,
    {
        let waypoints = airway.resolve(entry, exit, nav).ok_or_else(|| {
            RouteError::InvalidLeg(format!(
                "unable to follow {} from {} to {}",
                airway.name(),
                entry,
                exit
            ))
        })?;

        Ok(Self::from_parts(
            LegKind::Airway {
                airway,
                entry: entry.to_string(),
                exit: exit.to_string(),
            },
            waypoints,
        ))
    }

    /// A direct leg to an already built waypoint. Restrictions and hold data are kept.
    pub fn direct(waypoint: Waypoint) -> Self {
        Self::from_parts(LegKind::Direct, vec![waypoint])
    }

    fn from_parts(kind: LegKind, waypoints: Vec<Waypoint>) -> Self {
        let route_string = match &kind {
            LegKind::Direct => waypoints
                .first()
                .map(Waypoint::route_token)
                .unwrap_or_default(),
            LegKind::Airway { airway, entry, exit } => {
                format!("{}.{}.{}", entry, airway.name(), exit)
            }
            LegKind::Sid { procedure, runway, exit } => {
                format!("{}.{}.{}", runway, procedure.name(), exit)
            }
            LegKind::Star { procedure, entry, runway } => {
                format!("{}.{}.{}", entry, procedure.name(), runway)
            }
        };

        Self {
            kind,
            route_string,
            waypoints,
            consumed: Vec::new(),
        }
    }

    pub fn kind(&self) -> &LegKind {
        &self.kind
    }

    pub fn route_string(&self) -> &str {
        &self.route_string
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.kind, LegKind::Direct)
    }

    pub fn is_airway(&self) -> bool {
        matches!(self.kind, LegKind::Airway { .. })
    }

    pub fn is_sid(&self) -> bool {
        matches!(self.kind, LegKind::Sid { .. })
    }

    pub fn is_star(&self) -> bool {
        matches!(self.kind, LegKind::Star { .. })
    }

    pub fn is_procedure(&self) -> bool {
        self.is_sid() || self.is_star()
    }

    pub fn procedure(&self) -> Option<&Arc<Procedure>> {
        match &self.kind {
            LegKind::Sid { procedure, .. } | LegKind::Star { procedure, .. } => Some(procedure),
            _ => None,
        }
    }

    pub fn airway(&self) -> Option<&Arc<Airway>> {
        match &self.kind {
            LegKind::Airway { airway, .. } => Some(airway),
            _ => None,
        }
    }

    /// First token of the leg string. A SID enters from its runway.
    pub fn entry_name(&self) -> Option<&str> {
        match &self.kind {
            LegKind::Direct => None,
            LegKind::Airway { entry, .. } | LegKind::Star { entry, .. } => Some(entry),
            LegKind::Sid { runway, .. } => Some(runway),
        }
    }

    /// Last token of the leg string. A STAR exits onto its runway.
    pub fn exit_name(&self) -> Option<&str> {
        match &self.kind {
            LegKind::Direct => None,
            LegKind::Airway { exit, .. } | LegKind::Sid { exit, .. } => Some(exit),
            LegKind::Star { runway, .. } => Some(runway),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn consumed_waypoints(&self) -> &[Waypoint] {
        &self.consumed
    }

    /// Consumed then pending waypoints.
    pub fn all_waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.consumed.iter().chain(self.waypoints.iter())
    }

    pub fn has_history(&self) -> bool {
        !self.consumed.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoint_names(&self) -> Vec<&str> {
        self.waypoints.iter().map(Waypoint::name).collect()
    }

    pub fn has_waypoint_name(&self, name: &str) -> bool {
        self.waypoints.iter().any(|wp| wp.name() == name)
    }

    pub fn waypoint_mut(&mut self, name: &str) -> Option<&mut Waypoint> {
        self.waypoints.iter_mut().find(|wp| wp.name() == name)
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(1)
    }

    pub fn has_next_waypoint(&self) -> bool {
        self.waypoints.len() > 1
    }

    pub fn move_to_next_waypoint(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }

        let waypoint = self.waypoints.remove(0);
        trace!("[LEG] {} passed {}", self.route_string, waypoint.name());
        self.consumed.push(waypoint);
    }

    /// Make `name` the current waypoint. Returns `false` and leaves the leg alone
    /// if it has no pending waypoint of that name.
    pub fn skip_to_waypoint_name(&mut self, name: &str) -> bool {
        let Some(index) = self.waypoints.iter().position(|wp| wp.name() == name) else {
            return false;
        };

        self.consumed.extend(self.waypoints.drain(..index));
        true
    }

    pub fn skip_all_waypoints_in_leg(&mut self) {
        self.consumed.append(&mut self.waypoints);
    }

    /// Pending track length in nautical miles, ignoring vector points.
    pub fn distance_nm(&self) -> f64 {
        self.waypoints
            .windows(2)
            .filter_map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Highest altitude ceiling on a procedure leg.
    pub fn top_altitude(&self) -> Option<u32> {
        if !self.is_procedure() {
            return None;
        }
        self.all_waypoints().filter_map(Waypoint::altitude_maximum).max()
    }

    /// Lowest altitude floor on a procedure leg.
    pub fn bottom_altitude(&self) -> Option<u32> {
        if !self.is_procedure() {
            return None;
        }
        self.all_waypoints().filter_map(Waypoint::altitude_minimum).min()
    }

    pub fn update_sid_for_departure_runway<N>(&mut self, runway: &Runway, nav: &N) -> bool
    where
        N: NavData + ?Sized,
    {
        let LegKind::Sid { procedure, runway: current, exit } = &self.kind else {
            return false;
        };

        let key = runway.procedure_key();
        if *current == key || !procedure.has_entry(&key) {
            return false;
        }

        match procedure.resolve(&key, exit, nav) {
            Ok(waypoints) => {
                let kind = LegKind::Sid {
                    procedure: Arc::clone(procedure),
                    runway: key,
                    exit: exit.clone(),
                };
                self.replace_expansion(kind, waypoints);
                true
            }
            Err(e) => {
                debug!("[LEG] Unable to move {} to {}: {}", self.route_string, key, e);
                false
            }
        }
    }

    pub fn update_star_for_arrival_runway<N>(&mut self, runway: &Runway, nav: &N) -> bool
    where
        N: NavData + ?Sized,
    {
        let LegKind::Star { procedure, entry, runway: current } = &self.kind else {
            return false;
        };

        let key = runway.procedure_key();
        if *current == key || !procedure.has_exit(&key) {
            return false;
        }

        match procedure.resolve(entry, &key, nav) {
            Ok(waypoints) => {
                let kind = LegKind::Star {
                    procedure: Arc::clone(procedure),
                    entry: entry.clone(),
                    runway: key,
                };
                self.replace_expansion(kind, waypoints);
                true
            }
            Err(e) => {
                debug!("[LEG] Unable to move {} to {}: {}", self.route_string, key, e);
                false
            }
        }
    }

    fn replace_expansion(&mut self, kind: LegKind, waypoints: Vec<Waypoint>) {
        let previous = std::mem::take(&mut self.route_string);
        *self = Self::from_parts(kind, waypoints);
        debug!("[LEG] Re-resolved {} as {}", previous, self.route_string);
    }

    /// Full expansion as fresh pending waypoints.
    fn expansion(&self) -> Vec<Waypoint> {
        self.all_waypoints().cloned().collect()
    }

    /// The same leg with its history put back in front of the pending waypoints.
    pub(crate) fn restarted(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            route_string: self.route_string.clone(),
            waypoints: self.expansion(),
            consumed: Vec::new(),
        }
    }

    /// Legs covering this leg's full expansion up to and including the
    /// waypoint at `index`.
    pub(crate) fn leading_through<N>(&self, index: usize, nav: &N) -> Vec<Leg>
    where
        N: NavData + ?Sized,
    {
        let expansion = self.expansion();
        if index + 1 >= expansion.len() {
            return vec![self.restarted()];
        }

        let cut = expansion[index].name();
        let resolved = match &self.kind {
            LegKind::Direct => return vec![self.restarted()],
            LegKind::Airway { airway, entry, .. } => {
                if index == 0 {
                    return vec![Leg::direct(expansion[0].clone())];
                }
                Self::from_airway(Arc::clone(airway), entry, cut, nav).ok()
            }
            LegKind::Sid { procedure, runway, .. } if procedure.has_exit(cut) => procedure
                .resolve(runway, cut, nav)
                .ok()
                .map(|waypoints| {
                    let kind = LegKind::Sid {
                        procedure: Arc::clone(procedure),
                        runway: runway.clone(),
                        exit: cut.to_string(),
                    };
                    Self::from_parts(kind, waypoints)
                }),
            LegKind::Sid { .. } | LegKind::Star { .. } => None,
        };

        match resolved {
            Some(leg) => vec![leg],
            None => explode(&expansion[..=index]),
        }
    }

    /// Legs covering this leg's full expansion from the waypoint at `index` onward.
    pub(crate) fn trailing_from<N>(&self, index: usize, nav: &N) -> Vec<Leg>
    where
        N: NavData + ?Sized,
    {
        let expansion = self.expansion();
        if index == 0 || index >= expansion.len() {
            return vec![self.restarted()];
        }

        let last = expansion.len() - 1;
        let cut = expansion[index].name();
        let resolved = match &self.kind {
            LegKind::Direct => return vec![self.restarted()],
            LegKind::Airway { airway, exit, .. } => {
                if index == last {
                    return vec![Leg::direct(expansion[last].clone())];
                }
                Self::from_airway(Arc::clone(airway), cut, exit, nav).ok()
            }
            LegKind::Star { procedure, runway, .. } if procedure.has_entry(cut) => procedure
                .resolve(cut, runway, nav)
                .ok()
                .map(|waypoints| {
                    let kind = LegKind::Star {
                        procedure: Arc::clone(procedure),
                        entry: cut.to_string(),
                        runway: runway.clone(),
                    };
                    Self::from_parts(kind, waypoints)
                }),
            LegKind::Sid { .. } | LegKind::Star { .. } => None,
        };

        match resolved {
            Some(leg) => vec![leg],
            None => explode(&expansion[index..]),
        }
    }
}

/// One direct leg per waypoint, keeping each waypoint's restrictions.
fn explode(waypoints: &[Waypoint]) -> Vec<Leg> {
    waypoints.iter().cloned().map(Leg::direct).collect()
}
