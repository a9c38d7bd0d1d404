//! Route model: legs and waypoints built from a route string.

mod amend;
mod leg;
mod restriction;
mod segment;
mod waypoint;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::RouteError;
use crate::nav::{NavData, Runway};

pub use amend::Readback;
pub use leg::{Leg, LegKind};
pub use restriction::{parse_restriction, parse_restrictions, BoundKind, Restriction, RestrictionKind};
pub use segment::{
    combine_route_strings, divide_route_string, validate_route_string, with_spaces,
    DIRECT_SEGMENT_DIVIDER, PROCEDURE_SEGMENT_DIVIDER,
};
pub use waypoint::{HoldClearance, HoldLegLength, HoldParameters, Waypoint, WaypointTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// Nothing flown yet.
    Pending,
    /// Some waypoints flown, some remaining.
    Advancing,
    /// No legs remain.
    Exhausted,
}

/// Where a waypoint of the collapsed view lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewPosition {
    leg: usize,
    /// Index into the leg's pending waypoints.
    index: usize,
    /// A later leg that starts on this same waypoint and was collapsed into it.
    continued_by: Option<usize>,
}

/// A flight plan route.
///
/// `legs` are still to be flown and `consumed_legs` have been flown. Legs only
/// ever move from the former to the latter.
#[derive(Debug, Clone)]
pub struct Route {
    legs: Vec<Leg>,
    consumed_legs: Vec<Leg>,
    nav: Arc<dyn NavData>,
}

impl Route {
    /// Parse a route string such as `KLAS07R.BOACH6.TNP..OAL..MLF`.
    pub fn new(route_string: &str, nav: Arc<dyn NavData>) -> Result<Self, RouteError> {
        let route_string = route_string.to_uppercase();
        validate_route_string(&route_string)?;

        let legs = divide_route_string(&route_string)
            .iter()
            .map(|segment| Leg::new(segment, nav.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let route = Self {
            legs,
            consumed_legs: Vec::new(),
            nav,
        };

        let count = route.waypoints().len();
        if count < 2 {
            return Err(RouteError::TooFewWaypoints(count));
        }

        debug!("[ROUTE] Parsed {} into {} legs", route_string, route.legs.len());
        Ok(route)
    }

    pub fn nav(&self) -> &Arc<dyn NavData> {
        &self.nav
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn consumed_legs(&self) -> &[Leg] {
        &self.consumed_legs
    }

    pub fn state(&self) -> RouteState {
        match self.legs.first() {
            None => RouteState::Exhausted,
            Some(leg) if self.consumed_legs.is_empty() && !leg.has_history() => RouteState::Pending,
            Some(_) => RouteState::Advancing,
        }
    }

    /// Pending waypoints, each tagged with where it lives. A leg's first
    /// waypoint is dropped when the previous leg ended on it.
    fn pending_view(&self) -> Vec<(&Waypoint, ViewPosition)> {
        let mut view: Vec<(&Waypoint, ViewPosition)> = Vec::new();

        for (leg_index, leg) in self.legs.iter().enumerate() {
            for (index, waypoint) in leg.waypoints().iter().enumerate() {
                if index == 0 {
                    if let Some((last, position)) = view.last_mut() {
                        if last.name() == waypoint.name() {
                            position.continued_by = Some(leg_index);
                            continue;
                        }
                    }
                }

                view.push((
                    waypoint,
                    ViewPosition {
                        leg: leg_index,
                        index,
                        continued_by: None,
                    },
                ));
            }
        }

        view
    }

    /// Waypoints still to fly, with boundary duplicates collapsed.
    pub fn waypoints(&self) -> Vec<&Waypoint> {
        self.pending_view().into_iter().map(|(waypoint, _)| waypoint).collect()
    }

    /// Flown and pending waypoints, with boundary duplicates collapsed.
    pub fn full_waypoints(&self) -> Vec<&Waypoint> {
        let mut waypoints: Vec<&Waypoint> = Vec::new();

        for leg in self.consumed_legs.iter().chain(self.legs.iter()) {
            for (index, waypoint) in leg.all_waypoints().enumerate() {
                let duplicate = index == 0
                    && waypoints.last().map_or(false, |last| last.name() == waypoint.name());
                if !duplicate {
                    waypoints.push(waypoint);
                }
            }
        }

        waypoints
    }

    pub fn waypoint_names(&self) -> Vec<&str> {
        self.waypoints().into_iter().map(Waypoint::name).collect()
    }

    pub fn has_waypoint_name(&self, name: &str) -> bool {
        self.legs.iter().any(|leg| leg.has_waypoint_name(name))
    }

    pub fn has_leg_with_route_string(&self, route_string: &str) -> bool {
        let route_string = route_string.to_uppercase();
        self.legs.iter().any(|leg| leg.route_string() == route_string)
    }

    pub fn current_leg(&self) -> Option<&Leg> {
        self.legs.first()
    }

    pub fn next_leg(&self) -> Option<&Leg> {
        self.legs.get(1)
    }

    pub fn has_next_leg(&self) -> bool {
        self.legs.len() > 1
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.legs.first().and_then(Leg::current_waypoint)
    }

    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.pending_view().get(1).map(|(waypoint, _)| *waypoint)
    }

    pub fn has_next_waypoint(&self) -> bool {
        self.next_waypoint().is_some()
    }

    pub fn move_to_next_waypoint(&mut self) {
        let Some(leg) = self.legs.first_mut() else {
            return;
        };

        if leg.has_next_waypoint() {
            leg.move_to_next_waypoint();
        } else {
            self.move_to_next_leg();
        }
    }

    /// Consume the current leg. When the following leg starts on the waypoint
    /// just finished, that waypoint is stepped over as well.
    pub fn move_to_next_leg(&mut self) {
        if self.legs.is_empty() {
            return;
        }

        let mut leg = self.legs.remove(0);
        leg.skip_all_waypoints_in_leg();
        let finished = leg
            .consumed_waypoints()
            .last()
            .map(|waypoint| waypoint.name().to_string());
        trace!("[ROUTE] Finished leg {}", leg.route_string());
        self.consumed_legs.push(leg);

        let Some(finished) = finished else {
            return;
        };

        while let Some(head) = self.legs.first_mut() {
            if head.current_waypoint().map(Waypoint::name) != Some(finished.as_str()) {
                break;
            }

            if head.has_next_waypoint() {
                head.move_to_next_waypoint();
                break;
            }

            let mut duplicate = self.legs.remove(0);
            duplicate.skip_all_waypoints_in_leg();
            self.consumed_legs.push(duplicate);
        }
    }

    /// Fly direct to `name`, consuming everything before it. Returns `false`
    /// and changes nothing if the route has no pending waypoint of that name.
    pub fn skip_to_waypoint_name(&mut self, name: &str) -> bool {
        let Some(position) = self
            .pending_view()
            .into_iter()
            .find(|(waypoint, _)| waypoint.name() == name)
            .map(|(_, position)| position)
        else {
            return false;
        };

        for mut leg in self.legs.drain(..position.leg) {
            leg.skip_all_waypoints_in_leg();
            self.consumed_legs.push(leg);
        }

        debug!("[ROUTE] Skipping to {}", name);
        self.legs
            .first_mut()
            .map_or(false, |leg| leg.skip_to_waypoint_name(name))
    }

    /// Pending legs as a route string.
    pub fn route_string(&self) -> String {
        combine_route_strings(self.legs.iter().map(Leg::route_string))
    }

    /// Flown and pending legs as a route string.
    pub fn full_route_string(&self) -> String {
        combine_route_strings(
            self.consumed_legs
                .iter()
                .chain(self.legs.iter())
                .map(Leg::route_string),
        )
    }

    pub fn route_string_with_spaces(&self) -> String {
        with_spaces(&self.route_string())
    }

    pub fn full_route_string_with_spaces(&self) -> String {
        with_spaces(&self.full_route_string())
    }

    pub fn sid_leg(&self) -> Option<&Leg> {
        self.legs.iter().find(|leg| leg.is_sid())
    }

    pub fn star_leg(&self) -> Option<&Leg> {
        self.legs.iter().find(|leg| leg.is_star())
    }

    pub fn has_sid_leg(&self) -> bool {
        self.sid_leg().is_some()
    }

    pub fn has_star_leg(&self) -> bool {
        self.star_leg().is_some()
    }

    pub fn sid_icao(&self) -> Option<&str> {
        self.sid_leg()?.procedure().map(|procedure| procedure.icao())
    }

    pub fn star_icao(&self) -> Option<&str> {
        self.star_leg()?.procedure().map(|procedure| procedure.icao())
    }

    pub fn sid_exit_name(&self) -> Option<&str> {
        self.sid_leg()?.exit_name()
    }

    pub fn star_entry_name(&self) -> Option<&str> {
        self.star_leg()?.entry_name()
    }

    pub fn top_altitude(&self) -> Option<u32> {
        self.legs.iter().filter_map(Leg::top_altitude).max()
    }

    pub fn bottom_altitude(&self) -> Option<u32> {
        self.legs.iter().filter_map(Leg::bottom_altitude).min()
    }

    /// Bearing from the first to the second positioned pending waypoint.
    pub fn initial_heading(&self) -> Option<i32> {
        let waypoints = self.waypoints();
        let mut positioned = waypoints.iter().filter(|waypoint| !waypoint.is_vector());
        let first = positioned.next()?;
        let second = positioned.next()?;
        first.bearing_to(second)
    }

    /// Remaining track length in nautical miles.
    pub fn distance_nm(&self) -> f64 {
        let positioned: Vec<&Waypoint> = self
            .waypoints()
            .into_iter()
            .filter(|waypoint| !waypoint.is_vector())
            .collect();

        positioned
            .windows(2)
            .filter_map(|pair| pair[0].distance_to(pair[1]))
            .sum()
    }

    pub fn is_runway_valid_for_sid(&self, runway: &Runway) -> bool {
        self.sid_leg()
            .and_then(Leg::procedure)
            .map_or(false, |procedure| procedure.has_entry(&runway.procedure_key()))
    }

    pub fn is_runway_valid_for_star(&self, runway: &Runway) -> bool {
        self.star_leg()
            .and_then(Leg::procedure)
            .map_or(false, |procedure| procedure.has_exit(&runway.procedure_key()))
    }

    /// Re-resolve the SID for a new departure runway. Returns whether anything changed.
    pub fn update_sid_leg_for_departure_runway(&mut self, runway: &Runway) -> bool {
        let nav = Arc::clone(&self.nav);
        self.legs
            .iter_mut()
            .find(|leg| leg.is_sid())
            .map_or(false, |leg| leg.update_sid_for_departure_runway(runway, nav.as_ref()))
    }

    /// Re-resolve the STAR for a new arrival runway. Returns whether anything changed.
    pub fn update_star_leg_for_arrival_runway(&mut self, runway: &Runway) -> bool {
        let nav = Arc::clone(&self.nav);
        self.legs
            .iter_mut()
            .find(|leg| leg.is_star())
            .map_or(false, |leg| leg.update_star_for_arrival_runway(runway, nav.as_ref()))
    }

    fn pending_waypoint_mut(&mut self, name: &str) -> Option<&mut Waypoint> {
        self.legs.iter_mut().find_map(|leg| leg.waypoint_mut(name))
    }

    pub fn activate_hold_for_waypoint_name(&mut self, name: &str, clearance: &HoldClearance) -> bool {
        match self.pending_waypoint_mut(name) {
            Some(waypoint) => {
                waypoint.activate_hold(clearance);
                debug!("[ROUTE] Holding at {}", name);
                true
            }
            None => false,
        }
    }

    pub fn cancel_hold_for_waypoint_name(&mut self, name: &str) -> bool {
        let holding = self
            .legs
            .iter_mut()
            .flat_map(|leg| leg.waypoint_mut(name))
            .find(|waypoint| waypoint.is_hold());

        match holding {
            Some(waypoint) => {
                waypoint.deactivate_hold();
                debug!("[ROUTE] Cancelled hold at {}", name);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavigationData;

    const AIRPORT: &str = r#"{
        "icao": "KTST",
        "fixes": {
            "ALPHA": [36.1, -115.0],
            "BRAVO": [36.2, -114.8],
            "CHRLY": [36.3, -114.6],
            "DELTA": [36.4, -114.4]
        },
        "airways": { "V1": ["ALPHA", "BRAVO", "CHRLY", "DELTA"] }
    }"#;

    fn nav() -> Arc<dyn NavData> {
        Arc::new(NavigationData::from_json_str(AIRPORT).unwrap())
    }

    #[test]
    fn test_too_few_waypoints() {
        assert!(matches!(Route::new("ALPHA", nav()), Err(RouteError::TooFewWaypoints(1))));
        assert!(matches!(Route::new("ALPHA..ALPHA", nav()), Err(RouteError::TooFewWaypoints(1))));
        assert!(matches!(Route::new("ALPHA BRAVO", nav()), Err(RouteError::Format(_))));
    }

    #[test]
    fn test_boundary_waypoint_is_collapsed() {
        let route = Route::new("alpha..alpha.v1.chrly..delta", nav()).unwrap();
        assert_eq!(route.waypoint_names(), vec!["ALPHA", "BRAVO", "CHRLY", "DELTA"]);
        assert_eq!(route.route_string(), "ALPHA.V1.CHRLY..DELTA");
        assert_eq!(route.legs().len(), 3);
    }

    #[test]
    fn test_move_to_next_leg_steps_over_duplicate() {
        let mut route = Route::new("ALPHA..ALPHA.V1.CHRLY..DELTA", nav()).unwrap();
        assert_eq!(route.state(), RouteState::Pending);

        route.move_to_next_waypoint();
        assert_eq!(route.current_waypoint().map(Waypoint::name), Some("BRAVO"));
        assert_eq!(route.state(), RouteState::Advancing);
        assert_eq!(route.consumed_legs().len(), 1);

        route.move_to_next_waypoint();
        route.move_to_next_waypoint();
        assert_eq!(route.current_waypoint().map(Waypoint::name), Some("DELTA"));
        assert!(!route.has_next_waypoint());

        route.move_to_next_waypoint();
        assert_eq!(route.state(), RouteState::Exhausted);
        assert_eq!(route.current_waypoint(), None);
        assert_eq!(route.full_route_string(), "ALPHA.V1.CHRLY..DELTA");
    }

    #[test]
    fn test_skip_to_unknown_waypoint_changes_nothing() {
        let mut route = Route::new("ALPHA.V1.DELTA", nav()).unwrap();
        assert!(!route.skip_to_waypoint_name("ECHO"));
        assert_eq!(route.state(), RouteState::Pending);

        assert!(route.skip_to_waypoint_name("CHRLY"));
        assert_eq!(route.waypoint_names(), vec!["CHRLY", "DELTA"]);
        assert_eq!(route.route_string(), "ALPHA.V1.DELTA");
    }

    #[test]
    fn test_hold_at_waypoint() {
        let mut route = Route::new("ALPHA.V1.DELTA", nav()).unwrap();
        let clearance = HoldClearance {
            speed_maximum: Some(200),
            ..HoldClearance::default()
        };

        assert!(!route.cancel_hold_for_waypoint_name("CHRLY"));
        assert!(route.activate_hold_for_waypoint_name("CHRLY", &clearance));
        assert!(!route.activate_hold_for_waypoint_name("ECHO", &clearance));
        assert!(route.waypoints()[2].is_hold());
        assert_eq!(route.waypoints()[2].speed_maximum(), Some(200));

        assert!(route.cancel_hold_for_waypoint_name("CHRLY"));
        assert!(!route.waypoints()[2].is_hold());
        assert_eq!(route.waypoints()[2].speed_maximum(), None);
    }

    #[test]
    fn test_heading_and_distance() {
        let route = Route::new("ALPHA..#090..DELTA", nav()).unwrap();
        let heading = route.initial_heading().unwrap();
        assert!(heading > 30 && heading < 90);
        assert!(route.distance_nm() > 10.0);
        assert_eq!(route.top_altitude(), None);
    }
}
