use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::nav::{FixLookup, FixToken};
use crate::utils::navigation::{distance_nm, heading_from_to, normalize_heading, TurnDirection};

use super::restriction::{parse_restrictions, RestrictionKind};

pub const FLY_OVER_PREFIX: char = '^';
pub const HOLD_PREFIX: char = '@';
pub const VECTOR_PREFIX: char = '#';

/// Length of the outbound leg of a holding pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HoldLegLength {
    Minutes(f64),
    NauticalMiles(f64),
}

impl Default for HoldLegLength {
    fn default() -> Self {
        HoldLegLength::Minutes(1.0)
    }
}

impl std::str::FromStr for HoldLegLength {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (value, ctor): (&str, fn(f64) -> HoldLegLength) = if let Some(v) = s.strip_suffix("min") {
            (v, HoldLegLength::Minutes)
        } else if let Some(v) = s.strip_suffix("nm") {
            (v, HoldLegLength::NauticalMiles)
        } else {
            return Err(RouteError::Format(format!("unknown hold leg length `{}`", s)));
        };

        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| *v > 0.0)
            .map(ctor)
            .ok_or_else(|| RouteError::Format(format!("invalid hold leg length `{}`", s)))
    }
}

impl TryFrom<String> for HoldLegLength {
    type Error = RouteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HoldLegLength> for String {
    fn from(value: HoldLegLength) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HoldLegLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldLegLength::Minutes(v) => write!(f, "{}min", v),
            HoldLegLength::NauticalMiles(v) => write!(f, "{}nm", v),
        }
    }
}

/// Holding pattern parameters. Headings are in degrees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldParameters {
    pub inbound_heading: Option<f64>,
    pub leg_length: HoldLegLength,
    pub turn_direction: TurnDirection,
    pub speed_maximum: Option<u32>,
    pub timer: Option<f64>,
}

/// Fields issued with a hold clearance. Anything left `None` keeps its current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldClearance {
    pub inbound_heading: Option<f64>,
    pub leg_length: Option<HoldLegLength>,
    pub turn_direction: Option<TurnDirection>,
    pub speed_maximum: Option<u32>,
}

/// What the aircraft steers toward at this point of the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaypointTarget {
    /// A fix at `(lat, lon)`.
    Position(f64, f64),
    /// Fly a heading, in radians.
    Vector(f64),
}

/// A single navigable point of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    name: String,
    target: WaypointTarget,
    altitude_minimum: Option<u32>,
    altitude_maximum: Option<u32>,
    speed_minimum: Option<u32>,
    speed_maximum: Option<u32>,
    is_fly_over: bool,
    is_hold: bool,
    default_hold: HoldParameters,
    hold: HoldParameters,
}

impl Waypoint {
    /// Create a waypoint from a (possibly prefixed) fix name and an optional
    /// `|`-chained restriction string.
    pub fn parse<F>(name: &str, restrictions: Option<&str>, fixes: &F) -> Result<Self, RouteError>
    where
        F: FixLookup + ?Sized,
    {
        let name = name.trim();
        let mut is_fly_over = false;
        let mut is_hold = false;

        let (name, target) = if let Some(stripped) = name.strip_prefix(FLY_OVER_PREFIX) {
            is_fly_over = true;
            (stripped.to_string(), Self::resolve_position(stripped, fixes)?)
        } else if let Some(stripped) = name.strip_prefix(HOLD_PREFIX) {
            is_hold = true;
            (stripped.to_string(), Self::resolve_position(stripped, fixes)?)
        } else if let Some(heading) = name.strip_prefix(VECTOR_PREFIX) {
            (name.to_string(), WaypointTarget::Vector(Self::parse_vector_heading(heading)?))
        } else {
            (name.to_string(), Self::resolve_position(name, fixes)?)
        };

        let mut waypoint = Self {
            name,
            target,
            altitude_minimum: None,
            altitude_maximum: None,
            speed_minimum: None,
            speed_maximum: None,
            is_fly_over,
            is_hold,
            default_hold: HoldParameters::default(),
            hold: HoldParameters::default(),
        };

        if let Some(restrictions) = restrictions {
            waypoint.apply_restrictions(restrictions)?;
        }

        Ok(waypoint)
    }

    /// Create a waypoint from a procedure definition token.
    pub fn from_token<F>(token: &FixToken, fixes: &F) -> Result<Self, RouteError>
    where
        F: FixLookup + ?Sized,
    {
        Self::parse(token.name(), token.restrictions(), fixes)
    }

    fn resolve_position<F>(name: &str, fixes: &F) -> Result<WaypointTarget, RouteError>
    where
        F: FixLookup + ?Sized,
    {
        if name.is_empty() {
            return Err(RouteError::Format("waypoint name is empty".to_string()));
        }

        fixes
            .find_position_by_name(name)
            .map(|(lat, lon)| WaypointTarget::Position(lat, lon))
            .ok_or_else(|| RouteError::NotFound(format!("no position known for fix `{}`", name)))
    }

    fn parse_vector_heading(heading: &str) -> Result<f64, RouteError> {
        let valid = (1..=3).contains(&heading.len()) && heading.chars().all(|c| c.is_ascii_digit());
        let degrees: i32 = heading
            .parse()
            .ok()
            .filter(|deg| valid && *deg <= 360)
            .ok_or_else(|| RouteError::Format(format!("invalid vector heading `{}`", heading)))?;

        Ok((normalize_heading(degrees) as f64).to_radians())
    }

    fn apply_restrictions(&mut self, restrictions: &str) -> Result<(), RouteError> {
        for restriction in parse_restrictions(restrictions)? {
            let (min, max) = restriction.bounds();
            let (field_min, field_max) = match restriction.kind {
                RestrictionKind::Altitude => (&mut self.altitude_minimum, &mut self.altitude_maximum),
                RestrictionKind::Speed => (&mut self.speed_minimum, &mut self.speed_maximum),
            };

            if min.is_some() {
                *field_min = min;
            }
            if max.is_some() {
                *field_max = max;
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as written in a route, including any fly-over or hold marker.
    pub fn route_token(&self) -> String {
        if self.is_fly_over {
            format!("{}{}", FLY_OVER_PREFIX, self.name)
        } else if self.is_hold {
            format!("{}{}", HOLD_PREFIX, self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn target(&self) -> WaypointTarget {
        self.target
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        match self.target {
            WaypointTarget::Position(lat, lon) => Some((lat, lon)),
            WaypointTarget::Vector(_) => None,
        }
    }

    /// Heading to fly in radians, for vector waypoints.
    pub fn vector_heading(&self) -> Option<f64> {
        match self.target {
            WaypointTarget::Vector(heading) => Some(heading),
            WaypointTarget::Position(..) => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.target, WaypointTarget::Vector(_))
    }

    pub fn is_fly_over(&self) -> bool {
        self.is_fly_over
    }

    pub fn is_hold(&self) -> bool {
        self.is_hold
    }

    pub fn altitude_minimum(&self) -> Option<u32> {
        self.altitude_minimum
    }

    pub fn altitude_maximum(&self) -> Option<u32> {
        self.altitude_maximum
    }

    pub fn speed_minimum(&self) -> Option<u32> {
        self.speed_minimum
    }

    /// The effective speed cap: the hold speed while holding, else the restriction.
    pub fn speed_maximum(&self) -> Option<u32> {
        match self.hold.speed_maximum {
            Some(hold_speed) if self.is_hold => Some(hold_speed),
            _ => self.speed_maximum,
        }
    }

    /// The speed cap from the restriction alone, ignoring any active hold.
    pub fn restriction_speed_maximum(&self) -> Option<u32> {
        self.speed_maximum
    }

    pub fn has_altitude_restriction(&self) -> bool {
        self.altitude_minimum.is_some() || self.altitude_maximum.is_some()
    }

    pub fn has_speed_restriction(&self) -> bool {
        self.speed_minimum.is_some() || self.speed_maximum.is_some()
    }

    pub fn has_restriction(&self) -> bool {
        self.has_altitude_restriction() || self.has_speed_restriction()
    }

    pub fn hold_parameters(&self) -> &HoldParameters {
        &self.hold
    }

    pub fn default_hold_parameters(&self) -> &HoldParameters {
        &self.default_hold
    }

    /// Set the procedural hold defaults. Active parameters follow unless a hold is in progress.
    pub fn set_default_hold_parameters(&mut self, parameters: HoldParameters) {
        if !self.is_hold {
            self.hold = parameters.clone();
        }
        self.default_hold = parameters;
    }

    pub fn activate_hold(&mut self, clearance: &HoldClearance) {
        if let Some(inbound_heading) = clearance.inbound_heading {
            self.hold.inbound_heading = Some(inbound_heading);
        }
        if let Some(leg_length) = clearance.leg_length {
            self.hold.leg_length = leg_length;
        }
        if let Some(turn_direction) = clearance.turn_direction {
            self.hold.turn_direction = turn_direction;
        }
        if let Some(speed_maximum) = clearance.speed_maximum {
            self.hold.speed_maximum = Some(speed_maximum);
        }

        self.is_hold = true;
    }

    /// Attach procedural hold defaults to a freshly built waypoint. The active
    /// parameters start from them, including for an `@` fix that is already holding.
    pub(crate) fn with_default_hold_parameters(mut self, parameters: HoldParameters) -> Self {
        self.hold = parameters.clone();
        self.default_hold = parameters;
        self
    }

    /// Leave the hold and fall back to the procedural defaults.
    pub fn deactivate_hold(&mut self) {
        self.is_hold = false;
        self.hold = self.default_hold.clone();
    }

    pub fn start_hold_timer(&mut self, now: f64) {
        self.hold.timer = Some(now);
    }

    pub fn reset_hold_timer(&mut self) {
        self.hold.timer = None;
    }

    /// Distance in nautical miles, if both points have a position.
    pub fn distance_to(&self, other: &Waypoint) -> Option<f64> {
        Some(distance_nm(self.position()?, other.position()?))
    }

    /// Initial true bearing to `other`, if both points have a position.
    pub fn bearing_to(&self, other: &Waypoint) -> Option<i32> {
        let (from_lat, from_lon) = self.position()?;
        let (to_lat, to_lon) = other.position()?;
        Some(heading_from_to(from_lat, from_lon, to_lat, to_lon))
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route_token())?;

        match (self.altitude_minimum, self.altitude_maximum) {
            (Some(min), Some(max)) if min == max => write!(f, " A{}", min)?,
            (Some(min), Some(max)) => write!(f, " A{}-{}", min, max)?,
            (Some(min), None) => write!(f, " A{}+", min)?,
            (None, Some(max)) => write!(f, " A{}-", max)?,
            (None, None) => {}
        }

        match (self.speed_minimum, self.speed_maximum) {
            (Some(min), Some(max)) if min == max => write!(f, " S{}", min),
            (Some(min), Some(max)) => write!(f, " S{}-{}", min, max),
            (Some(min), None) => write!(f, " S{}+", min),
            (None, Some(max)) => write!(f, " S{}-", max),
            (None, None) => Ok(()),
        }
    }
}
