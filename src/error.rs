use thiserror::Error;

/// Errors raised while building a route, leg or waypoint.
///
/// These abort construction entirely; callers never receive a half-built value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid format: {0}")]
    Format(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid leg: {0}")]
    InvalidLeg(String),

    #[error("expected route to contain at least 2 waypoints, but only found {0}")]
    TooFewWaypoints(usize),
}

/// Reasons a runtime route command is rejected.
///
/// These are normal outcomes of a clearance the aircraft cannot accept, so they
/// are returned as values and their `Display` output is meant for the readback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmendmentError {
    #[error("routes do not have continuity")]
    NoContinuity,

    #[error("amended route would fly back through {0}")]
    Backtrack(String),

    #[error("unable to parse route: {0}")]
    InvalidRoute(#[from] RouteError),

    #[error("{0} is not a valid {1} procedure route")]
    WrongProcedureKind(String, &'static str),
}
