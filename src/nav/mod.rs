//! Read-only navigation data consumed by the route engine.
//!
//! The route engine only ever talks to the lookup traits below. `NavigationData`
//! is the in-memory implementation loaded from airport JSON files.

mod airway;
mod database;
mod procedure;
mod runway;

use std::fmt::Debug;
use std::sync::Arc;

pub use airway::Airway;
pub use database::{AirportFile, FixDatabase, NavigationData, RunwayDefinition};
pub use procedure::{FixToken, Procedure, ProcedureDefinition, ProcedureKind};
pub use runway::Runway;

pub trait FixLookup {
    /// `(lat, lon)` of a named fix.
    fn find_position_by_name(&self, name: &str) -> Option<(f64, f64)>;
}

pub trait ProcedureLookup {
    fn find_procedure(&self, name: &str, kind: ProcedureKind) -> Option<Arc<Procedure>>;
}

pub trait AirwayLookup {
    fn find_airway(&self, name: &str) -> Option<Arc<Airway>>;
}

/// Everything a route needs to expand and re-resolve its legs.
pub trait NavData: FixLookup + ProcedureLookup + AirwayLookup + Debug {}

impl<T> NavData for T where T: FixLookup + ProcedureLookup + AirwayLookup + Debug + ?Sized {}
