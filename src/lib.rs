pub mod config;
pub mod error;
pub mod nav;
pub mod route;
pub mod utils;

pub use error::{AmendmentError, RouteError};
pub use nav::{NavData, NavigationData};
pub use route::{Leg, LegKind, Readback, Route, RouteState, Waypoint};
