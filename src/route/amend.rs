//! Splicing one route into another.
//!
//! An amendment route is classified by where its first and last waypoints
//! appear in the pending part of the current route:
//!
//! - both, first before last: the span between them is overwritten
//! - only the last: the amendment is prepended
//! - only the first: everything after it is replaced by the amendment
//!
//! Legs are cut at the crossing waypoints rather than dropped, so an airway or
//! procedure that is entered or left part way through is kept where possible.

use std::sync::Arc;

use tracing::debug;

use crate::error::AmendmentError;
use crate::nav::ProcedureKind;

use super::{Leg, Route, ViewPosition, Waypoint};

/// What the aircraft reads back after accepting a route change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readback {
    pub log: String,
    pub say: String,
}

impl Readback {
    fn rerouting(route: &Route) -> Self {
        Self {
            log: format!("rerouting to: {}", route.route_string_with_spaces()),
            say: "rerouting as requested".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Splice {
    Overwrite {
        diverge: ViewPosition,
        converge: ViewPosition,
    },
    Prepend {
        converge: ViewPosition,
    },
    Append {
        diverge: ViewPosition,
    },
}

impl Route {
    /// Parse `route_string` against this route's navigation data and splice it in.
    pub fn amend(&mut self, route_string: &str) -> Result<Readback, AmendmentError> {
        let other = Route::new(route_string, Arc::clone(&self.nav))?;
        self.absorb(other)
    }

    /// Splice `other` into this route. On error the route is left untouched.
    pub fn absorb(&mut self, other: Route) -> Result<Readback, AmendmentError> {
        let splice = self.classify(&other)?;
        let readback = Readback::rerouting(&other);
        let mut consumed = self.consumed_legs.clone();

        let legs = match splice {
            Splice::Overwrite { diverge, converge } => {
                let head = join_legs(self.head_through(diverge), other.legs);
                let mut legs = join_legs(head, self.tail_from(converge));
                self.replay_progress(diverge, &mut legs, &mut consumed);
                legs
            }
            Splice::Append { diverge } => {
                let mut legs = join_legs(self.head_through(diverge), other.legs);
                self.replay_progress(diverge, &mut legs, &mut consumed);
                legs
            }
            Splice::Prepend { converge } => {
                consumed.extend(self.flown_part_of_current_leg());
                join_legs(other.legs, self.tail_from(converge))
            }
        };

        debug!("[ROUTE] {:?} amendment gives {}", splice, combine_for_log(&legs));
        self.legs = legs;
        self.consumed_legs = consumed;
        Ok(readback)
    }

    fn classify(&self, other: &Route) -> Result<Splice, AmendmentError> {
        let other_names = other.waypoint_names();
        let (Some(first), Some(last)) = (other_names.first(), other_names.last()) else {
            return Err(AmendmentError::NoContinuity);
        };

        let view = self.pending_view();
        let find_from = |start: usize, name: &str| {
            view[start..]
                .iter()
                .position(|(waypoint, _)| waypoint.name() == name)
                .map(|offset| start + offset)
        };

        let diverge = find_from(0, *first);
        let converge = find_from(diverge.unwrap_or(0), *last);

        match (diverge, converge) {
            (Some(d), Some(c)) => Ok(Splice::Overwrite {
                diverge: view[d].1,
                converge: view[c].1,
            }),
            (Some(d), None) => {
                if find_from(0, *last).is_some() {
                    return Err(AmendmentError::Backtrack(last.to_string()));
                }
                Ok(Splice::Append { diverge: view[d].1 })
            }
            (None, Some(c)) => Ok(Splice::Prepend { converge: view[c].1 }),
            (None, None) => Err(AmendmentError::NoContinuity),
        }
    }

    /// Pending legs up to and including the waypoint at `position`.
    fn head_through(&self, position: ViewPosition) -> Vec<Leg> {
        let leg = &self.legs[position.leg];
        let index = leg.consumed_waypoints().len() + position.index;

        let mut legs = self.legs[..position.leg].to_vec();
        legs.extend(leg.leading_through(index, self.nav.as_ref()));
        legs
    }

    /// Pending legs from the waypoint at `position` onward.
    fn tail_from(&self, position: ViewPosition) -> Vec<Leg> {
        let (leg_index, index) = match position.continued_by {
            Some(next) => (next, 0),
            None => (position.leg, position.index),
        };
        let leg = &self.legs[leg_index];
        let index = leg.consumed_waypoints().len() + index;

        let mut legs = leg.trailing_from(index, self.nav.as_ref());
        legs.extend(self.legs[leg_index + 1..].iter().cloned());
        legs
    }

    /// The waypoints already flown on the current leg, cut off as finished legs.
    fn flown_part_of_current_leg(&self) -> Vec<Leg> {
        let Some(leg) = self.legs.first() else {
            return Vec::new();
        };
        let Some(last_flown) = leg.consumed_waypoints().len().checked_sub(1) else {
            return Vec::new();
        };

        leg.leading_through(last_flown, self.nav.as_ref())
            .into_iter()
            .map(|mut flown| {
                flown.skip_all_waypoints_in_leg();
                flown
            })
            .collect()
    }

    /// Cutting the current leg rebuilds it without history. Fly the new legs
    /// forward to where the aircraft already is.
    fn replay_progress(&self, diverge: ViewPosition, legs: &mut Vec<Leg>, consumed: &mut Vec<Leg>) {
        if diverge.leg != 0 {
            return;
        }

        let Some(current) = self
            .legs
            .first()
            .filter(|leg| leg.has_history())
            .and_then(Leg::current_waypoint)
            .map(Waypoint::name)
        else {
            return;
        };

        let Some(position) = legs.iter().position(|leg| leg.has_waypoint_name(current)) else {
            return;
        };

        for mut leg in legs.drain(..position) {
            leg.skip_all_waypoints_in_leg();
            consumed.push(leg);
        }
        if let Some(leg) = legs.first_mut() {
            leg.skip_to_waypoint_name(current);
        }
    }

    pub fn replace_arrival_procedure(&mut self, route_string: &str) -> Result<Readback, AmendmentError> {
        self.replace_procedure(route_string, ProcedureKind::Star)
    }

    pub fn replace_departure_procedure(&mut self, route_string: &str) -> Result<Readback, AmendmentError> {
        self.replace_procedure(route_string, ProcedureKind::Sid)
    }

    fn replace_procedure(&mut self, route_string: &str, kind: ProcedureKind) -> Result<Readback, AmendmentError> {
        let other = Route::new(route_string, Arc::clone(&self.nav))?;
        let is_kind = |leg: &Leg| leg.procedure().map_or(false, |p| p.kind() == kind);

        let mut new_leg = match other.legs.as_slice() {
            [leg] if is_kind(leg) => leg.clone(),
            _ => {
                return Err(AmendmentError::WrongProcedureKind(
                    route_string.to_uppercase(),
                    kind.description(),
                ))
            }
        };

        let Some(existing) = self.legs.iter().position(|leg| is_kind(leg)) else {
            let readback = Readback::rerouting(&other);
            let legs = std::mem::take(&mut self.legs);
            self.legs = match kind {
                ProcedureKind::Sid => join_legs(vec![new_leg], legs),
                ProcedureKind::Star => join_legs(legs, vec![new_leg]),
            };
            debug!("[ROUTE] Added {} {}", kind, route_string);
            return Ok(readback);
        };

        let connecting_fix = match kind {
            ProcedureKind::Sid => new_leg.exit_name(),
            ProcedureKind::Star => new_leg.entry_name(),
        };
        if connecting_fix.map_or(false, |fix| self.has_waypoint_name(fix)) {
            return self.absorb(other);
        }

        let readback = Readback::rerouting(&other);
        let mut consumed = self.consumed_legs.clone();

        // replacing the leg being flown keeps what has been flown as history
        if existing == 0 {
            let flown_leg = &self.legs[0];
            if let Some(current) = flown_leg
                .current_waypoint()
                .filter(|_| flown_leg.has_history())
                .map(Waypoint::name)
            {
                if !new_leg.skip_to_waypoint_name(current) {
                    consumed.extend(self.flown_part_of_current_leg());
                }
            }
        }

        debug!(
            "[ROUTE] Replacing {} with {}",
            self.legs[existing].route_string(),
            new_leg.route_string()
        );
        self.legs[existing] = new_leg;
        self.consumed_legs = consumed;
        Ok(readback)
    }
}

/// Concatenate two runs of legs. When both sides of the seam name the same
/// waypoint, one direct leg repeating it is dropped, the left one first.
fn join_legs(mut head: Vec<Leg>, mut tail: Vec<Leg>) -> Vec<Leg> {
    let seam = match (head.last(), tail.first()) {
        (Some(last), Some(first)) => {
            let last_name = last.all_waypoints().last().map(Waypoint::name);
            let first_name = first.all_waypoints().next().map(Waypoint::name);
            match (last_name, first_name) {
                (Some(a), Some(b)) if a == b => Some((last.is_direct(), first.is_direct())),
                _ => None,
            }
        }
        _ => None,
    };

    match seam {
        Some((true, _)) => {
            head.pop();
        }
        Some((false, true)) => {
            tail.remove(0);
        }
        _ => {}
    }

    head.append(&mut tail);
    head
}

fn combine_for_log(legs: &[Leg]) -> String {
    super::combine_route_strings(legs.iter().map(Leg::route_string))
}
