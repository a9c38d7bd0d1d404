//! Altitude and speed restriction tokens.
//!
//! A token is a kind prefix (`A` altitude, `S` speed), one to three digits and an
//! optional bound suffix:
//!
//! - `A100`  at 10,000ft
//! - `A80+`  at or above 8,000ft
//! - `S250-` at or below 250kt
//!
//! Several tokens may be chained with `|`, e.g. `A80+|S250-`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::RouteError;

pub const RESTRICTION_SEPARATOR: char = '|';

/// Altitude values are written in hundreds of feet.
const ALTITUDE_SCALE: u32 = 100;
const SPEED_MINIMUM: u32 = 100;
const SPEED_MAXIMUM: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionKind {
    Altitude,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Exact,
    AtOrAbove,
    AtOrBelow,
}

/// A single parsed restriction. Altitudes are in feet, speeds in knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restriction {
    pub kind: RestrictionKind,
    pub value: u32,
    pub bound: BoundKind,
}

impl Restriction {
    /// The `(minimum, maximum)` pair implied by this restriction.
    pub fn bounds(&self) -> (Option<u32>, Option<u32>) {
        match self.bound {
            BoundKind::Exact => (Some(self.value), Some(self.value)),
            BoundKind::AtOrAbove => (Some(self.value), None),
            BoundKind::AtOrBelow => (None, Some(self.value)),
        }
    }
}

fn restriction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([AS])(\d{1,3})([+-]?)$").expect("restriction pattern should compile")
    })
}

/// Parse one restriction token such as `A80+` or `S250`.
pub fn parse_restriction(token: &str) -> Result<Restriction, RouteError> {
    let captures = restriction_pattern()
        .captures(token)
        .ok_or_else(|| RouteError::Format(format!("unable to parse restriction `{}`", token)))?;

    let raw: u32 = captures[2]
        .parse()
        .map_err(|_| RouteError::Format(format!("restriction `{}` has no numeric value", token)))?;

    let bound = match &captures[3] {
        "+" => BoundKind::AtOrAbove,
        "-" => BoundKind::AtOrBelow,
        _ => BoundKind::Exact,
    };

    let (kind, value) = match &captures[1] {
        "A" => (RestrictionKind::Altitude, raw * ALTITUDE_SCALE),
        _ => {
            if !(SPEED_MINIMUM..=SPEED_MAXIMUM).contains(&raw) {
                return Err(RouteError::Format(format!(
                    "speed restriction `{}` is outside {}-{}kt",
                    token, SPEED_MINIMUM, SPEED_MAXIMUM
                )));
            }
            (RestrictionKind::Speed, raw)
        }
    };

    Ok(Restriction { kind, value, bound })
}

/// Parse a `|`-chained restriction string. The first bad token fails the whole string.
pub fn parse_restrictions(compound: &str) -> Result<Vec<Restriction>, RouteError> {
    compound
        .split(RESTRICTION_SEPARATOR)
        .map(parse_restriction)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_altitude_bounds() {
        let above = parse_restriction("A80+").unwrap();
        assert_eq!(above.kind, RestrictionKind::Altitude);
        assert_eq!(above.bounds(), (Some(8000), None));

        let below = parse_restriction("A120-").unwrap();
        assert_eq!(below.bounds(), (None, Some(12000)));

        let exact = parse_restriction("A050").unwrap();
        assert_eq!(exact.bound, BoundKind::Exact);
        assert_eq!(exact.bounds(), (Some(5000), Some(5000)));
    }

    #[test]
    fn test_parse_speed_is_not_scaled() {
        let speed = parse_restriction("S250-").unwrap();
        assert_eq!(speed.kind, RestrictionKind::Speed);
        assert_eq!(speed.bounds(), (None, Some(250)));

        let exact = parse_restriction("S210").unwrap();
        assert_eq!(exact.bounds(), (Some(210), Some(210)));
    }

    #[test]
    fn test_bounds_for_every_suffix() {
        for (suffix, expect_min, expect_max) in [("+", true, false), ("-", false, true), ("", true, true)] {
            for value in [0u32, 45, 999] {
                let token = format!("A{}{}", value, suffix);
                let (min, max) = parse_restriction(&token).unwrap().bounds();
                assert_eq!(min.is_some(), expect_min, "{}", token);
                assert_eq!(max.is_some(), expect_max, "{}", token);
                assert!(min.or(max) == Some(value * 100), "{}", token);
            }
        }
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for token in ["", "X100", "A", "A1000", "Aabc", "A10++", "a100", "S99", "S1000", "100"] {
            assert!(
                matches!(parse_restriction(token), Err(RouteError::Format(_))),
                "`{}` should not parse",
                token
            );
        }
    }

    #[test]
    fn test_parse_compound() {
        let parsed = parse_restrictions("A80+|S250-").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].kind, RestrictionKind::Altitude);
        assert_eq!(parsed[1].kind, RestrictionKind::Speed);

        assert!(parse_restrictions("A80+|Q250").is_err());
        assert!(parse_restrictions("A80+|").is_err());
    }
}
