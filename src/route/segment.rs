//! Route string grammar.
//!
//! Legs are separated by `..` and the tokens of an airway or procedure leg by
//! `.`, so `KLAS07R.BOACH6.TNP..OAL..MLF` is a SID followed by two direct legs.

use crate::error::RouteError;

pub const DIRECT_SEGMENT_DIVIDER: &str = "..";
pub const PROCEDURE_SEGMENT_DIVIDER: char = '.';

/// Reject strings that can never describe a route.
pub fn validate_route_string(route: &str) -> Result<(), RouteError> {
    if route.is_empty() {
        return Err(RouteError::Format("route string is empty".to_string()));
    }

    if route.chars().any(char::is_whitespace) {
        return Err(RouteError::Format(format!(
            "route string `{}` must not contain whitespace",
            route
        )));
    }

    let has_empty_token = route
        .split(DIRECT_SEGMENT_DIVIDER)
        .flat_map(|segment| segment.split(PROCEDURE_SEGMENT_DIVIDER))
        .any(str::is_empty);
    if has_empty_token {
        return Err(RouteError::Format(format!(
            "route string `{}` contains an empty segment",
            route
        )));
    }

    Ok(())
}

/// Split a route string into one string per leg.
///
/// A chained run such as `A.B.C.D.E` becomes overlapping three-token legs
/// `A.B.C` and `C.D.E`. Runs of any other even length are passed through
/// untouched and rejected when the leg is built.
pub fn divide_route_string(route: &str) -> Vec<String> {
    let mut segments = Vec::new();

    for direct_segment in route.split(DIRECT_SEGMENT_DIVIDER) {
        let tokens: Vec<&str> = direct_segment.split(PROCEDURE_SEGMENT_DIVIDER).collect();

        if tokens.len() <= 3 || tokens.len() % 2 == 0 {
            segments.push(direct_segment.to_string());
            continue;
        }

        for start in (0..tokens.len() - 2).step_by(2) {
            segments.push(tokens[start..start + 3].join("."));
        }
    }

    segments
}

/// Join leg strings back into one route string, fusing legs that share a
/// boundary fix.
pub fn combine_route_strings<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut route = String::new();
    let mut last_token: Option<String> = None;

    for segment in segments {
        let segment = segment.as_ref();
        let mut tokens = segment.split(PROCEDURE_SEGMENT_DIVIDER);
        let first = tokens.next().unwrap_or_default();
        let rest: Vec<&str> = tokens.collect();

        match last_token.as_deref() {
            None => route.push_str(segment),
            Some(last) if last == first => {
                for token in &rest {
                    route.push(PROCEDURE_SEGMENT_DIVIDER);
                    route.push_str(token);
                }
            }
            Some(_) => {
                route.push_str(DIRECT_SEGMENT_DIVIDER);
                route.push_str(segment);
            }
        }

        last_token = Some(rest.last().copied().unwrap_or(first).to_string());
    }

    route
}

/// Display form with both dividers replaced by a space.
pub fn with_spaces(route: &str) -> String {
    route
        .replace(DIRECT_SEGMENT_DIVIDER, " ")
        .replace(PROCEDURE_SEGMENT_DIVIDER, " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_mixed_route() {
        let segments = divide_route_string("KLAS07R.BOACH6.TNP..OAL..MLF..PGS.TYSSN4.KLAS07R");
        assert_eq!(
            segments,
            vec!["KLAS07R.BOACH6.TNP", "OAL", "MLF", "PGS.TYSSN4.KLAS07R"]
        );
    }

    #[test]
    fn test_divide_chained_procedures() {
        let segments = divide_route_string("KLAS07R.BOACH6.TNP.J92.OAL");
        assert_eq!(segments, vec!["KLAS07R.BOACH6.TNP", "TNP.J92.OAL"]);

        let segments = divide_route_string("A.B.C.D.E.F.G");
        assert_eq!(segments, vec!["A.B.C", "C.D.E", "E.F.G"]);

        // even-length runs are left for the leg parser to reject
        assert_eq!(divide_route_string("A.B.C.D"), vec!["A.B.C.D"]);
    }

    #[test]
    fn test_chained_split_round_trips() {
        for route in ["A.B.C", "A.B.C.D.E", "A.B.C.D.E.F.G..H..I.J.K"] {
            assert_eq!(combine_route_strings(divide_route_string(route)), route);
        }
    }

    #[test]
    fn test_combine_fuses_shared_fix() {
        let combined = combine_route_strings(["KLAS07R.BOACH6.TNP", "TNP", "OAL"]);
        assert_eq!(combined, "KLAS07R.BOACH6.TNP..OAL");

        let combined = combine_route_strings(["OAL", "MLF"]);
        assert_eq!(combined, "OAL..MLF");

        assert_eq!(combine_route_strings(Vec::<String>::new()), "");
    }

    #[test]
    fn test_with_spaces() {
        assert_eq!(with_spaces("DAG..HOLDM..PRINO"), "DAG HOLDM PRINO");
        assert_eq!(with_spaces("KLAS07R.BOACH6.TNP..OAL"), "KLAS07R BOACH6 TNP OAL");
    }

    #[test]
    fn test_validate_route_string() {
        assert!(validate_route_string("KLAS07R.BOACH6.TNP..OAL").is_ok());
        for route in ["", "OAL MLF", "OAL...MLF", "OAL....MLF", "OAL.", ".OAL", "OAL..", "A..B.", "\tOAL"] {
            assert!(
                matches!(validate_route_string(route), Err(RouteError::Format(_))),
                "`{}` should be rejected",
                route
            );
        }
    }
}
