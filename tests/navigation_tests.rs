use anyhow::Result;
use route_engine::nav::{AirwayLookup, FixLookup, NavigationData, ProcedureKind, ProcedureLookup};
use route_engine::utils::navigation::TurnDirection;

#[test]
fn test_load_fixes() -> Result<()> {
    let nav = NavigationData::load("data/airports/klas.json")?;

    println!("Loaded {} fixes", nav.fixes().len());

    assert!(nav.find_position_by_name("BOACH").is_some(), "BOACH should exist");
    assert!(nav.find_position_by_name("KLAS07R").is_some(), "runway thresholds are fixes");

    if let Some((lat, lon)) = nav.find_position_by_name("TNP") {
        println!("TNP at {}, {}", lat, lon);
        assert!((lat - 34.112).abs() < 0.001);
        assert!((lon - (-115.7698)).abs() < 0.001);
    }

    Ok(())
}

#[test]
fn test_load_directory() -> Result<()> {
    let nav = NavigationData::load_dir("data/airports")?;

    assert!(nav.runway("KLAS", "25L").is_some());
    assert_eq!(
        nav.procedure_names(ProcedureKind::Star),
        vec!["GRNPA1", "KEPEC3", "TYSSN4"]
    );
    assert_eq!(nav.procedure_names(ProcedureKind::Sid), vec!["BOACH6", "SHEAD1"]);

    Ok(())
}

#[test]
fn test_airways() -> Result<()> {
    let nav = NavigationData::load("data/airports/klas.json")?;

    let j92 = nav.find_airway("J92").expect("J92 should exist");
    let waypoints = j92.resolve("MLF", "TNP", &nav).expect("MLF to TNP is on J92");
    let names: Vec<&str> = waypoints.iter().map(|wp| wp.name()).collect();
    assert_eq!(names, vec!["MLF", "OAL", "BTY", "TNP"]);

    assert!(j92.resolve("TNP", "DAG", &nav).is_none());
    assert!(nav.find_airway("Q99").is_none());

    Ok(())
}

#[test]
fn test_procedures() -> Result<()> {
    let nav = NavigationData::load("data/airports/klas.json")?;

    let boach = nav
        .find_procedure("BOACH6", ProcedureKind::Sid)
        .expect("BOACH6 should exist");
    assert_eq!(boach.icao(), "KLAS");
    assert_eq!(boach.entry_names(), vec!["KLAS01L", "KLAS07R", "KLAS19R", "KLAS25L"]);
    assert_eq!(boach.exit_names(), vec!["HEC", "TNP"]);
    assert!(nav.find_procedure("BOACH6", ProcedureKind::Star).is_none());

    let waypoints = boach.resolve("KLAS07R", "TNP", &nav)?;
    assert_eq!(waypoints.len(), 8);
    assert!(waypoints[2].is_fly_over());
    assert_eq!(waypoints[2].name(), "WASTE");
    assert_eq!(waypoints[2].speed_maximum(), Some(250));

    let names = boach.all_fix_names_in_use();
    println!("BOACH6 uses {:?}", names);
    assert!(names.contains("HEC"));
    assert!(names.contains("WASTE"));
    assert!(!names.contains("TNP*"));

    Ok(())
}

#[test]
fn test_procedure_holds() -> Result<()> {
    let nav = NavigationData::load("data/airports/klas.json")?;
    let kepec = nav
        .find_procedure("KEPEC3", ProcedureKind::Star)
        .expect("KEPEC3 should exist");

    let waypoints = kepec.resolve("DAG", "KLAS01L", &nav)?;
    let hold_fix = waypoints
        .iter()
        .find(|wp| wp.name() == "KEPEC")
        .expect("KEPEC is on the arrival");

    let hold = hold_fix.default_hold_parameters();
    assert_eq!(hold.inbound_heading, Some(35.0));
    assert_eq!(hold.turn_direction, TurnDirection::Right);
    assert_eq!(hold.speed_maximum, Some(230));
    assert_eq!(hold.leg_length.to_string(), "4nm");
    assert!(!hold_fix.is_hold());

    Ok(())
}

#[test]
fn test_random_exit() -> Result<()> {
    let nav = NavigationData::load("data/airports/klas.json")?;
    let shead = nav
        .find_procedure("SHEAD1", ProcedureKind::Sid)
        .expect("SHEAD1 should exist");

    for _ in 0..20 {
        let exit = shead
            .random_resolvable_exit("KLAS19R", &nav)
            .expect("every SHEAD1 exit resolves");
        assert!(shead.has_exit(&exit));
    }
    assert!(shead.random_resolvable_exit("KLAS01L", &nav).is_none());

    Ok(())
}
