use std::fs::{self, File};
use std::path::PathBuf;

use polo_stats::csv_io::{
    combined_columns, read_combined, read_events, read_lineups, read_passes, read_substitutions,
    write_combined, write_events, write_lineups, write_passes, write_substitutions,
};
use polo_stats::event::{EventRecord, EventType, Outcome, Period, Point, ShotType, Team, TurnoverType};
use polo_stats::records::{LineupRecord, PassRecord, PlayType, SubstitutionRecord};
use polo_stats::StatsError;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn parses_match_events_fixture() {
    let file = File::open(fixture_path("match_events.csv")).expect("fixture file should be readable");
    let events = read_events(file).expect("fixture should parse");
    assert_eq!(events.len(), 16);

    let first = &events[0];
    assert_eq!(first.match_id.as_deref(), Some("m1"));
    assert_eq!(first.period, Period::First);
    assert_eq!(first.team, Team::Home);
    assert_eq!(first.event_type, EventType::EvenStrength);
    assert_eq!(first.outcome, Outcome::Goal);
    assert_eq!(first.shot_type, Some(ShotType::Normal));
    assert_eq!(first.location, Some(Point::new(0.5, 0.2)));
    assert_eq!(first.goal, Some(Point::new(0.3, 0.4)));

    assert_eq!(events[1].shot_type, Some(ShotType::Skip));
    assert_eq!(events[5].turnover_type, Some(TurnoverType::BadPass));
    assert_eq!(events[5].location, None);
    assert_eq!(events[11].subevent, None);
    assert_eq!(events[15].player_in_defence, None);
}

#[test]
fn events_survive_a_write_read_cycle() {
    let raw = read_fixture("match_events.csv");
    let events = read_events(raw.as_bytes()).expect("fixture should parse");
    let mut buf = Vec::new();
    write_events(&mut buf, &events).expect("write events");
    let back = read_events(buf.as_slice()).expect("re-read events");
    assert_eq!(back, events);
}

#[test]
fn writer_refuses_unreadable_coordinates() {
    let bad = EventRecord::new("07:00", Period::First, Team::Home, EventType::EvenStrength, Outcome::Goal)
        .with_location(f64::NAN, 0.5);
    let mut buf = Vec::new();
    let err = write_events(&mut buf, &[bad]).expect_err("NaN location");
    assert!(matches!(err, StatsError::InvalidRecord { reason } if reason.starts_with("row 1:")));

    let raw = "time,period,team,event_type,outcome,location_x,location_y\n07:00,1st,Home,6v6,Goal,inf,0.5\n";
    assert!(matches!(
        read_events(raw.as_bytes()),
        Err(StatsError::InvalidRecord { .. })
    ));
}

#[test]
fn missing_required_columns_are_all_reported() {
    let raw = "time,team,subevent\n07:00,Home,Centre\n";
    let err = read_events(raw.as_bytes()).expect_err("schema mismatch");
    match err {
        StatsError::Schema { missing } => {
            assert_eq!(missing, vec!["period", "event_type", "outcome"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_optional_columns_read_as_null() {
    let raw = "time,period,team,event_type,outcome\n07:00,1st,Away,6v5,Save\n";
    let events = read_events(raw.as_bytes()).expect("minimal columns");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].subevent, None);
    assert_eq!(events[0].player_in_attack, None);
    assert_eq!(events[0].location, None);
}

#[test]
fn bad_enum_value_names_row_and_column() {
    let raw = "time,period,team,event_type,outcome\n07:00,1st,Home,6v6,Goal\n06:00,5th,Home,6v6,Goal\n";
    let err = read_events(raw.as_bytes()).expect_err("bad period");
    match err {
        StatsError::InvalidValue { row, column, value } => {
            assert_eq!(row, 2);
            assert_eq!(column, "period");
            assert_eq!(value, "5th");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn half_a_coordinate_pair_is_rejected() {
    let raw = "time,period,team,event_type,outcome,location_x,location_y\n07:00,1st,Home,6v6,Goal,0.4,\n";
    assert!(matches!(
        read_events(raw.as_bytes()),
        Err(StatsError::InvalidRecord { .. })
    ));
}

#[test]
fn shot_type_on_a_turnover_is_rejected() {
    let raw = "time,period,team,event_type,outcome,shot_type\n07:00,1st,Home,6v6,Turnover,Lob\n";
    assert!(matches!(
        read_events(raw.as_bytes()),
        Err(StatsError::InvalidRecord { .. })
    ));
}

#[test]
fn reads_dashboard_export_headers() {
    let raw = read_fixture("legacy_export.csv");
    let events = read_events(raw.as_bytes()).expect("legacy headers");
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].player_in_attack.as_deref(), Some("W3"));
    assert_eq!(events[0].player_in_defence.as_deref(), Some("B1"));
    assert_eq!(events[0].shot_type, Some(ShotType::Skip));
    assert_eq!(events[1].event_type, EventType::PowerPlay);
    assert_eq!(events[1].goal, Some(Point::new(0.5, 0.5)));
    assert_eq!(events[2].shot_type, None);
    assert_eq!(events[2].location, None);
}

#[test]
fn combined_export_routes_rows_by_type() {
    let raw = read_fixture("session_export.csv");
    let log = read_combined(raw.as_bytes()).expect("combined export");
    let snap = log.snapshot();
    // The repeated event row is dropped.
    assert_eq!(snap.events().len(), 1);
    assert_eq!(snap.passes().len(), 2);
    assert_eq!(snap.lineups().len(), 1);
    assert_eq!(snap.substitutions().len(), 1);

    let lineup = &snap.lineups()[0];
    assert_eq!(lineup.goalkeeper, "W1");
    assert_eq!(lineup.centre, "W8");
    assert_eq!(snap.passes()[1].from_player.as_deref(), Some("W3"));
    assert_eq!(snap.substitutions()[0].player_on.as_deref(), Some("W11"));
}

#[test]
fn combined_write_uses_union_of_columns() {
    let raw = read_fixture("session_export.csv");
    let log = read_combined(raw.as_bytes()).expect("combined export");
    let mut buf = Vec::new();
    write_combined(&mut buf, &log.snapshot()).expect("write combined");
    let text = String::from_utf8(buf).expect("utf8");
    let header = text.lines().next().expect("header row");
    assert_eq!(header, combined_columns().join(","));
    assert_eq!(text.lines().count(), 1 + 5);

    let back = read_combined(text.as_bytes()).expect("re-read combined");
    let (a, b) = (log.snapshot(), back.snapshot());
    assert_eq!(a.events(), b.events());
    assert_eq!(a.passes(), b.passes());
    assert_eq!(a.lineups(), b.lineups());
    assert_eq!(a.substitutions(), b.substitutions());
}

#[test]
fn per_kind_tables_round_trip() {
    let mut pass = PassRecord::new(3, PlayType::PowerPlay, Point::new(350.0, 400.0), Point::new(125.5, 270.25));
    pass.to_player = Some("W6".to_string());
    let lineup = LineupRecord {
        match_id: Some("m3".to_string()),
        team: Team::Away,
        positions: ["B2", "B3", "B4", "B5", "B6", "B7"].map(String::from),
        centre: "B8".to_string(),
        goalkeeper: "B1".to_string(),
    };
    let sub = SubstitutionRecord {
        time: "02:30".to_string(),
        match_id: None,
        team: Team::Away,
        player_off: "B4".to_string(),
        player_on: None,
    };

    let mut buf = Vec::new();
    write_passes(&mut buf, std::slice::from_ref(&pass)).expect("write passes");
    assert_eq!(read_passes(buf.as_slice()).expect("read passes"), vec![pass]);

    let mut buf = Vec::new();
    write_lineups(&mut buf, std::slice::from_ref(&lineup)).expect("write lineups");
    assert_eq!(read_lineups(buf.as_slice()).expect("read lineups"), vec![lineup]);

    let mut buf = Vec::new();
    write_substitutions(&mut buf, std::slice::from_ref(&sub)).expect("write subs");
    assert_eq!(read_substitutions(buf.as_slice()).expect("read subs"), vec![sub]);
}

#[test]
fn lineup_with_repeated_player_is_rejected() {
    let raw = "team,position_1,position_2,position_3,position_4,position_5,position_6,centre,goalkeeper\n\
               Home,W2,W3,W4,W5,W6,W2,W8,W1\n";
    assert!(matches!(
        read_lineups(raw.as_bytes()),
        Err(StatsError::InvalidRecord { .. })
    ));
}
