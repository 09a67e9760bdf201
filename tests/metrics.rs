use std::fs::File;
use std::path::PathBuf;

use polo_stats::csv_io::read_events;
use polo_stats::report_export::export_match_report;
use polo_stats::event::{EventFilter, EventRecord, EventType, Outcome, Period, ShotType, Team};
use polo_stats::metrics::{
    power_play_conversion, save_percentage, save_table, scoreboard, shot_type_breakdown,
    success_rate, success_rates, success_rates_for, RateCategory, RateDimension,
};

fn fixture_events() -> Vec<EventRecord> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("match_events.csv");
    let file = File::open(path).expect("fixture file should be readable");
    read_events(file).expect("fixture should parse")
}

fn ev(team: Team, event_type: EventType, outcome: Outcome) -> EventRecord {
    EventRecord::new("05:00", Period::First, team, event_type, outcome)
}

#[test]
fn power_play_rate_credits_exclusions_at_conversion() {
    let events = vec![
        ev(Team::Home, EventType::PowerPlay, Outcome::Goal),
        ev(Team::Home, EventType::PowerPlay, Outcome::Miss),
        ev(Team::Home, EventType::PowerPlay, Outcome::Exclusion),
    ];
    let m = success_rate(&events, Team::Home, &RateCategory::EventType(EventType::PowerPlay));
    assert_eq!(m.attempts, 3);
    assert_eq!(m.goals, 1);
    assert_eq!(m.exclusions_drawn, 1);
    assert!((m.power_play_conversion - 1.0 / 3.0).abs() < 1e-12);
    assert!((m.rate - 44.444_444).abs() < 1e-3);
}

#[test]
fn no_attempts_is_zero() {
    let events = vec![ev(Team::Away, EventType::EvenStrength, Outcome::Goal)];
    let m = success_rate(&events, Team::Home, &RateCategory::EventType(EventType::Counter));
    assert_eq!(m.attempts, 0);
    assert_eq!(m.rate, 0.0);
    assert_eq!(power_play_conversion(&[], Team::Home), 0.0);
}

#[test]
fn fixture_rates_by_event_type() {
    let events = fixture_events();
    let rates = success_rates(&events, RateDimension::EventType);
    let find = |team: Team, t: EventType| {
        rates
            .iter()
            .find(|m| m.team == team && m.category == RateCategory::EventType(t))
            .expect("category present")
    };

    let home_even = find(Team::Home, EventType::EvenStrength);
    assert_eq!(home_even.attempts, 6);
    assert_eq!(home_even.goals, 2);
    assert_eq!(home_even.exclusions_drawn, 1);
    assert!((home_even.rate - 50.0).abs() < 1e-9);

    let away_even = find(Team::Away, EventType::EvenStrength);
    assert_eq!(away_even.attempts, 5);
    assert_eq!(away_even.rate, 0.0);

    assert!((find(Team::Away, EventType::Penalty).rate - 100.0).abs() < 1e-9);
    assert!(rates.iter().all(|m| (0.0..=100.0).contains(&m.rate)));
    assert!(rates.iter().all(|m| m.attempts > 0));
}

#[test]
fn phase_filter_keeps_power_play_conversion() {
    let events = vec![
        ev(Team::Home, EventType::PowerPlay, Outcome::Goal),
        ev(Team::Home, EventType::PowerPlay, Outcome::Miss),
        ev(Team::Home, EventType::EvenStrength, Outcome::Exclusion),
        ev(Team::Home, EventType::EvenStrength, Outcome::Miss),
    ];
    let unfiltered = success_rates(&events, RateDimension::EventType);
    let even = unfiltered
        .iter()
        .find(|m| m.category == RateCategory::EventType(EventType::EvenStrength))
        .expect("6v6 row");
    assert!((even.rate - 25.0).abs() < 1e-9);

    let phase = EventFilter::all().event_type(EventType::EvenStrength);
    let filtered = success_rates_for(&events, RateDimension::EventType, &phase);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].category, RateCategory::EventType(EventType::EvenStrength));
    assert!((filtered[0].power_play_conversion - 0.5).abs() < 1e-12);
    assert!((filtered[0].rate - 25.0).abs() < 1e-9);
}

#[test]
fn report_sheets_follow_the_filter() {
    let events = fixture_events();
    let phase = EventFilter::all().event_type(EventType::PowerPlay);
    let mut path = std::env::temp_dir();
    path.push(format!("polo_stats_report_{}.xlsx", std::process::id()));

    let report = export_match_report(&path, &events, &phase).expect("write workbook");
    assert_eq!(report.events, 2);
    assert_eq!(report.rate_rows, 4);
    assert!(path.exists());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn period_filter_scopes_the_conversion() {
    let mut events = vec![
        ev(Team::Home, EventType::EvenStrength, Outcome::Exclusion),
        ev(Team::Home, EventType::EvenStrength, Outcome::Miss),
    ];
    let mut late = ev(Team::Home, EventType::PowerPlay, Outcome::Goal);
    late.period = Period::Second;
    events.push(late);

    let first = EventFilter::all().period(Period::First);
    let rates = success_rates_for(&events, RateDimension::EventType, &first);
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].power_play_conversion, 0.0);
    assert_eq!(rates[0].rate, 0.0);
}

#[test]
fn subevent_rates_skip_rows_without_subevent() {
    let events = fixture_events();
    let rates = success_rates(&events, RateDimension::Subevent);
    assert!(rates.iter().all(|m| matches!(m.category, RateCategory::Subevent(_))));
    let centre = rates
        .iter()
        .find(|m| m.team == Team::Home && m.category.label() == "Centre")
        .expect("centre present");
    assert_eq!(centre.attempts, 3);
    assert_eq!(centre.goals, 2);
    let attempts: usize = rates.iter().map(|m| m.attempts).sum();
    assert_eq!(attempts, 15);
}

#[test]
fn save_percentage_per_goalkeeper() {
    let events = fixture_events();
    let w1 = save_percentage(&events, Team::Away, None, "W1").expect("W1 faced shots");
    assert!((w1 - 40.0).abs() < 1e-9);
    let b1 = save_percentage(&events, Team::Home, None, "B1").expect("B1 faced shots");
    assert!((b1 - 20.0).abs() < 1e-9);
    let w1_drive = save_percentage(&events, Team::Away, Some("Drive"), "W1").expect("one shot");
    assert!((w1_drive - 100.0).abs() < 1e-9);
    assert_eq!(save_percentage(&events, Team::Home, None, "W1"), None);
}

#[test]
fn save_table_rows_have_faced_shots() {
    let events = fixture_events();
    let rows = save_table(&events);
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.shots_faced > 0 && r.saves <= r.shots_faced));
    let faced: usize = rows
        .iter()
        .filter(|r| r.goalkeeper == "W1")
        .map(|r| r.shots_faced)
        .sum();
    assert_eq!(faced, 5);
}

#[test]
fn shot_types_split_shots_and_goals() {
    let events = fixture_events();
    let rows = shot_type_breakdown(&events);
    let get = |team: Team, shot: ShotType| {
        rows.iter()
            .find(|r| r.team == team && r.shot_type == shot)
            .map(|r| (r.shots, r.goals))
    };
    assert_eq!(get(Team::Home, ShotType::Lob), Some((2, 2)));
    assert_eq!(get(Team::Home, ShotType::Normal), Some((2, 1)));
    assert_eq!(get(Team::Away, ShotType::Normal), Some((4, 2)));
    assert_eq!(get(Team::Away, ShotType::Skip), Some((1, 0)));
    assert_eq!(get(Team::Away, ShotType::Lob), None);
}

#[test]
fn scoreboard_counts_goals_and_last_clock() {
    let events = fixture_events();
    let board = scoreboard(&events);
    assert_eq!(board.home, 4);
    assert_eq!(board.away, 2);
    assert_eq!(board.latest_time.as_deref(), Some("00:40"));
    assert_eq!(board.current_period, Some(Period::Second));
    assert_eq!(scoreboard(&[]).latest_time, None);
}
