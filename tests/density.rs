use std::fs::File;
use std::path::PathBuf;

use polo_stats::config::StatsConfig;
use polo_stats::csv_io::read_events;
use polo_stats::density::{
    density_map, kde_grid, normalize_pixel, CoordinateSource, DensityQuery, HeatmapCategory,
    GOAL_CANVAS,
};
use polo_stats::event::{EventRecord, EventType, Outcome, Period, Point, Team};
use polo_stats::StatsError;

fn fixture_events() -> Vec<EventRecord> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("match_events.csv");
    let file = File::open(path).expect("fixture file should be readable");
    read_events(file).expect("fixture should parse")
}

fn small_grid() -> StatsConfig {
    StatsConfig {
        kde_grid: 40,
        ..StatsConfig::default()
    }
}

#[test]
fn goals_scored_grid_is_well_formed() {
    let events = fixture_events();
    let query = DensityQuery::new(Team::Home, HeatmapCategory::GoalsScored);
    let grid = density_map(&events, &query, &small_grid()).expect("four usable points");
    assert_eq!(grid.points, 4);
    assert_eq!(grid.bandwidth, 0.6);
    assert_eq!(grid.x.len(), 40);
    assert_eq!(grid.z.len(), 40);
    assert!(grid.z.iter().all(|row| row.len() == 40));
    assert_eq!(grid.x[0], 0.0);
    assert_eq!(grid.x[39], 1.0);
    assert!(grid.max > 0.0);
    assert!(grid.z.iter().flatten().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn density_peaks_near_the_points() {
    let events = fixture_events();
    let query = DensityQuery::new(Team::Home, HeatmapCategory::GoalsScored);
    let grid = density_map(&events, &query, &small_grid()).expect("four usable points");
    // Shots cluster around (0.45, 0.23); the far corner is much lower.
    let near = grid.z[9][18];
    let far = grid.z[39][39];
    assert!(near > far);
}

#[test]
fn too_few_points_is_insufficient_data() {
    let events = fixture_events();
    // Away's only non-penalty goal.
    let query = DensityQuery::new(Team::Away, HeatmapCategory::GoalsScored);
    let err = density_map(&events, &query, &small_grid()).expect_err("one point");
    assert!(err.is_no_data());
    assert!(matches!(
        err,
        StatsError::InsufficientData {
            usable: 1,
            required: 3
        }
    ));
}

#[test]
fn collinear_or_origin_points_are_insufficient() {
    let line = vec![Point::new(0.1, 0.1), Point::new(0.2, 0.2), Point::new(0.3, 0.3)];
    assert!(matches!(
        kde_grid(&line, 0.6, 20, 3),
        Err(StatsError::InsufficientData { .. })
    ));
    let origin = vec![Point::new(0.0, 0.0); 5];
    assert!(matches!(
        kde_grid(&origin, 0.6, 20, 3),
        Err(StatsError::InsufficientData { .. })
    ));
    assert!(kde_grid(&[], 0.6, 20, 3).is_err());
}

#[test]
fn goal_coordinates_and_match_filter() {
    let events = fixture_events();
    let goal_query = DensityQuery::new(Team::Home, HeatmapCategory::GoalsScored)
        .source(CoordinateSource::Goal);
    let grid = density_map(&events, &goal_query, &small_grid()).expect("goal coordinates");
    assert_eq!(grid.points, 4);

    let other_match = DensityQuery::new(Team::Home, HeatmapCategory::GoalsScored).in_match("m9");
    assert!(density_map(&events, &other_match, &small_grid()).is_err());
}

#[test]
fn blocks_made_counts_opponent_attacks() {
    let block = EventRecord::new("06:00", Period::First, Team::Away, EventType::EvenStrength, Outcome::Block)
        .with_location(0.5, 0.5);
    assert!(HeatmapCategory::BlocksMade.matches(&block, Team::Home));
    assert!(!HeatmapCategory::BlocksMade.matches(&block, Team::Away));
    assert!(HeatmapCategory::MissedShots.matches(&block, Team::Away));
}

#[test]
fn penalty_goals_are_not_field_goals() {
    let penalty = EventRecord::new("04:00", Period::Second, Team::Away, EventType::Penalty, Outcome::Goal);
    assert!(!HeatmapCategory::GoalsScored.matches(&penalty, Team::Away));
    assert!(!HeatmapCategory::GoalsConceded.matches(&penalty, Team::Home));
}

#[test]
fn category_registry_resolves_labels() {
    assert_eq!(HeatmapCategory::ALL.len(), 11);
    assert_eq!(
        HeatmapCategory::from_label("power play goals scored").expect("known label"),
        HeatmapCategory::PowerPlayGoalsScored
    );
    assert!(matches!(
        HeatmapCategory::from_label("Assists"),
        Err(StatsError::UnknownCategory(label)) if label == "Assists"
    ));
}

#[test]
fn bandwidth_switches_at_small_sample_threshold() {
    let config = StatsConfig::default();
    assert_eq!(config.bandwidth_for(49), 0.6);
    assert_eq!(config.bandwidth_for(50), 0.3);
}

#[test]
fn pixel_clicks_map_to_unit_square() {
    let p = normalize_pixel(400.0, 150.0, GOAL_CANVAS.0, GOAL_CANVAS.1).expect("inside canvas");
    assert_eq!(p, Point::new(0.5, 0.5));
    let clamped = normalize_pixel(900.0, -5.0, 800.0, 800.0).expect("clamped");
    assert_eq!(clamped, Point::new(1.0, 0.0));
    assert_eq!(normalize_pixel(1.0, 1.0, 0.0, 300.0), None);
}
