use std::f64::consts::PI;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::error::{StatsError, StatsResult};
use crate::event::{EventRecord, EventType, Outcome, Point, Team};

label_enum! {
    /// Named heatmap filters. Each is a fixed predicate over a record and the
    /// selected team; "conceded" variants look at the opponent's attacks.
    pub enum HeatmapCategory {
        GoalsScored => "Goals Scored",
        GoalsConceded => "Goals Conceded",
        ExclusionsDrawn => "Exclusions Drawn",
        BlocksMade => "Blocks Made",
        MissedShots => "Missed Shots",
        PowerPlayGoalsScored => "Power Play Goals Scored",
        PowerPlayGoalsConceded => "Power Play Goals Conceded",
        RegularAttackGoalsScored => "Regular Attack Goals Scored",
        RegularAttackGoalsConceded => "Regular Attack Goals Conceded",
        CounterGoalsScored => "Counter Goals Scored",
        CounterGoalsConceded => "Counter Goals Conceded",
    }
}

impl HeatmapCategory {
    pub fn from_label(raw: &str) -> StatsResult<Self> {
        Self::parse(raw).ok_or_else(|| StatsError::UnknownCategory(raw.trim().to_string()))
    }

    pub fn matches(self, event: &EventRecord, team: Team) -> bool {
        let own = event.team == team;
        let opp = event.team == team.opponent();
        let goal = event.outcome == Outcome::Goal;
        match self {
            HeatmapCategory::GoalsScored => goal && own && event.event_type != EventType::Penalty,
            HeatmapCategory::GoalsConceded => goal && opp && event.event_type != EventType::Penalty,
            HeatmapCategory::ExclusionsDrawn => own && event.outcome == Outcome::Exclusion,
            HeatmapCategory::BlocksMade => opp && event.outcome == Outcome::Block,
            HeatmapCategory::MissedShots => {
                own && matches!(event.outcome, Outcome::Miss | Outcome::Save | Outcome::Block)
            }
            HeatmapCategory::PowerPlayGoalsScored => {
                goal && own && event.event_type == EventType::PowerPlay
            }
            HeatmapCategory::PowerPlayGoalsConceded => {
                goal && opp && event.event_type == EventType::PowerPlay
            }
            HeatmapCategory::RegularAttackGoalsScored => {
                goal && own && event.event_type == EventType::EvenStrength
            }
            HeatmapCategory::RegularAttackGoalsConceded => {
                goal && opp && event.event_type == EventType::EvenStrength
            }
            HeatmapCategory::CounterGoalsScored => {
                goal && own && event.event_type == EventType::Counter
            }
            HeatmapCategory::CounterGoalsConceded => {
                goal && opp && event.event_type == EventType::Counter
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinateSource {
    #[default]
    Pitch,
    Goal,
}

#[derive(Debug, Clone)]
pub struct DensityQuery<'a> {
    pub team: Team,
    pub category: HeatmapCategory,
    pub match_id: Option<&'a str>,
    pub source: CoordinateSource,
}

impl<'a> DensityQuery<'a> {
    pub fn new(team: Team, category: HeatmapCategory) -> Self {
        Self {
            team,
            category,
            match_id: None,
            source: CoordinateSource::Pitch,
        }
    }

    pub fn in_match(mut self, match_id: &'a str) -> Self {
        self.match_id = Some(match_id);
        self
    }

    pub fn source(mut self, source: CoordinateSource) -> Self {
        self.source = source;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    // z[row][col]: row follows `y`, col follows `x`.
    pub z: Vec<Vec<f64>>,
    pub points: usize,
    pub bandwidth: f64,
    pub max: f64,
}

pub fn density_map(
    events: &[EventRecord],
    query: &DensityQuery<'_>,
    config: &StatsConfig,
) -> StatsResult<DensityGrid> {
    let points = events
        .iter()
        .filter(|e| query.category.matches(e, query.team))
        .filter(|e| match query.match_id {
            Some(id) => e.match_id.as_deref() == Some(id),
            None => true,
        })
        .filter_map(|e| match query.source {
            CoordinateSource::Pitch => e.location,
            CoordinateSource::Goal => e.goal,
        })
        .filter(Point::is_finite)
        .collect::<Vec<_>>();

    debug!(
        "density {} for {}: {} usable point(s)",
        query.category,
        query.team,
        points.len()
    );

    let bandwidth = config.bandwidth_for(points.len());
    kde_grid(&points, bandwidth, config.kde_grid, config.kde_min_points)
}

/// Gaussian KDE with kernel covariance = sample covariance * bandwidth^2,
/// evaluated on a `grid_size` x `grid_size` lattice over the unit square.
pub fn kde_grid(
    points: &[Point],
    bandwidth: f64,
    grid_size: usize,
    min_points: usize,
) -> StatsResult<DensityGrid> {
    let n = points.len();
    let insufficient = || StatsError::InsufficientData {
        usable: n,
        required: min_points,
    };
    if n < min_points || n < 2 {
        return Err(insufficient());
    }
    if points.iter().all(|p| p.x == 0.0 && p.y == 0.0) {
        return Err(insufficient());
    }

    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / nf;
    let (mut sxx, mut syy, mut sxy) = (0.0_f64, 0.0_f64, 0.0_f64);
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let bw2 = bandwidth * bandwidth;
    let kxx = sxx / (nf - 1.0) * bw2;
    let kyy = syy / (nf - 1.0) * bw2;
    let kxy = sxy / (nf - 1.0) * bw2;

    // Collinear or coincident points leave no 2-D spread to smooth over.
    let det = kxx * kyy - kxy * kxy;
    if !det.is_finite() || det <= 1e-12 * (kxx * kyy).max(f64::MIN_POSITIVE) {
        return Err(insufficient());
    }
    let inv_xx = kyy / det;
    let inv_yy = kxx / det;
    let inv_xy = -kxy / det;
    let norm = 1.0 / (nf * 2.0 * PI * det.sqrt());

    let axis = linspace(grid_size);
    let z = axis
        .par_iter()
        .map(|&gy| {
            axis.iter()
                .map(|&gx| {
                    let sum = points
                        .iter()
                        .map(|p| {
                            let dx = gx - p.x;
                            let dy = gy - p.y;
                            let q = dx * dx * inv_xx + 2.0 * dx * dy * inv_xy + dy * dy * inv_yy;
                            (-0.5 * q).exp()
                        })
                        .sum::<f64>();
                    sum * norm
                })
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>();

    let max = z
        .iter()
        .flat_map(|row| row.iter().copied())
        .fold(0.0_f64, f64::max);

    Ok(DensityGrid {
        x: axis.clone(),
        y: axis,
        z,
        points: n,
        bandwidth,
        max,
    })
}

fn linspace(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// Canvas sizes used by the entry surface, in pixels (width, height).
pub const PITCH_CANVAS: (f64, f64) = (800.0, 800.0);
pub const GOAL_CANVAS: (f64, f64) = (800.0, 300.0);

/// Maps a canvas click to the unit square. `None` for an empty canvas or a
/// non-finite click.
pub fn normalize_pixel(x: f64, y: f64, width: f64, height: f64) -> Option<Point> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let p = Point::new((x / width).clamp(0.0, 1.0), (y / height).clamp(0.0, 1.0));
    p.is_finite().then_some(p)
}
