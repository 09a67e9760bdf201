use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::{EventFilter, EventRecord, EventType, Outcome, Period, ShotType, Team};

/// What a success rate is computed over: a phase of play or a subevent label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RateCategory {
    EventType(EventType),
    Subevent(String),
}

impl RateCategory {
    pub fn label(&self) -> &str {
        match self {
            RateCategory::EventType(t) => t.label(),
            RateCategory::Subevent(s) => s,
        }
    }

    fn matches(&self, event: &EventRecord) -> bool {
        match self {
            RateCategory::EventType(t) => event.event_type == *t,
            RateCategory::Subevent(s) => event.subevent.as_deref() == Some(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateDimension {
    EventType,
    Subevent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub team: Team,
    pub category: RateCategory,
    pub attempts: usize,
    pub goals: usize,
    pub exclusions_drawn: usize,
    // Team's 6v5 goals over 6v5 attempts in the same event set.
    pub power_play_conversion: f64,
    // Goals plus exclusions credited at the power-play conversion rate.
    pub successes: f64,
    pub rate: f64,
}

/// Share of a team's 6v5 possessions that ended in a goal, 0 without any.
pub fn power_play_conversion(events: &[EventRecord], team: Team) -> f64 {
    let mut attempts = 0usize;
    let mut goals = 0usize;
    for e in events
        .iter()
        .filter(|e| e.team == team && e.event_type == EventType::PowerPlay)
    {
        attempts += 1;
        if e.outcome == Outcome::Goal {
            goals += 1;
        }
    }
    ratio(goals as f64, attempts)
}

pub fn success_rate(events: &[EventRecord], team: Team, category: &RateCategory) -> DerivedMetric {
    let conversion = power_play_conversion(events, team);
    success_rate_with_conversion(events, team, category, conversion)
}

fn success_rate_with_conversion(
    events: &[EventRecord],
    team: Team,
    category: &RateCategory,
    conversion: f64,
) -> DerivedMetric {
    let mut attempts = 0usize;
    let mut goals = 0usize;
    let mut exclusions_drawn = 0usize;
    for e in events
        .iter()
        .filter(|e| e.team == team && category.matches(e))
    {
        attempts += 1;
        match e.outcome {
            Outcome::Goal => goals += 1,
            Outcome::Exclusion => exclusions_drawn += 1,
            _ => {}
        }
    }

    let successes = goals as f64 + exclusions_drawn as f64 * conversion;
    DerivedMetric {
        team,
        category: category.clone(),
        attempts,
        goals,
        exclusions_drawn,
        power_play_conversion: conversion,
        successes,
        rate: (ratio(successes, attempts) * 100.0).clamp(0.0, 100.0),
    }
}

/// One row per (team, category) present in the events, teams first.
pub fn success_rates(events: &[EventRecord], by: RateDimension) -> Vec<DerivedMetric> {
    success_rates_for(events, by, &EventFilter::all())
}

/// Rates over the rows `filter` selects. The 6v5 conversion comes from the
/// wider possession scope (team, period, match), so a phase filter such as
/// 6v6 still credits drawn exclusions.
pub fn success_rates_for(
    events: &[EventRecord],
    by: RateDimension,
    filter: &EventFilter,
) -> Vec<DerivedMetric> {
    let scope = filter.possession_scope().select(events);
    let rows = filter.select(&scope);

    let mut out = Vec::new();
    for team in Team::ALL.iter().copied() {
        let mut categories: Vec<RateCategory> = rows
            .iter()
            .filter(|e| e.team == team)
            .filter_map(|e| match by {
                RateDimension::EventType => Some(RateCategory::EventType(e.event_type)),
                RateDimension::Subevent => e.subevent.clone().map(RateCategory::Subevent),
            })
            .collect();
        if categories.is_empty() {
            continue;
        }
        categories.sort();
        categories.dedup();

        let conversion = power_play_conversion(&scope, team);
        out.extend(
            categories
                .iter()
                .map(|c| success_rate_with_conversion(&rows, team, c, conversion)),
        );
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRow {
    pub team: Team,
    pub event_type: EventType,
    pub subevent: Option<String>,
    pub goalkeeper: String,
    pub saves: usize,
    pub shots_faced: usize,
    pub save_pct: Option<f64>,
}

fn faces_shot(event: &EventRecord) -> bool {
    matches!(event.outcome, Outcome::Save | Outcome::Miss | Outcome::Goal)
}

/// Saves over on-frame-or-wide shots for the goalkeeper recorded in
/// `player_in_defence`. `team` is the team the shot was logged against.
/// `None` when the goalkeeper faced no shots.
pub fn save_percentage(
    events: &[EventRecord],
    team: Team,
    subevent: Option<&str>,
    goalkeeper: &str,
) -> Option<f64> {
    let mut saves = 0usize;
    let mut shots = 0usize;
    for e in events.iter().filter(|e| {
        e.team == team
            && e.player_in_defence.as_deref() == Some(goalkeeper)
            && subevent.is_none_or(|s| e.subevent.as_deref() == Some(s))
            && faces_shot(e)
    }) {
        shots += 1;
        if e.outcome == Outcome::Save {
            saves += 1;
        }
    }
    if shots == 0 {
        None
    } else {
        Some(saves as f64 / shots as f64 * 100.0)
    }
}

pub fn save_table(events: &[EventRecord]) -> Vec<SaveRow> {
    let mut groups: BTreeMap<(Team, EventType, Option<String>, String), (usize, usize)> =
        BTreeMap::new();
    for e in events.iter().filter(|e| faces_shot(e)) {
        let Some(goalkeeper) = e.player_in_defence.clone() else {
            continue;
        };
        let entry = groups
            .entry((e.team, e.event_type, e.subevent.clone(), goalkeeper))
            .or_insert((0, 0));
        entry.1 += 1;
        if e.outcome == Outcome::Save {
            entry.0 += 1;
        }
    }
    groups
        .into_iter()
        .map(
            |((team, event_type, subevent, goalkeeper), (saves, shots_faced))| SaveRow {
                team,
                event_type,
                subevent,
                goalkeeper,
                saves,
                shots_faced,
                save_pct: (shots_faced > 0).then(|| saves as f64 / shots_faced as f64 * 100.0),
            },
        )
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotTypeRow {
    pub team: Team,
    pub shot_type: ShotType,
    pub shots: usize,
    pub goals: usize,
}

/// Shots and goals per team for typed shots (skip, lob, normal).
pub fn shot_type_breakdown(events: &[EventRecord]) -> Vec<ShotTypeRow> {
    let mut groups: BTreeMap<(Team, ShotType), (usize, usize)> = BTreeMap::new();
    for e in events {
        let Some(shot_type) = e.shot_type else {
            continue;
        };
        if !shot_type.is_typed() {
            continue;
        }
        let entry = groups.entry((e.team, shot_type)).or_insert((0, 0));
        entry.0 += 1;
        if e.outcome == Outcome::Goal {
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|((team, shot_type), (shots, goals))| ShotTypeRow {
            team,
            shot_type,
            shots,
            goals,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub home: usize,
    pub away: usize,
    pub latest_time: Option<String>,
    pub current_period: Option<Period>,
}

/// Goals per side plus the clock and period of the most recently logged event.
pub fn scoreboard(events: &[EventRecord]) -> Scoreboard {
    let mut board = Scoreboard::default();
    for e in events.iter().filter(|e| e.outcome == Outcome::Goal) {
        match e.team {
            Team::Home => board.home += 1,
            Team::Away => board.away += 1,
        }
    }
    if let Some(last) = events.last() {
        board.latest_time = Some(last.time.clone());
        board.current_period = Some(last.period);
    }
    board
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}
