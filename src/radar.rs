use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::error::{StatsError, StatsResult};
use crate::event::{EventFilter, EventRecord, EventType, Outcome, TurnoverType};

/// Which player field a category credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    Attacker,
    Defender,
}

impl PlayerRole {
    pub fn player(self, event: &EventRecord) -> Option<&str> {
        match self {
            PlayerRole::Attacker => event.player_in_attack.as_deref(),
            PlayerRole::Defender => event.player_in_defence.as_deref(),
        }
    }
}

label_enum! {
    pub enum RadarCategory {
        ExclusionsDrawn => "Exclusions" | "Exclusions Drawn",
        ExclusionsCommitted => "Exclusions Committed",
        Shots => "Shots",
        ShotsBlocked => "Shots Blocked",
        Goals => "Goals",
        PenaltyGoals => "Penalty Goals",
        PowerPlayGoals => "Powerplay Goals" | "Power Play Goals",
        RegularAttackGoals => "Regular Attack",
        CounterGoals => "Counter Goals" | "Fast Break Goals",
        TurnoversCommitted => "Turnover committed",
        TurnoversWon => "Turnover won",
        OffensiveFouls => "Offensive Foul",
        LostBalls => "Lost Ball",
        Saves => "Saves",
    }
}

impl RadarCategory {
    pub fn from_label(raw: &str) -> StatsResult<Self> {
        Self::parse(raw).ok_or_else(|| StatsError::UnknownCategory(raw.trim().to_string()))
    }

    pub fn role(self) -> PlayerRole {
        match self {
            RadarCategory::ExclusionsCommitted
            | RadarCategory::ShotsBlocked
            | RadarCategory::TurnoversWon
            | RadarCategory::Saves => PlayerRole::Defender,
            _ => PlayerRole::Attacker,
        }
    }

    pub fn matches(self, event: &EventRecord) -> bool {
        let goal = event.outcome == Outcome::Goal;
        let turnover = event.outcome == Outcome::Turnover;
        match self {
            RadarCategory::ExclusionsDrawn | RadarCategory::ExclusionsCommitted => {
                event.outcome == Outcome::Exclusion
            }
            RadarCategory::Shots => event.outcome.is_shot(),
            RadarCategory::ShotsBlocked => event.outcome == Outcome::Block,
            RadarCategory::Goals => goal,
            RadarCategory::PenaltyGoals => goal && event.event_type == EventType::Penalty,
            RadarCategory::PowerPlayGoals => goal && event.event_type == EventType::PowerPlay,
            RadarCategory::RegularAttackGoals => {
                goal && event.event_type == EventType::EvenStrength
            }
            RadarCategory::CounterGoals => goal && event.event_type == EventType::Counter,
            RadarCategory::TurnoversCommitted | RadarCategory::TurnoversWon => turnover,
            RadarCategory::OffensiveFouls => {
                turnover && event.turnover_type == Some(TurnoverType::OffensiveFoul)
            }
            RadarCategory::LostBalls => {
                turnover
                    && matches!(
                        event.turnover_type,
                        Some(TurnoverType::Steal | TurnoverType::BadPass)
                    )
            }
            RadarCategory::Saves => event.outcome == Outcome::Save,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileResult {
    pub percentile: f64,
    pub raw_count: usize,
}

/// Occurrences per player in `role` over events accepted by `predicate`.
pub fn tally_by<F>(events: &[EventRecord], role: PlayerRole, predicate: F) -> HashMap<String, usize>
where
    F: Fn(&EventRecord) -> bool,
{
    let mut tallies: HashMap<String, usize> = HashMap::new();
    for e in events.iter().filter(|e| predicate(e)) {
        let Some(player) = role.player(e) else {
            continue;
        };
        let player = player.trim();
        if player.is_empty() {
            continue;
        }
        *tallies.entry(player.to_string()).or_insert(0) += 1;
    }
    tallies
}

/// Rank-kind percentile of `score` among `values`: the mean of the strict and
/// weak percentages, with ties sharing one value.
pub fn percentile_of_score(values: &[usize], score: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let left = values.iter().filter(|v| **v < score).count();
    let right = values.iter().filter(|v| **v <= score).count();
    let bump = usize::from(right > left);
    (left + right + bump) as f64 * 50.0 / values.len() as f64
}

pub fn percentile_rank_by<F>(
    events: &[EventRecord],
    role: PlayerRole,
    player: &str,
    predicate: F,
) -> Option<PercentileResult>
where
    F: Fn(&EventRecord) -> bool,
{
    let tallies = tally_by(events, role, predicate);
    let raw_count = tallies.get(player.trim()).copied().filter(|c| *c > 0)?;
    let values = tallies.values().copied().collect::<Vec<_>>();
    Some(PercentileResult {
        percentile: percentile_of_score(&values, raw_count),
        raw_count,
    })
}

/// `None` when the player never appears in the category. `filter` narrows
/// the rows before tallying, so every player is ranked on the same subset.
pub fn percentile_rank(
    events: &[EventRecord],
    category: RadarCategory,
    player: &str,
    filter: Option<&EventFilter>,
) -> Option<PercentileResult> {
    percentile_rank_by(events, category.role(), player, |e| {
        filter.is_none_or(|f| f.matches(e)) && category.matches(e)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub player: String,
    pub values: Vec<Option<PercentileResult>>,
}

impl RadarSeries {
    /// (percentile, raw count) per axis with missing values drawn at the centre.
    pub fn plotted(&self) -> Vec<(f64, usize)> {
        self.values
            .iter()
            .map(|v| v.map(|r| (r.percentile, r.raw_count)).unwrap_or((0.0, 0)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub axes: Vec<RadarCategory>,
    pub series: Vec<RadarSeries>,
    pub radial_max: f64,
}

pub fn known_players(events: &[EventRecord]) -> Vec<String> {
    let mut players = events
        .iter()
        .flat_map(|e| [e.player_in_attack.as_deref(), e.player_in_defence.as_deref()])
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    players.sort();
    players.dedup();
    players
}

/// Players are checked against every event; only the tallies honour
/// `filter`. A known player with no rows in the subset gets all `None`.
pub fn radar_profile(
    events: &[EventRecord],
    players: &[String],
    categories: &[RadarCategory],
    filter: &EventFilter,
    config: &StatsConfig,
) -> StatsResult<RadarChart> {
    let known = known_players(events);
    for player in players {
        if !known.iter().any(|k| k == player.trim()) {
            return Err(StatsError::UnknownPlayer(player.clone()));
        }
    }

    let tallies = categories
        .iter()
        .map(|c| tally_by(events, c.role(), |e| filter.matches(e) && c.matches(e)))
        .collect::<Vec<_>>();

    let series = players
        .iter()
        .map(|player| {
            let values = tallies
                .iter()
                .map(|counts| {
                    let raw_count = counts.get(player.trim()).copied().filter(|c| *c > 0)?;
                    let values = counts.values().copied().collect::<Vec<_>>();
                    Some(PercentileResult {
                        percentile: percentile_of_score(&values, raw_count),
                        raw_count,
                    })
                })
                .collect();
            RadarSeries {
                player: player.clone(),
                values,
            }
        })
        .collect::<Vec<_>>();

    let top = series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .map(|r| r.percentile)
        .fold(0.0_f64, f64::max);

    Ok(RadarChart {
        axes: categories.to_vec(),
        series,
        radial_max: top + config.radar_margin,
    })
}
