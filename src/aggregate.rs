use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::event::{EventRecord, Outcome};

pub const MAX_DIMENSIONS: usize = 4;

label_enum! {
    pub enum Dimension {
        Team => "team",
        EventType => "event_type" | "event",
        Subevent => "subevent",
        Outcome => "outcome",
        ShotType => "shot_type",
        Player => "player",
        Period => "period",
        Match => "match" | "match_id",
    }
}

/// A grouping key component. Missing values get their own bucket instead of
/// being dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroupValue {
    Value(String),
    Unknown,
}

impl GroupValue {
    fn from_opt(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => GroupValue::Value(v.to_string()),
            _ => GroupValue::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupValue::Value(v) => v,
            GroupValue::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub key: Vec<GroupValue>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub dimensions: Vec<Dimension>,
    pub buckets: Vec<AggregateBucket>,
    pub total: usize,
}

impl Aggregation {
    pub fn value<'a>(&self, bucket: &'a AggregateBucket, dim: Dimension) -> Option<&'a GroupValue> {
        let idx = self.dimensions.iter().position(|d| *d == dim)?;
        bucket.key.get(idx)
    }

    /// Count for an exact key, 0 when the combination never occurred.
    pub fn count_for(&self, key: &[&str]) -> usize {
        self.buckets
            .iter()
            .find(|b| b.key.len() == key.len() && b.key.iter().zip(key).all(|(v, k)| v.as_str() == *k))
            .map(|b| b.count)
            .unwrap_or(0)
    }
}

pub fn dimension_value(event: &EventRecord, dim: Dimension) -> GroupValue {
    match dim {
        Dimension::Team => GroupValue::Value(event.team.label().to_string()),
        Dimension::EventType => GroupValue::Value(event.event_type.label().to_string()),
        Dimension::Subevent => GroupValue::from_opt(event.subevent.as_deref()),
        Dimension::Outcome => GroupValue::Value(event.outcome.label().to_string()),
        Dimension::ShotType => GroupValue::from_opt(event.shot_type.map(|s| s.label())),
        Dimension::Player => GroupValue::from_opt(event.player_in_attack.as_deref()),
        Dimension::Period => GroupValue::Value(event.period.label().to_string()),
        Dimension::Match => GroupValue::from_opt(event.match_id.as_deref()),
    }
}

pub fn aggregate(events: &[EventRecord], dimensions: &[Dimension]) -> StatsResult<Aggregation> {
    validate_dimensions(dimensions)?;

    let mut counts: BTreeMap<Vec<GroupValue>, usize> = BTreeMap::new();
    for event in events {
        let key = dimensions
            .iter()
            .map(|dim| dimension_value(event, *dim))
            .collect::<Vec<_>>();
        *counts.entry(key).or_insert(0) += 1;
    }

    Ok(Aggregation {
        dimensions: dimensions.to_vec(),
        buckets: counts
            .into_iter()
            .map(|(key, count)| AggregateBucket { key, count })
            .collect(),
        total: events.len(),
    })
}

fn validate_dimensions(dimensions: &[Dimension]) -> StatsResult<()> {
    if dimensions.is_empty() {
        return Err(StatsError::InvalidGrouping {
            reason: "at least one dimension is required".to_string(),
        });
    }
    if dimensions.len() > MAX_DIMENSIONS {
        return Err(StatsError::InvalidGrouping {
            reason: format!(
                "{} dimensions requested, at most {MAX_DIMENSIONS} supported",
                dimensions.len()
            ),
        });
    }
    for (idx, dim) in dimensions.iter().enumerate() {
        if dimensions[..idx].contains(dim) {
            return Err(StatsError::InvalidGrouping {
                reason: format!("dimension {dim} requested twice"),
            });
        }
    }
    Ok(())
}

/// Blocks, turnovers and exclusions by team, phase and subevent.
pub fn defensive_events(events: &[EventRecord]) -> StatsResult<Aggregation> {
    let rows = events
        .iter()
        .filter(|e| {
            matches!(
                e.outcome,
                Outcome::Block | Outcome::Turnover | Outcome::Exclusion
            )
        })
        .cloned()
        .collect::<Vec<_>>();
    aggregate(
        &rows,
        &[Dimension::Team, Dimension::EventType, Dimension::Subevent],
    )
}
