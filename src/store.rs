use std::sync::Arc;

use log::debug;

use crate::error::StatsResult;
use crate::event::{sort_chronologically, EventRecord};
use crate::records::{LineupRecord, PassRecord, SubstitutionRecord};

/// Immutable view of the log at one version. Cloning is cheap; appends to the
/// log after the snapshot was taken are never visible through it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    events: Arc<Vec<EventRecord>>,
    passes: Arc<Vec<PassRecord>>,
    lineups: Arc<Vec<LineupRecord>>,
    substitutions: Arc<Vec<SubstitutionRecord>>,
}

impl Snapshot {
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn passes(&self) -> &[PassRecord] {
        &self.passes
    }

    pub fn lineups(&self) -> &[LineupRecord] {
        &self.lineups
    }

    pub fn substitutions(&self) -> &[SubstitutionRecord] {
        &self.substitutions
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.passes.is_empty()
            && self.lineups.is_empty()
            && self.substitutions.is_empty()
    }

    pub fn events_sorted(&self) -> Vec<EventRecord> {
        let mut events = self.events.to_vec();
        sort_chronologically(&mut events);
        events
    }

    pub fn match_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .events
            .iter()
            .filter_map(|e| e.match_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Append-only store owned by the application layer. Appends copy the backing
/// vector when a snapshot still shares it.
#[derive(Debug, Default)]
pub struct EventLog {
    version: u64,
    events: Arc<Vec<EventRecord>>,
    passes: Arc<Vec<PassRecord>>,
    lineups: Arc<Vec<LineupRecord>>,
    substitutions: Arc<Vec<SubstitutionRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            version: snapshot.version,
            events: Arc::clone(&snapshot.events),
            passes: Arc::clone(&snapshot.passes),
            lineups: Arc::clone(&snapshot.lineups),
            substitutions: Arc::clone(&snapshot.substitutions),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.events.len() + self.passes.len() + self.lineups.len() + self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            events: Arc::clone(&self.events),
            passes: Arc::clone(&self.passes),
            lineups: Arc::clone(&self.lineups),
            substitutions: Arc::clone(&self.substitutions),
        }
    }

    /// Returns `Ok(false)` when an identical event is already logged.
    pub fn append_event(&mut self, event: EventRecord) -> StatsResult<bool> {
        event.validate()?;
        Ok(push_unique(&mut self.events, event, &mut self.version))
    }

    pub fn append_pass(&mut self, pass: PassRecord) -> StatsResult<bool> {
        pass.validate()?;
        Ok(push_unique(&mut self.passes, pass, &mut self.version))
    }

    pub fn append_lineup(&mut self, lineup: LineupRecord) -> StatsResult<bool> {
        lineup.validate()?;
        Ok(push_unique(&mut self.lineups, lineup, &mut self.version))
    }

    pub fn append_substitution(&mut self, sub: SubstitutionRecord) -> StatsResult<bool> {
        sub.validate()?;
        Ok(push_unique(&mut self.substitutions, sub, &mut self.version))
    }

    /// Appends every record of `other`, skipping duplicates. Returns how many
    /// records were new.
    pub fn merge(&mut self, other: &Snapshot) -> StatsResult<usize> {
        let mut added = 0usize;
        for event in other.events() {
            added += usize::from(self.append_event(event.clone())?);
        }
        for pass in other.passes() {
            added += usize::from(self.append_pass(pass.clone())?);
        }
        for lineup in other.lineups() {
            added += usize::from(self.append_lineup(lineup.clone())?);
        }
        for sub in other.substitutions() {
            added += usize::from(self.append_substitution(sub.clone())?);
        }
        debug!("merged {added} new record(s), log now at version {}", self.version);
        Ok(added)
    }
}

fn push_unique<T: Clone + PartialEq>(rows: &mut Arc<Vec<T>>, row: T, version: &mut u64) -> bool {
    if rows.contains(&row) {
        return false;
    }
    Arc::make_mut(rows).push(row);
    *version += 1;
    true
}
