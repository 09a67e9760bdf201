use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

label_enum! {
    pub enum Period {
        First => "1st",
        Second => "2nd",
        Third => "3rd",
        Fourth => "4th",
        Overtime => "OT",
    }
}

label_enum! {
    pub enum Team {
        Home => "Home",
        Away => "Away",
    }
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

label_enum! {
    /// Phase of play the event happened in.
    pub enum EventType {
        EvenStrength => "6v6",
        PowerPlay => "6v5",
        Penalty => "Penalty",
        Counter => "Counter",
    }
}

label_enum! {
    pub enum Outcome {
        Goal => "Goal",
        Miss => "Miss",
        Save => "Save",
        Block => "Block",
        Turnover => "Turnover",
        Exclusion => "Exclusion",
    }
}

impl Outcome {
    /// Outcomes where the ball reached (or went wide of) the goal, so a shot
    /// type can be recorded.
    pub fn allows_shot_type(self) -> bool {
        matches!(self, Outcome::Goal | Outcome::Miss | Outcome::Save)
    }

    pub fn is_shot(self) -> bool {
        matches!(
            self,
            Outcome::Goal | Outcome::Miss | Outcome::Save | Outcome::Block
        )
    }
}

label_enum! {
    pub enum ShotType {
        Skip => "Skip Shot" | "Skip",
        Lob => "Lob Shot" | "Lob",
        Normal => "Normal Shot" | "Normal",
        Untyped => "None",
    }
}

impl ShotType {
    pub fn is_typed(self) -> bool {
        !matches!(self, ShotType::Untyped)
    }
}

label_enum! {
    pub enum TurnoverType {
        Steal => "Steal",
        BadPass => "Bad Pass",
        OffensiveFoul => "Offensive Foul",
        ShotClockViolation => "Shot Clock Violation",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Cell values the CSV reader treats as missing. Text fields never hold them.
pub const NULL_TOKENS: &[&str] = &["", "n/a", "na", "nan", "null"];

pub fn is_null_token(value: &str) -> bool {
    let value = value.trim();
    NULL_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

fn present(value: String) -> Option<String> {
    if is_null_token(&value) {
        None
    } else {
        Some(value)
    }
}

/// One logged match occurrence. Records are appended once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub match_id: Option<String>,
    pub time: String,
    pub period: Period,
    pub team: Team,
    pub event_type: EventType,
    pub subevent: Option<String>,
    pub outcome: Outcome,
    pub shot_type: Option<ShotType>,
    pub turnover_type: Option<TurnoverType>,
    pub player_in_attack: Option<String>,
    pub player_in_defence: Option<String>,
    // Pitch location of the shooter, normalized to the unit square.
    pub location: Option<Point>,
    // Where the ball crossed (or missed) the goal frame.
    pub goal: Option<Point>,
}

impl EventRecord {
    pub fn new(
        time: impl Into<String>,
        period: Period,
        team: Team,
        event_type: EventType,
        outcome: Outcome,
    ) -> Self {
        Self {
            match_id: None,
            time: time.into(),
            period,
            team,
            event_type,
            subevent: None,
            outcome,
            shot_type: None,
            turnover_type: None,
            player_in_attack: None,
            player_in_defence: None,
            location: None,
            goal: None,
        }
    }

    pub fn in_match(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = present(match_id.into());
        self
    }

    pub fn with_subevent(mut self, subevent: impl Into<String>) -> Self {
        self.subevent = present(subevent.into());
        self
    }

    pub fn with_shot_type(mut self, shot_type: ShotType) -> Self {
        self.shot_type = Some(shot_type);
        self
    }

    pub fn with_turnover_type(mut self, turnover_type: TurnoverType) -> Self {
        self.turnover_type = Some(turnover_type);
        self
    }

    pub fn with_attacker(mut self, player: impl Into<String>) -> Self {
        self.player_in_attack = present(player.into());
        self
    }

    pub fn with_defender(mut self, player: impl Into<String>) -> Self {
        self.player_in_defence = present(player.into());
        self
    }

    pub fn with_location(mut self, x: f64, y: f64) -> Self {
        self.location = Some(Point::new(x, y));
        self
    }

    pub fn with_goal(mut self, x: f64, y: f64) -> Self {
        self.goal = Some(Point::new(x, y));
        self
    }

    pub fn validate(&self) -> StatsResult<()> {
        if is_null_token(&self.time) {
            return Err(StatsError::invalid_record("time is empty"));
        }
        for (field, value) in [
            ("match_id", &self.match_id),
            ("subevent", &self.subevent),
            ("player_in_attack", &self.player_in_attack),
            ("player_in_defence", &self.player_in_defence),
        ] {
            if let Some(value) = value.as_deref().filter(|v| is_null_token(v)) {
                return Err(StatsError::invalid_record(format!(
                    "{field} holds the null value {value:?}"
                )));
            }
        }
        for (field, point) in [("location", self.location), ("goal", self.goal)] {
            if point.is_some_and(|p| !p.is_finite()) {
                return Err(StatsError::invalid_record(format!(
                    "{field} coordinates must be finite"
                )));
            }
        }
        if let Some(shot_type) = self.shot_type {
            if !self.outcome.allows_shot_type() {
                return Err(StatsError::invalid_record(format!(
                    "shot type {shot_type} recorded on a {} outcome",
                    self.outcome
                )));
            }
        }
        if let Some(turnover_type) = self.turnover_type {
            if self.outcome != Outcome::Turnover {
                return Err(StatsError::invalid_record(format!(
                    "turnover type {turnover_type} recorded on a {} outcome",
                    self.outcome
                )));
            }
        }
        if self.event_type == EventType::Penalty && !self.outcome.allows_shot_type() {
            return Err(StatsError::invalid_record(format!(
                "penalty cannot end in {}",
                self.outcome
            )));
        }
        Ok(())
    }

    /// Match clock in seconds, parsed from "mm:ss" (or a bare minute count).
    pub fn clock_seconds(&self) -> Option<u32> {
        parse_clock(&self.time)
    }
}

pub fn parse_clock(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match s.split_once(':') {
        Some((mm, ss)) => {
            let minutes = mm.trim().parse::<u32>().ok()?;
            let seconds = ss.trim().parse::<u32>().ok()?;
            if seconds >= 60 {
                return None;
            }
            Some(minutes * 60 + seconds)
        }
        None => s.parse::<u32>().ok().map(|m| m * 60),
    }
}

/// Sorts by period, then clock. Rows with an unreadable clock keep their
/// relative order at the end of their period.
pub fn sort_chronologically(events: &mut [EventRecord]) {
    events.sort_by_key(|e| (e.period, e.clock_seconds().unwrap_or(u32::MAX)));
}

/// Row selection shared by every computation (period selector, team, match).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub period: Option<Period>,
    pub team: Option<Team>,
    pub match_id: Option<String>,
    pub event_type: Option<EventType>,
    pub outcomes: Vec<Outcome>,
    pub shot_type: Option<ShotType>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn match_id(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = present(match_id.into());
        self
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn outcomes(mut self, outcomes: &[Outcome]) -> Self {
        self.outcomes = outcomes.to_vec();
        self
    }

    pub fn shot_type(mut self, shot_type: ShotType) -> Self {
        self.shot_type = Some(shot_type);
        self
    }

    /// Same selection without the phase and outcome parts. Rates need the
    /// team's whole possession set for the 6v5 conversion.
    pub fn possession_scope(&self) -> Self {
        Self {
            event_type: None,
            outcomes: Vec::new(),
            shot_type: None,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        if self.period.is_some_and(|p| p != event.period) {
            return false;
        }
        if self.team.is_some_and(|t| t != event.team) {
            return false;
        }
        if self.event_type.is_some_and(|t| t != event.event_type) {
            return false;
        }
        if let Some(match_id) = self.match_id.as_deref() {
            if event.match_id.as_deref() != Some(match_id) {
                return false;
            }
        }
        if !self.outcomes.is_empty() && !self.outcomes.contains(&event.outcome) {
            return false;
        }
        if self.shot_type.is_some() && self.shot_type != event.shot_type {
            return false;
        }
        true
    }

    pub fn select(&self, events: &[EventRecord]) -> Vec<EventRecord> {
        events
            .iter()
            .filter(|e| self.matches(e))
            .cloned()
            .collect()
    }
}
