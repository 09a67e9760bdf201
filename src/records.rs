use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::event::{is_null_token, Point, Team};

label_enum! {
    /// Value of the `type` column in the combined export.
    pub enum RecordKind {
        Event => "event_input",
        Pass => "pass_input",
        Lineup => "lineup_input",
        Substitution => "substitution_input",
    }
}

label_enum! {
    pub enum PlayType {
        Regular => "Regular",
        PowerPlay => "Power Play",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    pub match_id: Option<String>,
    pub play_number: u32,
    pub play_type: PlayType,
    pub from: Point,
    pub to: Point,
    pub from_player: Option<String>,
    pub to_player: Option<String>,
}

impl PassRecord {
    pub fn new(play_number: u32, play_type: PlayType, from: Point, to: Point) -> Self {
        Self {
            match_id: None,
            play_number,
            play_type,
            from,
            to,
            from_player: None,
            to_player: None,
        }
    }

    pub fn validate(&self) -> StatsResult<()> {
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(StatsError::invalid_record("pass coordinates must be finite"));
        }
        for player in [&self.from_player, &self.to_player].into_iter().flatten() {
            if is_null_token(player) {
                return Err(StatsError::invalid_record(format!(
                    "pass player holds the null value {player:?}"
                )));
            }
        }
        Ok(())
    }
}

pub const FIELD_POSITIONS: usize = 6;

/// Starting seven: six field positions, the centre and the goalkeeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupRecord {
    pub match_id: Option<String>,
    pub team: Team,
    pub positions: [String; FIELD_POSITIONS],
    pub centre: String,
    pub goalkeeper: String,
}

impl LineupRecord {
    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.positions
            .iter()
            .map(String::as_str)
            .chain([self.centre.as_str(), self.goalkeeper.as_str()])
    }

    pub fn validate(&self) -> StatsResult<()> {
        let mut seen: Vec<&str> = Vec::with_capacity(FIELD_POSITIONS + 2);
        for player in self.players() {
            if player.trim().is_empty() {
                return Err(StatsError::invalid_record("lineup has an empty slot"));
            }
            if seen.contains(&player) {
                return Err(StatsError::invalid_record(format!(
                    "player {player} appears twice in the lineup"
                )));
            }
            seen.push(player);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub time: String,
    pub match_id: Option<String>,
    pub team: Team,
    pub player_off: String,
    pub player_on: Option<String>,
}

impl SubstitutionRecord {
    pub fn validate(&self) -> StatsResult<()> {
        if self.player_off.trim().is_empty() {
            return Err(StatsError::invalid_record("substitution without a player"));
        }
        if self.player_on.as_deref() == Some(self.player_off.as_str()) {
            return Err(StatsError::invalid_record(format!(
                "player {} cannot replace themselves",
                self.player_off
            )));
        }
        Ok(())
    }
}
