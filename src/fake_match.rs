use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::StatsResult;
use crate::event::{EventRecord, EventType, Outcome, Period, Point, ShotType, Team, TurnoverType};
use crate::passes::DEFAULT_ANCHORS;
use crate::records::{LineupRecord, PassRecord, PlayType, FIELD_POSITIONS};
use crate::store::EventLog;

const PERIOD_SECS: u32 = 8 * 60;
const SQUAD_SIZE: usize = 13;
const REGULATION: [Period; 4] = [Period::First, Period::Second, Period::Third, Period::Fourth];

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub seed: u64,
    pub events: usize,
    pub plays: usize,
    pub match_id: String,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            seed: 7,
            events: 120,
            plays: 12,
            match_id: "sim-1".to_string(),
        }
    }
}

/// Cap-number style squad names: W1..W13 for home, B1..B13 for away.
/// Number 1 keeps goal.
pub fn squad(team: Team) -> Vec<String> {
    let prefix = match team {
        Team::Home => "W",
        Team::Away => "B",
    };
    (1..=SQUAD_SIZE).map(|n| format!("{prefix}{n}")).collect()
}

fn goalkeeper(team: Team) -> String {
    match team {
        Team::Home => "W1".to_string(),
        Team::Away => "B1".to_string(),
    }
}

fn field_player(rng: &mut StdRng, team: Team) -> String {
    let players = squad(team);
    players[rng.gen_range(1..players.len())].clone()
}

fn pick<T: Copy>(rng: &mut StdRng, weighted: &[(T, u32)]) -> T {
    let total: u32 = weighted.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total.max(1));
    for (value, weight) in weighted {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    weighted[weighted.len() - 1].0
}

fn subevent_for(rng: &mut StdRng, event_type: EventType) -> Option<String> {
    let options: &[&str] = match event_type {
        EventType::EvenStrength => &["Centre", "Drive", "Perimeter"],
        EventType::PowerPlay => &["4-2", "3-3"],
        EventType::Counter => &["2v1", "1v0", "3v2"],
        EventType::Penalty => return None,
    };
    Some(options[rng.gen_range(0..options.len())].to_string())
}

fn outcome_for(rng: &mut StdRng, event_type: EventType) -> Outcome {
    match event_type {
        EventType::Penalty => pick(rng, &[(Outcome::Goal, 6), (Outcome::Save, 3), (Outcome::Miss, 1)]),
        EventType::PowerPlay => pick(
            rng,
            &[
                (Outcome::Goal, 4),
                (Outcome::Save, 3),
                (Outcome::Miss, 2),
                (Outcome::Block, 2),
                (Outcome::Turnover, 1),
            ],
        ),
        _ => pick(
            rng,
            &[
                (Outcome::Goal, 3),
                (Outcome::Save, 3),
                (Outcome::Miss, 3),
                (Outcome::Block, 2),
                (Outcome::Turnover, 3),
                (Outcome::Exclusion, 3),
            ],
        ),
    }
}

fn clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn random_event(rng: &mut StdRng, idx: usize, total: usize, match_id: &str) -> EventRecord {
    let period = REGULATION[(idx * REGULATION.len() / total.max(1)).min(REGULATION.len() - 1)];
    let per_period = total.div_ceil(REGULATION.len()).max(1);
    let slot = (idx % per_period) as u32;
    let seconds = (slot * PERIOD_SECS / per_period as u32 + rng.gen_range(0..5)).min(PERIOD_SECS);

    let team = if rng.gen_bool(0.5) { Team::Home } else { Team::Away };
    let event_type = pick(
        rng,
        &[
            (EventType::EvenStrength, 12),
            (EventType::PowerPlay, 4),
            (EventType::Counter, 3),
            (EventType::Penalty, 1),
        ],
    );
    let outcome = outcome_for(rng, event_type);

    let mut event = EventRecord::new(clock(seconds), period, team, event_type, outcome)
        .in_match(match_id)
        .with_attacker(field_player(rng, team));
    if let Some(sub) = subevent_for(rng, event_type) {
        event = event.with_subevent(sub);
    }

    let defender = if outcome.allows_shot_type() {
        goalkeeper(team.opponent())
    } else {
        field_player(rng, team.opponent())
    };
    event = event.with_defender(defender);

    if outcome.allows_shot_type() {
        let shot = pick(
            rng,
            &[(ShotType::Normal, 6), (ShotType::Skip, 3), (ShotType::Lob, 2)],
        );
        event = event
            .with_shot_type(shot)
            .with_goal(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
    }
    if outcome == Outcome::Turnover {
        let kind = pick(
            rng,
            &[
                (TurnoverType::Steal, 4),
                (TurnoverType::BadPass, 3),
                (TurnoverType::OffensiveFoul, 2),
                (TurnoverType::ShotClockViolation, 1),
            ],
        );
        event = event.with_turnover_type(kind);
    }
    if outcome.is_shot() || outcome == Outcome::Exclusion {
        let depth = if event_type == EventType::Penalty { 0.2..0.3 } else { 0.05..0.7 };
        event = event.with_location(rng.gen_range(0.1..0.9), rng.gen_range(depth));
    }
    event
}

fn jitter(rng: &mut StdRng, p: Point) -> Point {
    Point::new(p.x + rng.gen_range(-15.0..15.0), p.y + rng.gen_range(-15.0..15.0))
}

fn random_play(rng: &mut StdRng, play_number: u32, match_id: &str) -> Vec<PassRecord> {
    let play_type = if rng.gen_bool(0.3) {
        PlayType::PowerPlay
    } else {
        PlayType::Regular
    };
    let anchors = &*DEFAULT_ANCHORS;
    let count = rng.gen_range(2..=5);
    let mut holder = rng.gen_range(0..anchors.len());
    let mut passes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut next = rng.gen_range(0..anchors.len());
        if next == holder {
            next = (next + 1) % anchors.len();
        }
        let mut pass = PassRecord::new(
            play_number,
            play_type,
            jitter(rng, anchors[holder].at),
            jitter(rng, anchors[next].at),
        );
        pass.match_id = Some(match_id.to_string());
        passes.push(pass);
        holder = next;
    }
    passes
}

fn starting_lineup(team: Team, match_id: &str) -> LineupRecord {
    let players = squad(team);
    let mut positions: [String; FIELD_POSITIONS] = Default::default();
    for (slot, name) in positions.iter_mut().zip(players.iter().skip(1)) {
        *slot = name.clone();
    }
    LineupRecord {
        match_id: Some(match_id.to_string()),
        team,
        positions,
        centre: players[FIELD_POSITIONS + 1].clone(),
        goalkeeper: goalkeeper(team),
    }
}

/// Builds a reproducible synthetic match: lineups, `events` events spread
/// over four periods, and `plays` pass sequences.
pub fn simulate_match(opts: &SimOptions) -> StatsResult<EventLog> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut log = EventLog::new();

    for team in Team::ALL.iter().copied() {
        log.append_lineup(starting_lineup(team, &opts.match_id))?;
    }
    let mut skipped = 0usize;
    for idx in 0..opts.events {
        let event = random_event(&mut rng, idx, opts.events, &opts.match_id);
        if !log.append_event(event)? {
            skipped += 1;
        }
    }
    for play in 1..=opts.plays {
        for pass in random_play(&mut rng, play as u32, &opts.match_id) {
            log.append_pass(pass)?;
        }
    }
    debug!(
        "simulated {} record(s) for {} (seed {}, {skipped} duplicate(s) dropped)",
        log.len(),
        opts.match_id,
        opts.seed
    );
    Ok(log)
}
