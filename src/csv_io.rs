use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::debug;

use crate::error::{StatsError, StatsResult};
use crate::event::{
    is_null_token, EventRecord, EventType, Outcome, Period, Point, ShotType, Team, TurnoverType,
};
use crate::records::{
    LineupRecord, PassRecord, PlayType, RecordKind, SubstitutionRecord, FIELD_POSITIONS,
};
use crate::store::{EventLog, Snapshot};

pub const EVENT_COLUMNS: &[&str] = &[
    "match_id",
    "time",
    "period",
    "team",
    "event_type",
    "subevent",
    "outcome",
    "shot_type",
    "turnover_type",
    "player_in_attack",
    "player_in_defence",
    "location_x",
    "location_y",
    "goal_x",
    "goal_y",
];
const EVENT_REQUIRED: &[&str] = &["time", "period", "team", "event_type", "outcome"];

pub const PASS_COLUMNS: &[&str] = &[
    "match_id",
    "play_number",
    "play_type",
    "from_x",
    "from_y",
    "to_x",
    "to_y",
    "from_player",
    "to_player",
];
const PASS_REQUIRED: &[&str] = &["from_x", "from_y", "to_x", "to_y"];

pub const LINEUP_COLUMNS: &[&str] = &[
    "match_id",
    "team",
    "position_1",
    "position_2",
    "position_3",
    "position_4",
    "position_5",
    "position_6",
    "centre",
    "goalkeeper",
];
const LINEUP_REQUIRED: &[&str] = &[
    "team",
    "position_1",
    "position_2",
    "position_3",
    "position_4",
    "position_5",
    "position_6",
    "centre",
    "goalkeeper",
];

pub const SUBSTITUTION_COLUMNS: &[&str] = &["time", "match_id", "team", "player_off", "player_on"];
const SUBSTITUTION_REQUIRED: &[&str] = &["time", "team", "player_off"];

const TYPE_COLUMN: &str = "type";

// Header spellings used by earlier dashboard exports.
const ALIASES: &[(&str, &str)] = &[
    ("event", "event_type"),
    ("match", "match_id"),
    ("matchid", "match_id"),
    ("player_committing", "player_in_attack"),
    ("player_affected", "player_in_defence"),
    ("x_location", "location_x"),
    ("y_location", "location_y"),
    ("x_shot", "goal_x"),
    ("y_shot", "goal_y"),
    ("type_of_play", "play_type"),
    ("position_7", "centre"),
    ("player_substituted", "player_off"),
    ("player_coming_on", "player_on"),
];

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut index = HashMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            let mut name = normalize_header(raw);
            if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
                name = canonical.to_string();
            }
            index.entry(name).or_insert(idx);
        }
        Self { index }
    }

    fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn require(&self, names: &[&str]) -> StatsResult<()> {
        let missing = names
            .iter()
            .filter(|n| !self.has(n))
            .map(|n| n.to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StatsError::Schema { missing })
        }
    }

    /// Cell text, `None` for an absent column or a null token.
    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let idx = *self.index.get(name)?;
        let value = record.get(idx)?.trim();
        if is_null_token(value) {
            None
        } else {
            Some(value)
        }
    }

    fn text(&self, record: &StringRecord, name: &str) -> Option<String> {
        self.get(record, name).map(str::to_string)
    }

    fn required_text(&self, record: &StringRecord, name: &str, row: usize) -> StatsResult<String> {
        self.text(record, name)
            .ok_or_else(|| invalid_value(row, name, ""))
    }

    fn required<T>(
        &self,
        record: &StringRecord,
        name: &str,
        row: usize,
        parse: fn(&str) -> Option<T>,
    ) -> StatsResult<T> {
        let raw = self.get(record, name).unwrap_or("");
        parse(raw).ok_or_else(|| invalid_value(row, name, raw))
    }

    fn optional<T>(
        &self,
        record: &StringRecord,
        name: &str,
        row: usize,
        parse: fn(&str) -> Option<T>,
    ) -> StatsResult<Option<T>> {
        match self.get(record, name) {
            Some(raw) => parse(raw).map(Some).ok_or_else(|| invalid_value(row, name, raw)),
            None => Ok(None),
        }
    }

    fn point(
        &self,
        record: &StringRecord,
        x_col: &str,
        y_col: &str,
        row: usize,
    ) -> StatsResult<Option<Point>> {
        let x = self.optional(record, x_col, row, parse_f64)?;
        let y = self.optional(record, y_col, row, parse_f64)?;
        match (x, y) {
            (Some(x), Some(y)) => Ok(Some(Point::new(x, y))),
            (None, None) => Ok(None),
            _ => Err(StatsError::invalid_record(format!(
                "row {row}: {x_col} and {y_col} must both be present or both absent"
            ))),
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace([' ', '.', '-'], "_")
}

fn invalid_value(row: usize, column: &str, value: &str) -> StatsError {
    StatsError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn with_row(err: StatsError, row: usize) -> StatsError {
    match err {
        StatsError::InvalidRecord { reason } => {
            StatsError::invalid_record(format!("row {row}: {reason}"))
        }
        other => other,
    }
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok()
}

fn parse_u32(raw: &str) -> Option<u32> {
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u32))
}

fn parse_event(cols: &Columns, rec: &StringRecord, row: usize) -> StatsResult<EventRecord> {
    let outcome = cols.required(rec, "outcome", row, Outcome::parse)?;
    // Entry forms write "None" into the shot type of non-shot rows.
    let shot_type = cols
        .optional(rec, "shot_type", row, ShotType::parse)?
        .filter(|s| s.is_typed() || outcome.allows_shot_type());
    let event = EventRecord {
        match_id: cols.text(rec, "match_id"),
        time: cols.required_text(rec, "time", row)?,
        period: cols.required(rec, "period", row, Period::parse)?,
        team: cols.required(rec, "team", row, Team::parse)?,
        event_type: cols.required(rec, "event_type", row, EventType::parse)?,
        subevent: cols.text(rec, "subevent"),
        outcome,
        shot_type,
        turnover_type: cols.optional(rec, "turnover_type", row, TurnoverType::parse)?,
        player_in_attack: cols.text(rec, "player_in_attack"),
        player_in_defence: cols.text(rec, "player_in_defence"),
        location: cols.point(rec, "location_x", "location_y", row)?,
        goal: cols.point(rec, "goal_x", "goal_y", row)?,
    };
    event.validate().map_err(|e| with_row(e, row))?;
    Ok(event)
}

fn parse_pass(cols: &Columns, rec: &StringRecord, row: usize) -> StatsResult<PassRecord> {
    let from = cols.point(rec, "from_x", "from_y", row)?;
    let to = cols.point(rec, "to_x", "to_y", row)?;
    let (Some(from), Some(to)) = (from, to) else {
        return Err(StatsError::invalid_record(format!(
            "row {row}: pass needs start and end coordinates"
        )));
    };
    let pass = PassRecord {
        match_id: cols.text(rec, "match_id"),
        play_number: cols.optional(rec, "play_number", row, parse_u32)?.unwrap_or(0),
        play_type: cols
            .optional(rec, "play_type", row, PlayType::parse)?
            .unwrap_or(PlayType::Regular),
        from,
        to,
        from_player: cols.text(rec, "from_player"),
        to_player: cols.text(rec, "to_player"),
    };
    pass.validate().map_err(|e| with_row(e, row))?;
    Ok(pass)
}

fn parse_lineup(cols: &Columns, rec: &StringRecord, row: usize) -> StatsResult<LineupRecord> {
    let mut positions: [String; FIELD_POSITIONS] = Default::default();
    for (idx, slot) in positions.iter_mut().enumerate() {
        *slot = cols.required_text(rec, &format!("position_{}", idx + 1), row)?;
    }
    let lineup = LineupRecord {
        match_id: cols.text(rec, "match_id"),
        team: cols.required(rec, "team", row, Team::parse)?,
        positions,
        centre: cols.required_text(rec, "centre", row)?,
        goalkeeper: cols.required_text(rec, "goalkeeper", row)?,
    };
    lineup.validate().map_err(|e| with_row(e, row))?;
    Ok(lineup)
}

fn parse_substitution(
    cols: &Columns,
    rec: &StringRecord,
    row: usize,
) -> StatsResult<SubstitutionRecord> {
    let sub = SubstitutionRecord {
        time: cols.required_text(rec, "time", row)?,
        match_id: cols.text(rec, "match_id"),
        team: cols.required(rec, "team", row, Team::parse)?,
        player_off: cols.required_text(rec, "player_off", row)?,
        player_on: cols.text(rec, "player_on"),
    };
    sub.validate().map_err(|e| with_row(e, row))?;
    Ok(sub)
}

fn read_table<R, T>(
    reader: R,
    required: &[&str],
    parse: fn(&Columns, &StringRecord, usize) -> StatsResult<T>,
) -> StatsResult<Vec<T>>
where
    R: Read,
{
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let cols = Columns::from_headers(rdr.headers()?);
    cols.require(required)?;
    let mut out = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        out.push(parse(&cols, &record, idx + 1)?);
    }
    Ok(out)
}

pub fn read_events<R: Read>(reader: R) -> StatsResult<Vec<EventRecord>> {
    read_table(reader, EVENT_REQUIRED, parse_event)
}

pub fn read_passes<R: Read>(reader: R) -> StatsResult<Vec<PassRecord>> {
    read_table(reader, PASS_REQUIRED, parse_pass)
}

pub fn read_lineups<R: Read>(reader: R) -> StatsResult<Vec<LineupRecord>> {
    read_table(reader, LINEUP_REQUIRED, parse_lineup)
}

pub fn read_substitutions<R: Read>(reader: R) -> StatsResult<Vec<SubstitutionRecord>> {
    read_table(reader, SUBSTITUTION_REQUIRED, parse_substitution)
}

/// Reads a combined export. Rows are routed by the `type` column; a file
/// without it (or rows with an empty type) is read as events.
pub fn read_combined<R: Read>(reader: R) -> StatsResult<EventLog> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let cols = Columns::from_headers(rdr.headers()?);
    let mut log = EventLog::new();
    let mut checked: Vec<RecordKind> = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let kind = cols
            .optional(&record, TYPE_COLUMN, row, RecordKind::parse)?
            .unwrap_or(RecordKind::Event);
        if !checked.contains(&kind) {
            cols.require(required_for(kind))?;
            checked.push(kind);
        }
        let added = match kind {
            RecordKind::Event => log.append_event(parse_event(&cols, &record, row)?),
            RecordKind::Pass => log.append_pass(parse_pass(&cols, &record, row)?),
            RecordKind::Lineup => log.append_lineup(parse_lineup(&cols, &record, row)?),
            RecordKind::Substitution => {
                log.append_substitution(parse_substitution(&cols, &record, row)?)
            }
        }
        .map_err(|e| with_row(e, row))?;
        if !added {
            debug!("row {row}: duplicate {kind} skipped");
        }
    }
    Ok(log)
}

fn required_for(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Event => EVENT_REQUIRED,
        RecordKind::Pass => PASS_REQUIRED,
        RecordKind::Lineup => LINEUP_REQUIRED,
        RecordKind::Substitution => SUBSTITUTION_REQUIRED,
    }
}

type Fields = Vec<(&'static str, String)>;

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_label<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn event_fields(e: &EventRecord) -> Fields {
    vec![
        ("match_id", opt(&e.match_id)),
        ("time", e.time.clone()),
        ("period", e.period.to_string()),
        ("team", e.team.to_string()),
        ("event_type", e.event_type.to_string()),
        ("subevent", opt(&e.subevent)),
        ("outcome", e.outcome.to_string()),
        ("shot_type", opt_label(e.shot_type)),
        ("turnover_type", opt_label(e.turnover_type)),
        ("player_in_attack", opt(&e.player_in_attack)),
        ("player_in_defence", opt(&e.player_in_defence)),
        ("location_x", opt_label(e.location.map(|p| p.x))),
        ("location_y", opt_label(e.location.map(|p| p.y))),
        ("goal_x", opt_label(e.goal.map(|p| p.x))),
        ("goal_y", opt_label(e.goal.map(|p| p.y))),
    ]
}

fn pass_fields(p: &PassRecord) -> Fields {
    vec![
        ("match_id", opt(&p.match_id)),
        ("play_number", p.play_number.to_string()),
        ("play_type", p.play_type.to_string()),
        ("from_x", p.from.x.to_string()),
        ("from_y", p.from.y.to_string()),
        ("to_x", p.to.x.to_string()),
        ("to_y", p.to.y.to_string()),
        ("from_player", opt(&p.from_player)),
        ("to_player", opt(&p.to_player)),
    ]
}

fn lineup_fields(l: &LineupRecord) -> Fields {
    let mut fields = vec![("match_id", opt(&l.match_id)), ("team", l.team.to_string())];
    for (name, player) in LINEUP_COLUMNS[2..2 + FIELD_POSITIONS].iter().zip(&l.positions) {
        fields.push((*name, player.clone()));
    }
    fields.push(("centre", l.centre.clone()));
    fields.push(("goalkeeper", l.goalkeeper.clone()));
    fields
}

fn substitution_fields(s: &SubstitutionRecord) -> Fields {
    vec![
        ("time", s.time.clone()),
        ("match_id", opt(&s.match_id)),
        ("team", s.team.to_string()),
        ("player_off", s.player_off.clone()),
        ("player_on", opt(&s.player_on)),
    ]
}

fn write_row<W: Write>(
    wtr: &mut csv::Writer<W>,
    columns: &[&str],
    fields: Fields,
) -> StatsResult<()> {
    let row = columns
        .iter()
        .map(|col| {
            fields
                .iter()
                .find(|(name, _)| name == col)
                .map(|(_, value)| value.as_str())
                .unwrap_or("")
        })
        .collect::<Vec<_>>();
    wtr.write_record(&row)?;
    Ok(())
}

fn write_table<W, T>(writer: W, columns: &[&str], rows: &[T], fields: fn(&T) -> Fields) -> StatsResult<()>
where
    W: Write,
{
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(columns)?;
    for row in rows {
        write_row(&mut wtr, columns, fields(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Refuses records that would not read back, such as non-finite coordinates.
pub fn write_events<W: Write>(writer: W, events: &[EventRecord]) -> StatsResult<()> {
    for (idx, event) in events.iter().enumerate() {
        event.validate().map_err(|e| with_row(e, idx + 1))?;
    }
    write_table(writer, EVENT_COLUMNS, events, event_fields)
}

pub fn write_passes<W: Write>(writer: W, passes: &[PassRecord]) -> StatsResult<()> {
    write_table(writer, PASS_COLUMNS, passes, pass_fields)
}

pub fn write_lineups<W: Write>(writer: W, lineups: &[LineupRecord]) -> StatsResult<()> {
    write_table(writer, LINEUP_COLUMNS, lineups, lineup_fields)
}

pub fn write_substitutions<W: Write>(writer: W, subs: &[SubstitutionRecord]) -> StatsResult<()> {
    write_table(writer, SUBSTITUTION_COLUMNS, subs, substitution_fields)
}

/// `type` followed by the union of every kind's columns, first spelling wins.
pub fn combined_columns() -> Vec<&'static str> {
    let mut columns = vec![TYPE_COLUMN];
    for col in EVENT_COLUMNS
        .iter()
        .chain(PASS_COLUMNS)
        .chain(LINEUP_COLUMNS)
        .chain(SUBSTITUTION_COLUMNS)
    {
        if !columns.contains(col) {
            columns.push(col);
        }
    }
    columns
}

pub fn write_combined<W: Write>(writer: W, snapshot: &Snapshot) -> StatsResult<()> {
    let columns = combined_columns();
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(&columns)?;

    let tagged = |kind: RecordKind, mut fields: Fields| {
        fields.push((TYPE_COLUMN, kind.to_string()));
        fields
    };
    for e in snapshot.events() {
        write_row(&mut wtr, &columns, tagged(RecordKind::Event, event_fields(e)))?;
    }
    for p in snapshot.passes() {
        write_row(&mut wtr, &columns, tagged(RecordKind::Pass, pass_fields(p)))?;
    }
    for l in snapshot.lineups() {
        write_row(&mut wtr, &columns, tagged(RecordKind::Lineup, lineup_fields(l)))?;
    }
    for s in snapshot.substitutions() {
        write_row(&mut wtr, &columns, tagged(RecordKind::Substitution, substitution_fields(s)))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn load_events_file(path: &Path) -> StatsResult<Vec<EventRecord>> {
    let file = File::open(path)?;
    let events = read_events(file)?;
    debug!("loaded {} event(s) from {}", events.len(), path.display());
    Ok(events)
}

pub fn load_combined_file(path: &Path) -> StatsResult<EventLog> {
    let file = File::open(path)?;
    read_combined(file)
}
