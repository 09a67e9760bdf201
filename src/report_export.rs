use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{defensive_events, Aggregation};
use crate::event::{EventFilter, EventRecord};
use crate::metrics::{
    save_table, scoreboard, shot_type_breakdown, success_rates_for, DerivedMetric, RateDimension,
    SaveRow, ShotTypeRow,
};

pub struct ExportReport {
    pub events: usize,
    pub rate_rows: usize,
    pub save_rows: usize,
    pub shot_type_rows: usize,
    pub defensive_rows: usize,
}

/// `events` is the whole log; `filter` picks the rows each sheet reports on.
pub fn export_match_report(
    path: &Path,
    all_events: &[EventRecord],
    filter: &EventFilter,
) -> Result<ExportReport> {
    let selected = filter.select(all_events);
    let events = selected.as_slice();
    let mut rates_rows = vec![header(&[
        "Team",
        "Grouping",
        "Category",
        "Attempts",
        "Goals",
        "Exclusions Drawn",
        "6v5 Conversion",
        "Successes",
        "Success Rate %",
    ])];
    let by_event = success_rates_for(all_events, RateDimension::EventType, filter);
    let by_subevent = success_rates_for(all_events, RateDimension::Subevent, filter);
    rates_rows.extend(by_event.iter().map(|m| rate_row(m, "Event")));
    rates_rows.extend(by_subevent.iter().map(|m| rate_row(m, "Subevent")));

    let saves = save_table(events);
    let mut save_rows = vec![header(&[
        "Team",
        "Event",
        "Subevent",
        "Goalkeeper",
        "Saves",
        "Shots Faced",
        "Save %",
    ])];
    save_rows.extend(saves.iter().map(save_row));

    let shots = shot_type_breakdown(events);
    let mut shot_rows = vec![header(&["Team", "Shot Type", "Shots", "Goals"])];
    shot_rows.extend(shots.iter().map(shot_row));

    let defensive = defensive_events(events).context("aggregate defensive events")?;
    let defensive_rows = aggregation_rows(&defensive);

    let board = scoreboard(events);
    let score_rows = vec![
        header(&["Home", "Away", "Latest Time", "Period"]),
        vec![
            board.home.to_string(),
            board.away.to_string(),
            board.latest_time.clone().unwrap_or_default(),
            board
                .current_period
                .map(|p| p.to_string())
                .unwrap_or_default(),
        ],
    ];

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Scoreboard")?;
        write_rows(sheet, &score_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("SuccessRates")?;
        write_rows(sheet, &rates_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Saves")?;
        write_rows(sheet, &save_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("ShotTypes")?;
        write_rows(sheet, &shot_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Defensive")?;
        write_rows(sheet, &defensive_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        events: events.len(),
        rate_rows: by_event.len() + by_subevent.len(),
        save_rows: saves.len(),
        shot_type_rows: shots.len(),
        defensive_rows: defensive.buckets.len(),
    })
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn rate_row(m: &DerivedMetric, grouping: &str) -> Vec<String> {
    vec![
        m.team.to_string(),
        grouping.to_string(),
        m.category.label().to_string(),
        m.attempts.to_string(),
        m.goals.to_string(),
        m.exclusions_drawn.to_string(),
        format!("{:.3}", m.power_play_conversion),
        format!("{:.2}", m.successes),
        format!("{:.2}", m.rate),
    ]
}

fn save_row(row: &SaveRow) -> Vec<String> {
    vec![
        row.team.to_string(),
        row.event_type.to_string(),
        row.subevent.clone().unwrap_or_default(),
        row.goalkeeper.clone(),
        row.saves.to_string(),
        row.shots_faced.to_string(),
        row.save_pct.map(|v| format!("{v:.1}")).unwrap_or_default(),
    ]
}

fn shot_row(row: &ShotTypeRow) -> Vec<String> {
    vec![
        row.team.to_string(),
        row.shot_type.to_string(),
        row.shots.to_string(),
        row.goals.to_string(),
    ]
}

fn aggregation_rows(agg: &Aggregation) -> Vec<Vec<String>> {
    let mut head = agg
        .dimensions
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>();
    head.push("Count".to_string());
    let mut rows = vec![head];
    for bucket in &agg.buckets {
        let mut row = bucket
            .key
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        row.push(bucket.count.to_string());
        rows.push(row);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
