use std::collections::BTreeMap;
use std::f64::consts::PI;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::event::Point;
use crate::records::{PassRecord, PlayType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAnchor {
    pub name: String,
    pub at: Point,
}

/// Seven attackers spread on an arc around the centre, in pass-canvas pixels.
pub static DEFAULT_ANCHORS: Lazy<Vec<PlayerAnchor>> = Lazy::new(|| {
    (0..7)
        .map(|i| {
            let angle = PI * (i as f64 - 3.0) / 6.0;
            PlayerAnchor {
                name: format!("Player {}", i + 1),
                at: Point::new(200.0 + 150.0 * angle.cos(), 400.0 - 150.0 * angle.sin()),
            }
        })
        .collect()
});

pub fn nearest_player(at: Point, anchors: &[PlayerAnchor]) -> Option<&PlayerAnchor> {
    anchors.iter().min_by(|a, b| {
        let da = (a.at.x - at.x).hypot(a.at.y - at.y);
        let db = (b.at.x - at.x).hypot(b.at.y - at.y);
        da.total_cmp(&db)
    })
}

/// Fills missing passer/receiver names with the closest anchor. Names already
/// on the record are kept.
pub fn attribute_passes(passes: &[PassRecord], anchors: &[PlayerAnchor]) -> Vec<PassRecord> {
    passes
        .iter()
        .map(|pass| {
            let mut out = pass.clone();
            if out.from_player.is_none() {
                out.from_player = nearest_player(pass.from, anchors).map(|a| a.name.clone());
            }
            if out.to_player.is_none() {
                out.to_player = nearest_player(pass.to, anchors).map(|a| a.name.clone());
            }
            out
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassLink {
    pub play_type: PlayType,
    pub from: String,
    pub to: String,
    pub count: usize,
}

/// Completed passer -> receiver counts per play type. Passes without both
/// names are skipped; run `attribute_passes` first to include them.
pub fn pass_links(passes: &[PassRecord]) -> Vec<PassLink> {
    let mut links: BTreeMap<(PlayType, String, String), usize> = BTreeMap::new();
    for pass in passes {
        let (Some(from), Some(to)) = (pass.from_player.as_ref(), pass.to_player.as_ref()) else {
            continue;
        };
        *links
            .entry((pass.play_type, from.clone(), to.clone()))
            .or_insert(0) += 1;
    }
    links
        .into_iter()
        .map(|((play_type, from, to), count)| PassLink {
            play_type,
            from,
            to,
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySummary {
    pub play_number: u32,
    pub play_type: PlayType,
    pub passes: usize,
}

pub fn play_summaries(passes: &[PassRecord]) -> Vec<PlaySummary> {
    let mut plays: BTreeMap<(u32, PlayType), usize> = BTreeMap::new();
    for pass in passes {
        *plays.entry((pass.play_number, pass.play_type)).or_insert(0) += 1;
    }
    plays
        .into_iter()
        .map(|((play_number, play_type), passes)| PlaySummary {
            play_number,
            play_type,
            passes,
        })
        .collect()
}
