use polo_stats::event::Point;
use polo_stats::passes::{
    attribute_passes, nearest_player, pass_links, play_summaries, PlayerAnchor, DEFAULT_ANCHORS,
};
use polo_stats::records::{PassRecord, PlayType};

fn anchors() -> Vec<PlayerAnchor> {
    vec![
        PlayerAnchor {
            name: "W2".to_string(),
            at: Point::new(100.0, 100.0),
        },
        PlayerAnchor {
            name: "W3".to_string(),
            at: Point::new(300.0, 100.0),
        },
        PlayerAnchor {
            name: "W4".to_string(),
            at: Point::new(200.0, 300.0),
        },
    ]
}

#[test]
fn default_anchors_form_an_arc() {
    assert_eq!(DEFAULT_ANCHORS.len(), 7);
    // The middle anchor sits straight out from the centre.
    let mid = &DEFAULT_ANCHORS[3];
    assert_eq!(mid.name, "Player 4");
    assert!((mid.at.x - 350.0).abs() < 1e-9);
    assert!((mid.at.y - 400.0).abs() < 1e-9);
}

#[test]
fn nearest_player_picks_closest_anchor() {
    let anchors = anchors();
    let hit = nearest_player(Point::new(280.0, 120.0), &anchors).expect("anchors present");
    assert_eq!(hit.name, "W3");
    assert!(nearest_player(Point::new(0.0, 0.0), &[]).is_none());
}

#[test]
fn attribution_keeps_existing_names() {
    let mut named = PassRecord::new(1, PlayType::Regular, Point::new(110.0, 90.0), Point::new(290.0, 110.0));
    named.from_player = Some("W9".to_string());
    let bare = PassRecord::new(1, PlayType::Regular, Point::new(290.0, 110.0), Point::new(210.0, 290.0));

    let out = attribute_passes(&[named, bare], &anchors());
    assert_eq!(out[0].from_player.as_deref(), Some("W9"));
    assert_eq!(out[0].to_player.as_deref(), Some("W3"));
    assert_eq!(out[1].from_player.as_deref(), Some("W3"));
    assert_eq!(out[1].to_player.as_deref(), Some("W4"));
}

#[test]
fn links_count_per_play_type() {
    let anchors = anchors();
    let passes = vec![
        PassRecord::new(1, PlayType::Regular, Point::new(100.0, 100.0), Point::new(300.0, 100.0)),
        PassRecord::new(2, PlayType::Regular, Point::new(100.0, 100.0), Point::new(300.0, 100.0)),
        PassRecord::new(3, PlayType::PowerPlay, Point::new(100.0, 100.0), Point::new(300.0, 100.0)),
        PassRecord::new(3, PlayType::PowerPlay, Point::new(300.0, 100.0), Point::new(200.0, 300.0)),
    ];
    assert!(pass_links(&passes).is_empty());

    let links = pass_links(&attribute_passes(&passes, &anchors));
    assert_eq!(links.len(), 3);
    let regular = links
        .iter()
        .find(|l| l.play_type == PlayType::Regular)
        .expect("regular link");
    assert_eq!((regular.from.as_str(), regular.to.as_str(), regular.count), ("W2", "W3", 2));

    let plays = play_summaries(&passes);
    assert_eq!(plays.len(), 3);
    assert_eq!(plays[2].play_number, 3);
    assert_eq!(plays[2].passes, 2);
}
