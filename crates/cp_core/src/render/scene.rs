//! Frame → marks
//!
//! Joins one frame's tracking rows with the roster and decides what gets
//! drawn, before any pixels are touched.

use tracing::debug;

use crate::meta::{Resolution, RosterLookup, DEFAULT_JERSEY_COLOR, DEFAULT_NUMBER_COLOR};
use crate::models::TrackingRecord;
use crate::types::{FrameNo, PitchPos, PlayerId, Rgb8};

/// Label drawn on players missing from the roster
pub const UNKNOWN_LABEL: &str = "?";

/// Drawable element, in paint order
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Player {
        at: PitchPos,
        player_id: Option<PlayerId>,
        fill: Rgb8,
        label: String,
        label_color: Rgb8,
        resolved: bool,
    },
    Ball {
        at: PitchPos,
    },
    FocalRing {
        at: PitchPos,
        player_id: PlayerId,
    },
}

/// Counts reported alongside a rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub players: usize,
    /// Player rows that had no roster entry
    pub unresolved: usize,
    pub ball_drawn: bool,
    pub focal_drawn: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub frame: FrameNo,
    pub marks: Vec<Mark>,
    pub stats: RenderStats,
}

/// Build the mark list: players, then the ball, then the focal ring.
///
/// The focal ring is omitted when the focal player has no row in this frame.
pub fn build_scene(
    frame: FrameNo,
    rows: &[TrackingRecord],
    roster: &RosterLookup,
    focal: Option<PlayerId>,
) -> Scene {
    let mut marks = Vec::with_capacity(rows.len() + 1);
    let mut stats = RenderStats::default();
    let mut ball = None;
    let mut ring = None;

    for row in rows {
        if row.is_ball {
            ball = Some(Mark::Ball { at: row.position() });
            continue;
        }

        let resolution = match row.player_id {
            Some(id) => roster.resolve(id),
            None => Resolution::Unknown,
        };
        let (fill, label, label_color, resolved) = match resolution {
            Resolution::Known(p) => (p.jersey_color, p.jersey_number.to_string(), p.number_color, true),
            Resolution::Unknown => (DEFAULT_JERSEY_COLOR, UNKNOWN_LABEL.to_string(), DEFAULT_NUMBER_COLOR, false),
        };

        stats.players += 1;
        if !resolved {
            stats.unresolved += 1;
        }
        if let (Some(focal_id), Some(id)) = (focal, row.player_id) {
            if focal_id == id {
                ring = Some(Mark::FocalRing { at: row.position(), player_id: id });
            }
        }

        marks.push(Mark::Player { at: row.position(), player_id: row.player_id, fill, label, label_color, resolved });
    }

    if let Some(ball) = ball {
        stats.ball_drawn = true;
        marks.push(ball);
    }
    if let Some(ring) = ring {
        stats.focal_drawn = true;
        marks.push(ring);
    }

    if stats.unresolved > 0 {
        debug!(frame, unresolved = stats.unresolved, "players without roster entry drawn with default style");
    }

    Scene { frame, marks, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::resolve_match;
    use crate::test_support::sample_meta;

    fn frame_rows() -> Vec<TrackingRecord> {
        vec![
            TrackingRecord::ball(10, 1.0, 1.0),
            TrackingRecord::player(10, 6028, 5.0, 5.0),
            TrackingRecord::player(10, 501, -5.0, 2.0),
            TrackingRecord::player(10, 999, 0.0, -3.0),
        ]
    }

    #[test]
    fn test_ball_and_players_are_distinct_marks() {
        let resolved = resolve_match(1, &sample_meta()).unwrap();
        let scene = build_scene(10, &frame_rows(), &resolved.roster, None);

        let balls: Vec<_> = scene.marks.iter().filter(|m| matches!(m, Mark::Ball { .. })).collect();
        assert_eq!(balls.len(), 1);
        assert_eq!(balls[0], &Mark::Ball { at: PitchPos::new(1.0, 1.0) });

        // every player mark sits on a player row, never at the ball position
        for mark in &scene.marks {
            if let Mark::Player { player_id, .. } = mark {
                assert!(player_id.is_some());
            }
        }
        assert_eq!(scene.stats.players, 3);
        assert!(scene.stats.ball_drawn);
    }

    #[test]
    fn test_unknown_player_gets_default_style() {
        let resolved = resolve_match(1, &sample_meta()).unwrap();
        let scene = build_scene(10, &frame_rows(), &resolved.roster, None);

        let unknown = scene
            .marks
            .iter()
            .find(|m| matches!(m, Mark::Player { player_id: Some(999), .. }))
            .unwrap();
        assert_eq!(
            unknown,
            &Mark::Player {
                at: PitchPos::new(0.0, -3.0),
                player_id: Some(999),
                fill: DEFAULT_JERSEY_COLOR,
                label: UNKNOWN_LABEL.to_string(),
                label_color: DEFAULT_NUMBER_COLOR,
                resolved: false,
            }
        );
        assert_eq!(scene.stats.unresolved, 1);
    }

    #[test]
    fn test_known_player_uses_kit() {
        let resolved = resolve_match(1, &sample_meta()).unwrap();
        let scene = build_scene(10, &frame_rows(), &resolved.roster, None);
        let away = scene
            .marks
            .iter()
            .find(|m| matches!(m, Mark::Player { player_id: Some(501), .. }))
            .unwrap();
        match away {
            Mark::Player { fill, label, label_color, resolved, .. } => {
                assert_eq!(*fill, Rgb8::new(0xA5, 0x00, 0x44));
                assert_eq!(label, "8");
                assert_eq!(*label_color, Rgb8::new(0xED, 0xBB, 0x00));
                assert!(resolved);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_focal_ring_last_and_only_when_present() {
        let resolved = resolve_match(1, &sample_meta()).unwrap();

        let scene = build_scene(10, &frame_rows(), &resolved.roster, Some(6028));
        assert_eq!(
            scene.marks.last(),
            Some(&Mark::FocalRing { at: PitchPos::new(5.0, 5.0), player_id: 6028 })
        );
        assert!(scene.stats.focal_drawn);

        let absent = build_scene(10, &frame_rows(), &resolved.roster, Some(23903));
        assert!(!absent.marks.iter().any(|m| matches!(m, Mark::FocalRing { .. })));
        assert!(!absent.stats.focal_drawn);
    }

    #[test]
    fn test_ball_only_frame() {
        let resolved = resolve_match(1, &sample_meta()).unwrap();
        let scene = build_scene(3, &[TrackingRecord::ball(3, 0.0, 0.0)], &resolved.roster, Some(6028));
        assert_eq!(scene.marks, vec![Mark::Ball { at: PitchPos::new(0.0, 0.0) }]);
        assert_eq!(scene.stats.players, 0);
    }
}
