//! Presentation helpers
//!
//! Sideways drift and opacity are cosmetic. They are pure functions of a
//! bubble snapshot, so the simulation never stores or depends on them.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{BubbleId, BubbleSnapshot, Frame, RoundEnd, RoundEvent, Scoreboard};

/// Peak sideways drift, percent of arena width
pub const DRIFT_AMPLITUDE_PCT: f32 = 5.0;
/// Drift angular frequency (radians per second)
const DRIFT_RATE: f32 = 1.3;

/// Stable per-bubble phase so neighbours don't sway in lockstep
fn drift_phase(id: BubbleId) -> f32 {
    (id.0.wrapping_mul(2654435761) % 1000) as f32 / 1000.0 * std::f32::consts::TAU
}

/// Horizontal drift for a bubble at its current age
pub fn drift_offset(bubble: &BubbleSnapshot, amplitude_pct: f32) -> f32 {
    amplitude_pct * (bubble.age * DRIFT_RATE + drift_phase(bubble.id)).sin()
}

/// Opacity: 0.7 at the edges, fully opaque mid-arena
pub fn opacity(bubble: &BubbleSnapshot) -> f32 {
    let from_middle = ((bubble.y - 50.0).abs() / 50.0).min(1.0);
    0.7 + 0.3 * (1.0 - from_middle)
}

/// A bubble ready to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderBubble {
    pub id: BubbleId,
    pub value: i32,
    /// Centre, percent of arena width (drift applied)
    pub x: f32,
    /// Top edge, percent of arena height
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
}

pub fn render_bubble(bubble: &BubbleSnapshot, settings: &Settings) -> RenderBubble {
    let amplitude = if settings.reduced_motion {
        0.0
    } else {
        DRIFT_AMPLITUDE_PCT
    };
    RenderBubble {
        id: bubble.id,
        value: bubble.value,
        x: (bubble.x + drift_offset(bubble, amplitude)).clamp(0.0, 100.0),
        y: bubble.y,
        size: bubble.size,
        opacity: opacity(bubble),
    }
}

/// Everything the front end needs for one display frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView<'a> {
    pub banner: &'static str,
    pub level: u32,
    pub score: u64,
    pub lives: u32,
    pub progress: f32,
    pub bubbles: Vec<RenderBubble>,
    /// Round events since the previous frame, minus per-tick snapshots
    pub events: Vec<&'a RoundEvent>,
    /// Game-over screen, once the round has ended
    pub outcome: Option<RoundEnd>,
    pub message: Option<&'static str>,
}

impl<'a> FrameView<'a> {
    pub fn new(
        frame: &Frame,
        scoreboard: &Scoreboard,
        events: &'a [RoundEvent],
        outcome: Option<RoundEnd>,
        settings: &Settings,
    ) -> Self {
        Self {
            banner: frame.rule.banner(),
            level: frame.level,
            score: scoreboard.score,
            lives: scoreboard.lives,
            progress: scoreboard.level_progress(),
            bubbles: frame
                .bubbles
                .iter()
                .map(|b| render_bubble(b, settings))
                .collect(),
            events: events
                .iter()
                .filter(|e| !matches!(e, RoundEvent::Tick(_)))
                .collect(),
            outcome,
            message: outcome.map(|end| frame.rule.encouragement(end.stars)),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BubbleState, Rule};

    fn snapshot(id: u32, x: f32, y: f32, age: f32) -> BubbleSnapshot {
        BubbleSnapshot {
            id: BubbleId(id),
            value: 7,
            x,
            y,
            size: 60.0,
            age,
            state: BubbleState::Alive,
        }
    }

    #[test]
    fn test_drift_bounded() {
        for age in [0.0, 0.5, 1.7, 12.3] {
            let offset = drift_offset(&snapshot(3, 50.0, 50.0, age), DRIFT_AMPLITUDE_PCT);
            assert!(offset.abs() <= DRIFT_AMPLITUDE_PCT + 1e-4);
        }
        assert_eq!(drift_offset(&snapshot(3, 50.0, 50.0, 2.0), 0.0), 0.0);
    }

    #[test]
    fn test_opacity_curve() {
        assert!((opacity(&snapshot(1, 50.0, 50.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!((opacity(&snapshot(1, 50.0, 100.0, 0.0)) - 0.7).abs() < 1e-6);
        assert!((opacity(&snapshot(1, 50.0, 0.0, 0.0)) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_reduced_motion_disables_drift() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        let b = snapshot(9, 42.0, 80.0, 3.3);
        assert_eq!(render_bubble(&b, &settings).x, 42.0);
    }

    #[test]
    fn test_drift_stays_in_arena() {
        let b = snapshot(9, 99.0, 80.0, 1.0);
        let x = render_bubble(&b, &Settings::default()).x;
        assert!((0.0..=100.0).contains(&x));
    }

    #[test]
    fn test_frame_view_skips_ticks() {
        let frame = Frame {
            tick: 1,
            rule: Rule::Even,
            level: 1,
            bubbles: vec![snapshot(1, 50.0, 90.0, 0.1)],
        };
        let events = vec![
            RoundEvent::Tick(frame.clone()),
            RoundEvent::LifeLost { lives: 2 },
        ];
        let view = FrameView::new(
            &frame,
            &Scoreboard::default(),
            &events,
            None,
            &Settings::default(),
        );
        assert_eq!(view.banner, "POP EVEN NUMBERS!");
        assert_eq!(view.bubbles.len(), 1);
        assert_eq!(view.events.len(), 1);
        assert!(view.message.is_none());

        let json = view.to_json().unwrap();
        assert!(json.contains("\"life_lost\""));
    }

    #[test]
    fn test_frame_view_game_over_message() {
        use crate::sim::EndReason;

        let frame = Frame {
            rule: Rule::Odd,
            ..Default::default()
        };
        let end = RoundEnd {
            reason: EndReason::LivesExhausted,
            final_score: 120,
            level: 3,
            stars: 2,
        };
        let view = FrameView::new(
            &frame,
            &Scoreboard::default(),
            &[],
            Some(end),
            &Settings::default(),
        );
        assert_eq!(view.outcome, Some(end));
        assert_eq!(view.message, Some(Rule::Odd.encouragement(2)));
        assert!(view.to_json().unwrap().contains("lives_exhausted"));
    }
}
