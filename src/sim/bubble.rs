//! Bubble entity and its read-only snapshot

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rule::Rule;
use crate::consts::EXIT_Y;

/// Opaque bubble identifier, unique within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BubbleId(pub u32);

impl fmt::Display for BubbleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state. Bubbles are born `Alive` and leave it exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleState {
    Alive,
    Popped,
    Expired,
}

/// A bubble in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    value: i32,
    /// `rule.classify(value)` for the rule active at spawn
    classification: bool,
    /// Rule the classification was computed against
    rule: Rule,
    /// x: centre, percent of arena width. y: leading (top) edge, percent of
    /// arena height from the top.
    pub pos: Vec2,
    /// Diameter in pixels
    pub size: f32,
    /// Percent of arena height per second
    pub speed: f32,
    /// Seconds since spawn
    pub age: f32,
    state: BubbleState,
}

impl Bubble {
    pub fn new(id: BubbleId, value: i32, rule: Rule, pos: Vec2, size: f32, speed: f32) -> Self {
        Self {
            id,
            value,
            classification: rule.classify(value),
            rule,
            pos,
            size,
            speed,
            age: 0.0,
            state: BubbleState::Alive,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Whether popping this bubble is a hit. Fixed at spawn.
    pub fn classification(&self) -> bool {
        self.classification
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn state(&self) -> BubbleState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == BubbleState::Alive
    }

    /// Rise by `speed * dt`
    pub fn advance(&mut self, dt: f32) {
        if self.is_alive() {
            self.pos.y -= self.speed * dt;
            self.age += dt;
        }
    }

    /// Leading edge has crossed the far boundary
    pub fn has_exited(&self) -> bool {
        self.pos.y <= EXIT_Y
    }

    /// Move out of `Alive`. Returns false (and changes nothing) if the bubble
    /// already left it, or if asked to go back to `Alive`.
    pub fn finish(&mut self, to: BubbleState) -> bool {
        if self.state != BubbleState::Alive || to == BubbleState::Alive {
            return false;
        }
        self.state = to;
        true
    }

    pub fn snapshot(&self) -> BubbleSnapshot {
        BubbleSnapshot {
            id: self.id,
            value: self.value,
            x: self.pos.x,
            y: self.pos.y,
            size: self.size,
            age: self.age,
            state: self.state,
        }
    }
}

/// What the presentation layer gets to see of a bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleSnapshot {
    pub id: BubbleId,
    pub value: i32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub age: f32,
    pub state: BubbleState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bubble(value: i32) -> Bubble {
        Bubble::new(BubbleId(1), value, Rule::Even, Vec2::new(50.0, 100.0), 60.0, 20.0)
    }

    #[test]
    fn test_classification_fixed_at_spawn() {
        let b = bubble(4);
        assert!(b.classification());
        assert_eq!(b.rule(), Rule::Even);
        let b = bubble(7);
        assert!(!b.classification());
    }

    #[test]
    fn test_advance_moves_up() {
        let mut b = bubble(4);
        b.advance(0.5);
        assert!((b.pos.y - 90.0).abs() < 1e-4);
        assert!((b.age - 0.5).abs() < 1e-6);
        assert!(!b.has_exited());
        b.advance(5.0);
        assert!(b.has_exited());
    }

    #[test]
    fn test_transitions_are_one_way() {
        let mut b = bubble(4);
        assert!(!b.finish(BubbleState::Alive));
        assert!(b.finish(BubbleState::Popped));
        assert_eq!(b.state(), BubbleState::Popped);
        assert!(!b.finish(BubbleState::Expired));
        assert!(!b.finish(BubbleState::Alive));
        assert_eq!(b.state(), BubbleState::Popped);
    }

    #[test]
    fn test_finished_bubble_does_not_move() {
        let mut b = bubble(4);
        b.finish(BubbleState::Expired);
        b.advance(1.0);
        assert_eq!(b.pos.y, 100.0);
    }
}
