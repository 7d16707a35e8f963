//! Classification rules
//!
//! A rule is a predicate over a bubble's integer value. The rule active when
//! a bubble spawns decides, once and for all, whether popping it is a hit.

use serde::{Deserialize, Serialize};

/// Which numbers the player is asked to pop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    #[default]
    Odd,
    Even,
    MultipleOf3,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Odd => "odd",
            Rule::Even => "even",
            Rule::MultipleOf3 => "multiple_of_3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "odd" => Some(Rule::Odd),
            "even" => Some(Rule::Even),
            "multiple_of_3" | "multiple-of-3" | "mult3" | "three" => Some(Rule::MultipleOf3),
            _ => None,
        }
    }

    /// Evaluate the rule against a value (negative values classify by
    /// their Euclidean remainder, so -3 is odd and a multiple of 3)
    #[inline]
    pub fn classify(&self, value: i32) -> bool {
        match self {
            Rule::Odd => value.rem_euclid(2) == 1,
            Rule::Even => value.rem_euclid(2) == 0,
            Rule::MultipleOf3 => value.rem_euclid(3) == 0,
        }
    }

    /// Rule to use after a level-up. Odd and even swap; multiple-of-3
    /// has no natural partner and stays.
    pub fn switched(&self) -> Self {
        match self {
            Rule::Odd => Rule::Even,
            Rule::Even => Rule::Odd,
            Rule::MultipleOf3 => Rule::MultipleOf3,
        }
    }

    /// Banner text for the HUD ("POP EVEN NUMBERS!")
    pub fn banner(&self) -> &'static str {
        match self {
            Rule::Odd => "POP ODD NUMBERS!",
            Rule::Even => "POP EVEN NUMBERS!",
            Rule::MultipleOf3 => "POP MULTIPLES OF 3!",
        }
    }

    /// Game-over line for a star rating
    pub fn encouragement(&self, stars: u8) -> &'static str {
        match (stars, self) {
            (3..=u8::MAX, _) => "Amazing job! You're a math wizard!",
            (2, Rule::MultipleOf3) => "Great work! You're getting good at spotting multiples of 3!",
            (2, _) => "Great work! You're getting good at identifying odd and even numbers!",
            (1, _) => "Good effort! Keep practicing to get better!",
            (_, Rule::MultipleOf3) => {
                "Don't worry, with more practice you'll get better at multiples of 3!"
            }
            _ => "Don't worry, with more practice you'll get better at odd and even numbers!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_even() {
        assert!(Rule::Odd.classify(7));
        assert!(!Rule::Odd.classify(4));
        assert!(Rule::Even.classify(4));
        assert!(Rule::Even.classify(0));
        assert!(!Rule::Even.classify(7));
    }

    #[test]
    fn test_negative_values() {
        assert!(Rule::Odd.classify(-3));
        assert!(Rule::Even.classify(-4));
        assert!(Rule::MultipleOf3.classify(-6));
        assert!(!Rule::MultipleOf3.classify(-7));
    }

    #[test]
    fn test_multiple_of_3() {
        assert!(Rule::MultipleOf3.classify(9));
        assert!(Rule::MultipleOf3.classify(0));
        assert!(!Rule::MultipleOf3.classify(10));
    }

    #[test]
    fn test_switched() {
        assert_eq!(Rule::Odd.switched(), Rule::Even);
        assert_eq!(Rule::Even.switched(), Rule::Odd);
        assert_eq!(Rule::MultipleOf3.switched(), Rule::MultipleOf3);
    }

    #[test]
    fn test_encouragement_by_stars() {
        assert_eq!(Rule::Odd.encouragement(3), "Amazing job! You're a math wizard!");
        assert_eq!(Rule::Even.encouragement(7), Rule::Even.encouragement(3));
        assert!(Rule::Even.encouragement(2).contains("odd and even"));
        assert!(Rule::MultipleOf3.encouragement(2).contains("multiples of 3"));
        assert!(Rule::MultipleOf3.encouragement(0).contains("multiples of 3"));
        assert_eq!(
            Rule::Odd.encouragement(1),
            Rule::MultipleOf3.encouragement(1)
        );
    }

    #[test]
    fn test_from_str_round_trip() {
        for rule in [Rule::Odd, Rule::Even, Rule::MultipleOf3] {
            assert_eq!(Rule::from_str(rule.as_str()), Some(rule));
        }
        assert_eq!(Rule::from_str("EVEN"), Some(Rule::Even));
        assert_eq!(Rule::from_str("prime"), None);
    }
}
