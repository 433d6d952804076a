//! Expressive intent - what the character should convey for one response
//!
//! A finite set of expressions with a fixed priority order. When several
//! expressions match a response, the one earliest in [`Expression::PRIORITY`]
//! wins, so classification never depends on match order in the text.

/// Discrete expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Expression {
    #[default]
    Neutral,
    Smile,
    Wave,
    Surprise,
    Frown,
    Nod,
}

impl Expression {
    /// Tie-break order, highest priority first
    pub const PRIORITY: [Expression; 6] = [
        Expression::Wave,
        Expression::Smile,
        Expression::Surprise,
        Expression::Frown,
        Expression::Nod,
        Expression::Neutral,
    ];

    /// Rank in `PRIORITY` (0 = wins every tie)
    pub fn rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|e| *e == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    pub fn name(self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Smile => "smile",
            Expression::Wave => "wave",
            Expression::Surprise => "surprise",
            Expression::Frown => "frown",
            Expression::Nod => "nod",
        }
    }

    /// Map a classifier label, accepting common synonyms
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "neutral" | "none" | "calm" => Some(Expression::Neutral),
            "smile" | "happy" | "joy" | "positive" | "amused" => Some(Expression::Smile),
            "wave" | "greeting" | "farewell" | "hello" | "goodbye" => Some(Expression::Wave),
            "surprise" | "surprised" | "astonished" => Some(Expression::Surprise),
            "frown" | "sad" | "sadness" | "negative" | "concerned" => Some(Expression::Frown),
            "nod" | "agree" | "agreement" | "affirm" => Some(Expression::Nod),
            _ => None,
        }
    }

    /// Pick the highest-priority expression from a set of matches
    pub fn strongest<I: IntoIterator<Item = Expression>>(matches: I) -> Option<Expression> {
        matches.into_iter().min_by_key(|e| e.rank())
    }
}

/// Expression plus optional strength, produced once per response
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressiveIntent {
    pub expression: Expression,
    /// Strength [0.0 - 1.0]; `None` means full strength
    pub intensity: Option<f32>,
}

impl ExpressiveIntent {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            intensity: None,
        }
    }

    pub fn neutral() -> Self {
        Self::new(Expression::Neutral)
    }

    /// Set the strength, clamped to [0, 1]. A NaN or infinite score leaves
    /// the intent at full strength.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity
            .is_finite()
            .then(|| intensity.clamp(0.0, 1.0));
        self
    }

    /// Effective strength
    pub fn strength(&self) -> f32 {
        self.intensity.unwrap_or(1.0)
    }

    pub fn is_neutral(&self) -> bool {
        self.expression == Expression::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Expression::Wave.rank() < Expression::Smile.rank());
        assert!(Expression::Smile.rank() < Expression::Neutral.rank());
        assert_eq!(
            Expression::strongest([Expression::Smile, Expression::Nod, Expression::Wave]),
            Some(Expression::Wave)
        );
        assert_eq!(Expression::strongest([]), None);
    }

    #[test]
    fn test_label_synonyms() {
        assert_eq!(Expression::from_label("Joy"), Some(Expression::Smile));
        assert_eq!(Expression::from_label(" greeting "), Some(Expression::Wave));
        assert_eq!(Expression::from_label("confused"), None);
    }

    #[test]
    fn test_intensity_clamped() {
        let intent = ExpressiveIntent::new(Expression::Smile).with_intensity(1.4);
        assert_eq!(intent.intensity, Some(1.0));
        assert_eq!(ExpressiveIntent::neutral().strength(), 1.0);
    }

    #[test]
    fn test_non_finite_intensity_ignored() {
        for score in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let intent = ExpressiveIntent::new(Expression::Smile).with_intensity(score);
            assert_eq!(intent.intensity, None);
            assert_eq!(intent.strength(), 1.0);
        }
    }
}
