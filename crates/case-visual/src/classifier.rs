//! Expression Classifier Adapter
//!
//! Wraps an external sentiment/expression classifier. The adapter never fails
//! a turn: an unavailable classifier or unrecognised labels degrade to
//! `Neutral` and are reported as warnings.

use case_core::{CaseError, CaseResult, Outcome};
use tracing::{debug, warn};

use crate::{Expression, ExpressiveIntent};

/// One label emitted by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    /// Confidence [0.0 - 1.0], if the classifier reports one
    pub score: Option<f32>,
}

impl LabelScore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            score: None,
        }
    }

    pub fn scored(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: Some(score),
        }
    }
}

/// External classifier contract
pub trait ExpressionClassifier {
    /// Labels for `text`, in any order.
    /// Unavailability is reported as `CaseError::ClassificationUnavailable`.
    fn labels(&self, text: &str) -> CaseResult<Vec<LabelScore>>;
}

impl<C: ExpressionClassifier + ?Sized> ExpressionClassifier for Box<C> {
    fn labels(&self, text: &str) -> CaseResult<Vec<LabelScore>> {
        (**self).labels(text)
    }
}

/// Keyword classifier - whole-word, case-insensitive keyword table
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: Vec<(Expression, Vec<String>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let table: [(Expression, &[&str]); 5] = [
            (
                Expression::Wave,
                &["hello", "hi", "hey", "bye", "goodbye", "welcome", "farewell"],
            ),
            (
                Expression::Smile,
                &[
                    "happy", "glad", "great", "love", "wonderful", "delighted", "pleased",
                    "smile", "awesome", "fantastic",
                ],
            ),
            (
                Expression::Surprise,
                &["wow", "amazing", "incredible", "unbelievable", "surprising", "whoa"],
            ),
            (
                Expression::Frown,
                &["sad", "sorry", "unfortunately", "upset", "terrible", "afraid"],
            ),
            (
                Expression::Nod,
                &["yes", "agree", "exactly", "indeed", "sure", "right", "correct"],
            ),
        ];

        let mut classifier = KeywordClassifier { table: Vec::new() };
        for (expression, words) in table {
            classifier.add_keywords(expression, words.iter().copied());
        }
        classifier
    }
}

impl KeywordClassifier {
    /// Empty table; everything classifies as Neutral
    pub fn empty() -> Self {
        Self { table: Vec::new() }
    }

    pub fn add_keywords<'a>(
        &mut self,
        expression: Expression,
        words: impl IntoIterator<Item = &'a str>,
    ) {
        let words = words.into_iter().map(|w| w.to_lowercase());
        match self.table.iter_mut().find(|(e, _)| *e == expression) {
            Some((_, existing)) => existing.extend(words),
            None => self.table.push((expression, words.collect())),
        }
    }
}

impl ExpressionClassifier for KeywordClassifier {
    fn labels(&self, text: &str) -> CaseResult<Vec<LabelScore>> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        Ok(self
            .table
            .iter()
            .filter(|(_, keywords)| words.iter().any(|w| keywords.iter().any(|k| k == w)))
            .map(|(expression, _)| LabelScore::new(expression.name()))
            .collect())
    }
}

/// Expression Classifier Adapter
#[derive(Debug, Clone, Default)]
pub struct ClassifierAdapter<C> {
    classifier: C,
}

impl<C: ExpressionClassifier> ClassifierAdapter<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Intent for `text`; Neutral whenever the classifier cannot say
    pub fn classify(&self, text: &str) -> ExpressiveIntent {
        self.classify_reported(text).value
    }

    /// Intent for `text` with the degradation warnings raised on the way
    pub fn classify_reported(&self, text: &str) -> Outcome<ExpressiveIntent> {
        let labels = match self.classifier.labels(text) {
            Ok(labels) => labels,
            Err(err) => {
                warn!(error = %err, "expression classifier unavailable, using neutral");
                let err = match err {
                    CaseError::ClassificationUnavailable(_) => err,
                    other => CaseError::ClassificationUnavailable(other.to_string()),
                };
                return Outcome::with_warnings(ExpressiveIntent::neutral(), vec![err]);
            }
        };

        let mut outcome = Outcome::clean(ExpressiveIntent::neutral());
        let mut matched: Vec<(Expression, Option<f32>)> = Vec::new();

        for label in labels {
            let Some(expression) = Expression::from_label(&label.label) else {
                debug!(label = %label.label, "unrecognized expression label");
                outcome.warn(CaseError::UnrecognizedLabel(label.label));
                continue;
            };
            matched.push((expression, label.score));
        }

        if let Some(expression) = Expression::strongest(matched.iter().map(|(e, _)| *e)) {
            let score = matched
                .iter()
                .filter(|(e, _)| *e == expression)
                .filter_map(|(_, score)| *score)
                .filter(|s| s.is_finite())
                .reduce(f32::max);
            let mut intent = ExpressiveIntent::new(expression);
            if let Some(score) = score {
                intent = intent.with_intensity(score);
            }
            outcome.value = intent;
        }

        outcome
    }
}
