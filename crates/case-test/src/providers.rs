//! Stand-ins for the external services CASE talks to

use std::sync::atomic::{AtomicU64, Ordering};

use case_core::{CaseError, CaseResult};
use case_visual::{ExpressionClassifier, LabelScore, RigCatalog};
use case_voice::{AudioHandle, PhonemeEvent, SpeechOutput, SpeechProvider};

/// Length given to each letter by [`LetterSpeech`]
pub const LETTER_MS: u32 = 70;

/// Speech provider that "speaks" one phoneme per letter.
///
/// Word breaks become silent gaps, so timelines built from its output
/// exercise rest insertion.
#[derive(Debug, Default)]
pub struct LetterSpeech {
    next_audio: AtomicU64,
}

impl LetterSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phonemes(text: &str) -> Vec<PhonemeEvent> {
        let mut events = Vec::new();
        let mut at = 0u32;
        for c in text.chars() {
            if c.is_alphabetic() {
                events.push(PhonemeEvent::new(c.to_lowercase().to_string(), at, at + LETTER_MS));
                at += LETTER_MS;
            } else if c.is_whitespace() {
                at += 2 * LETTER_MS;
            }
        }
        events
    }
}

impl SpeechProvider for LetterSpeech {
    fn synthesize(&self, text: &str) -> CaseResult<SpeechOutput> {
        let audio = AudioHandle(self.next_audio.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(SpeechOutput::new(audio, Self::phonemes(text)))
    }
}

/// Speech provider returning a fixed result for every request
#[derive(Debug, Clone)]
pub enum ScriptedSpeech {
    Phonemes(Vec<PhonemeEvent>),
    Unavailable(String),
}

impl ScriptedSpeech {
    pub fn silent() -> Self {
        ScriptedSpeech::Phonemes(Vec::new())
    }

    pub fn offline() -> Self {
        ScriptedSpeech::Unavailable("tts endpoint unreachable".into())
    }
}

impl SpeechProvider for ScriptedSpeech {
    fn synthesize(&self, _text: &str) -> CaseResult<SpeechOutput> {
        match self {
            ScriptedSpeech::Phonemes(events) => Ok(SpeechOutput::new(AudioHandle(1), events.clone())),
            ScriptedSpeech::Unavailable(reason) => Err(CaseError::SpeechUnavailable(reason.clone())),
        }
    }
}

/// Classifier returning fixed labels, or failing
#[derive(Debug, Clone)]
pub enum ScriptedClassifier {
    Labels(Vec<LabelScore>),
    Unavailable,
}

impl ScriptedClassifier {
    pub fn labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        ScriptedClassifier::Labels(labels.into_iter().map(LabelScore::new).collect())
    }
}

impl ExpressionClassifier for ScriptedClassifier {
    fn labels(&self, _text: &str) -> CaseResult<Vec<LabelScore>> {
        match self {
            ScriptedClassifier::Labels(labels) => Ok(labels.clone()),
            ScriptedClassifier::Unavailable => Err(CaseError::ClassificationUnavailable(
                "classifier timed out".into(),
            )),
        }
    }
}

/// Rig with every target the default maps drive
pub fn full_rig() -> RigCatalog {
    [
        "Mouth",
        "FaceSmile",
        "FaceSurprised",
        "FaceSad",
        "Head",
        "RightUpperArm",
        "RightLowerArm",
    ]
    .into_iter()
    .collect()
}

/// Head-only rig: face blendshapes, no arms
pub fn face_rig() -> RigCatalog {
    ["Mouth", "FaceSmile", "FaceSurprised", "FaceSad", "Head"]
        .into_iter()
        .collect()
}
