//! Speech provider contract
//!
//! Synthesis happens outside CASE. The provider hands back an opaque handle
//! to the audio it produced and the phoneme timing for that audio; CASE
//! never reads the audio itself.

use case_core::CaseResult;

use crate::PhonemeEvent;

/// Opaque reference to synthesized audio owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// Result of one synthesis request
#[derive(Debug, Clone)]
pub struct SpeechOutput {
    /// Audio to be played by the host
    pub audio: AudioHandle,
    /// Phoneme timing relative to the start of `audio`
    pub phonemes: Vec<PhonemeEvent>,
}

impl SpeechOutput {
    pub fn new(audio: AudioHandle, phonemes: Vec<PhonemeEvent>) -> Self {
        Self { audio, phonemes }
    }
}

/// External text-to-speech provider
///
/// Implementations report failures as `CaseError::SpeechUnavailable`; the
/// caller degrades to a closed-mouth hold rather than failing the turn.
pub trait SpeechProvider {
    fn synthesize(&self, text: &str) -> CaseResult<SpeechOutput>;
}

impl<P: SpeechProvider + ?Sized> SpeechProvider for Box<P> {
    fn synthesize(&self, text: &str) -> CaseResult<SpeechOutput> {
        (**self).synthesize(text)
    }
}
