//! Phonemes and their mouth-shape classes

/// Mouth shape class for a phoneme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PhonemeClass {
    #[default]
    Rest, // Closed/neutral
    AA, // "ah" as in "father"
    AO, // "aw" as in "bought"
    EH, // "eh" as in "bed"
    IY, // "ee" as in "see"
    UW, // "oo" as in "boot"
    OW, // "oh" as in "boat"
    AE, // "a" as in "cat"
    AW, // "ow" as in "cow"
    EY, // "ay" as in "say"
    ER, // "er" as in "bird"
    PP, // "p", "b", "m" (lips together)
    FF, // "f", "v" (teeth on lip)
    TH, // "th" (tongue between teeth)
    DD, // "d", "t", "l" (tongue on ridge)
    KK, // "k", "g" (back of tongue)
    CH, // "ch", "j", "sh" (lips rounded)
    SS, // "s", "z" (teeth together)
    RR, // "r" (lips slightly rounded)
    NN, // "n", "ng" (nasal)
}

impl PhonemeClass {
    /// All classes in declaration order
    pub const ALL: [PhonemeClass; 20] = [
        PhonemeClass::Rest,
        PhonemeClass::AA,
        PhonemeClass::AO,
        PhonemeClass::EH,
        PhonemeClass::IY,
        PhonemeClass::UW,
        PhonemeClass::OW,
        PhonemeClass::AE,
        PhonemeClass::AW,
        PhonemeClass::EY,
        PhonemeClass::ER,
        PhonemeClass::PP,
        PhonemeClass::FF,
        PhonemeClass::TH,
        PhonemeClass::DD,
        PhonemeClass::KK,
        PhonemeClass::CH,
        PhonemeClass::SS,
        PhonemeClass::RR,
        PhonemeClass::NN,
    ];

    /// Classify a provider phoneme symbol.
    ///
    /// Accepts ARPAbet (stress digits ignored, so `AH0` is `ah`), single
    /// letters, and the usual silence markers. Anything unknown is `Rest`.
    pub fn from_phoneme(phoneme: &str) -> Self {
        let symbol = phoneme
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_ascii_lowercase();

        match symbol.as_str() {
            "" | "sil" | "sp" | "spn" | "pau" | "_" | "#" => PhonemeClass::Rest,
            "aa" | "ah" | "ax" => PhonemeClass::AA,
            "ao" => PhonemeClass::AO,
            "eh" | "e" => PhonemeClass::EH,
            "iy" | "ih" | "ee" | "i" | "y" => PhonemeClass::IY,
            "uw" | "uh" | "oo" | "u" | "w" => PhonemeClass::UW,
            "ow" | "oy" | "oh" | "o" => PhonemeClass::OW,
            "ae" | "a" => PhonemeClass::AE,
            "aw" => PhonemeClass::AW,
            "ey" | "ay" => PhonemeClass::EY,
            "er" | "axr" => PhonemeClass::ER,
            "p" | "b" | "m" => PhonemeClass::PP,
            "f" | "v" => PhonemeClass::FF,
            "th" | "dh" => PhonemeClass::TH,
            "d" | "t" | "l" => PhonemeClass::DD,
            "k" | "g" | "hh" | "h" => PhonemeClass::KK,
            "ch" | "jh" | "j" | "sh" | "zh" => PhonemeClass::CH,
            "s" | "z" => PhonemeClass::SS,
            "r" => PhonemeClass::RR,
            "n" | "ng" => PhonemeClass::NN,
            _ => PhonemeClass::Rest,
        }
    }

    /// Jaw openness for this shape (0.0 = closed, 1.0 = fully open)
    pub fn openness(self) -> f32 {
        match self {
            PhonemeClass::Rest => 0.0,
            PhonemeClass::PP => 0.05,
            PhonemeClass::FF | PhonemeClass::SS => 0.2,
            PhonemeClass::NN => 0.25,
            PhonemeClass::TH | PhonemeClass::RR => 0.3,
            PhonemeClass::DD | PhonemeClass::CH | PhonemeClass::IY => 0.35,
            PhonemeClass::KK | PhonemeClass::UW => 0.4,
            PhonemeClass::ER => 0.45,
            PhonemeClass::EY => 0.55,
            PhonemeClass::EH => 0.6,
            PhonemeClass::OW => 0.7,
            PhonemeClass::AE => 0.8,
            PhonemeClass::AO => 0.85,
            PhonemeClass::AW => 0.9,
            PhonemeClass::AA => 1.0,
        }
    }

    pub fn is_rest(self) -> bool {
        self == PhonemeClass::Rest
    }
}

/// One raw timing event from a speech provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeEvent {
    /// Provider phoneme symbol
    pub phoneme: String,
    /// Start offset from audio start, milliseconds
    pub start_ms: u32,
    /// End offset from audio start, milliseconds
    pub end_ms: u32,
}

impl PhonemeEvent {
    pub fn new(phoneme: impl Into<String>, start_ms: u32, end_ms: u32) -> Self {
        Self {
            phoneme: phoneme.into(),
            start_ms,
            end_ms,
        }
    }

    /// Zero or negative length events carry no mouth shape
    pub fn is_degenerate(&self) -> bool {
        self.end_ms <= self.start_ms
    }

    pub fn class(&self) -> PhonemeClass {
        PhonemeClass::from_phoneme(&self.phoneme)
    }
}

impl<S: Into<String>> From<(S, u32, u32)> for PhonemeEvent {
    fn from((phoneme, start_ms, end_ms): (S, u32, u32)) -> Self {
        PhonemeEvent::new(phoneme, start_ms, end_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arpabet_with_stress() {
        assert_eq!(PhonemeClass::from_phoneme("AH0"), PhonemeClass::AA);
        assert_eq!(PhonemeClass::from_phoneme("IY1"), PhonemeClass::IY);
        assert_eq!(PhonemeClass::from_phoneme("m"), PhonemeClass::PP);
        assert_eq!(PhonemeClass::from_phoneme("S"), PhonemeClass::SS);
    }

    #[test]
    fn test_silence_and_unknown() {
        assert_eq!(PhonemeClass::from_phoneme("sil"), PhonemeClass::Rest);
        assert_eq!(PhonemeClass::from_phoneme(""), PhonemeClass::Rest);
        assert_eq!(PhonemeClass::from_phoneme("qq"), PhonemeClass::Rest);
    }

    #[test]
    fn test_openness_bounds() {
        for class in PhonemeClass::ALL {
            let o = class.openness();
            assert!((0.0..=1.0).contains(&o), "{:?} -> {}", class, o);
        }
        assert_eq!(PhonemeClass::Rest.openness(), 0.0);
        assert!(PhonemeClass::AA.openness() > PhonemeClass::PP.openness());
    }

    #[test]
    fn test_event_from_tuple() {
        let event: PhonemeEvent = ("A", 0, 100).into();
        assert_eq!(event.class(), PhonemeClass::AE);
        assert!(!event.is_degenerate());
        assert!(PhonemeEvent::new("E", 50, 50).is_degenerate());
    }
}
