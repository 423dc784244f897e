/// Named music themes driving procedural synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    Bossa,
    Lounge,
    Festa,
    Acustico,
    Noite,
}

impl ThemeId {
    pub const ALL: [ThemeId; 5] = [
        Self::Bossa,
        Self::Lounge,
        Self::Festa,
        Self::Acustico,
        Self::Noite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bossa => "bossa",
            Self::Lounge => "lounge",
            Self::Festa => "festa",
            Self::Acustico => "acustico",
            Self::Noite => "noite",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
}

#[derive(Clone, Copy, Debug)]
pub struct ReverbParams {
    pub delay_secs: f64,
    pub feedback: f32,
    pub mix: f32,
}

/// Static bundle of tempo, harmony and timbre for one theme.
#[derive(Clone, Debug)]
pub struct ThemeDefinition {
    pub id: ThemeId,
    pub tempo_bpm: f64,
    /// Ordered progression; each chord is a set of fundamental frequencies in Hz.
    pub chords: &'static [&'static [f32]],
    pub pad_wave: Waveform,
    pub bass_wave: Waveform,
    /// 0..1, scales the percussion noise-burst highpass character.
    pub percussion_brightness: f32,
    pub reverb: ReverbParams,
    /// Gain the master bus is held at inside narration windows (0..1).
    pub duck_depth: f32,
    /// Swing applied to off-beat events as a fraction of one beat.
    pub swing: f64,
}

impl ThemeDefinition {
    pub fn beat_secs(&self) -> f64 {
        60.0 / self.tempo_bpm
    }

    /// 4/4 throughout.
    pub fn bar_secs(&self) -> f64 {
        self.beat_secs() * 4.0
    }
}

// Chords are spelled as stacked frequencies (Hz), roughly A2..E5 territory.
const AM7: &[f32] = &[110.0, 130.81, 164.81, 196.0];
const DM7: &[f32] = &[146.83, 174.61, 220.0, 261.63];
const G7: &[f32] = &[98.0, 123.47, 146.83, 174.61];
const CMAJ7: &[f32] = &[130.81, 164.81, 196.0, 246.94];
const FMAJ7: &[f32] = &[87.31, 110.0, 130.81, 164.81];
const EM7: &[f32] = &[82.41, 103.83, 123.47, 146.83];
const E7: &[f32] = &[82.41, 103.83, 123.47, 155.56];
const AMIN: &[f32] = &[110.0, 130.81, 164.81];
const CMAJ: &[f32] = &[130.81, 164.81, 196.0];
const GMAJ: &[f32] = &[98.0, 123.47, 146.83];
const FMAJ: &[f32] = &[87.31, 110.0, 130.81];

pub fn definition(id: ThemeId) -> &'static ThemeDefinition {
    match id {
        ThemeId::Bossa => &ThemeDefinition {
            id: ThemeId::Bossa,
            tempo_bpm: 128.0,
            chords: &[AM7, DM7, G7, CMAJ7],
            pad_wave: Waveform::Sine,
            bass_wave: Waveform::Triangle,
            percussion_brightness: 0.55,
            reverb: ReverbParams {
                delay_secs: 0.21,
                feedback: 0.32,
                mix: 0.22,
            },
            duck_depth: 0.30,
            swing: 0.14,
        },
        ThemeId::Lounge => &ThemeDefinition {
            id: ThemeId::Lounge,
            tempo_bpm: 92.0,
            chords: &[CMAJ7, FMAJ7, EM7, AM7],
            pad_wave: Waveform::Sine,
            bass_wave: Waveform::Sine,
            percussion_brightness: 0.30,
            reverb: ReverbParams {
                delay_secs: 0.30,
                feedback: 0.42,
                mix: 0.30,
            },
            duck_depth: 0.25,
            swing: 0.08,
        },
        ThemeId::Festa => &ThemeDefinition {
            id: ThemeId::Festa,
            tempo_bpm: 150.0,
            chords: &[AMIN, CMAJ, GMAJ, FMAJ],
            pad_wave: Waveform::Saw,
            bass_wave: Waveform::Saw,
            percussion_brightness: 0.85,
            reverb: ReverbParams {
                delay_secs: 0.16,
                feedback: 0.25,
                mix: 0.15,
            },
            duck_depth: 0.35,
            swing: 0.05,
        },
        ThemeId::Acustico => &ThemeDefinition {
            id: ThemeId::Acustico,
            tempo_bpm: 104.0,
            chords: &[GMAJ, CMAJ, EM7, DM7],
            pad_wave: Waveform::Triangle,
            bass_wave: Waveform::Triangle,
            percussion_brightness: 0.40,
            reverb: ReverbParams {
                delay_secs: 0.24,
                feedback: 0.30,
                mix: 0.20,
            },
            duck_depth: 0.28,
            swing: 0.12,
        },
        ThemeId::Noite => &ThemeDefinition {
            id: ThemeId::Noite,
            tempo_bpm: 76.0,
            chords: &[AM7, FMAJ7, E7, AM7],
            pad_wave: Waveform::Sine,
            bass_wave: Waveform::Sine,
            percussion_brightness: 0.20,
            reverb: ReverbParams {
                delay_secs: 0.36,
                feedback: 0.48,
                mix: 0.34,
            },
            duck_depth: 0.22,
            swing: 0.10,
        },
    }
}

/// Map cuisine/mood strings onto a theme for `MusicChoice::Auto`.
///
/// Mood wins over cuisine; everything unrecognized lands on `Lounge`.
pub fn resolve_auto(cuisine: Option<&str>, mood: Option<&str>) -> ThemeId {
    if let Some(mood) = mood {
        match mood.trim().to_ascii_lowercase().as_str() {
            "festivo" | "animado" | "energetic" | "party" => return ThemeId::Festa,
            "romantico" | "romantic" | "intimo" => return ThemeId::Noite,
            "tranquilo" | "calm" | "relaxado" => return ThemeId::Acustico,
            _ => {}
        }
    }
    match cuisine.map(|c| c.trim().to_ascii_lowercase()) {
        Some(c) if matches!(c.as_str(), "brasileira" | "baiana" | "mineira") => ThemeId::Bossa,
        Some(c) if matches!(c.as_str(), "churrasco" | "mexicana" | "hamburgueria") => {
            ThemeId::Festa
        }
        Some(c) if matches!(c.as_str(), "italiana" | "francesa" | "vinhos") => ThemeId::Noite,
        Some(c) if matches!(c.as_str(), "cafeteria" | "padaria" | "vegetariana" | "vegana") => {
            ThemeId::Acustico
        }
        _ => ThemeId::Lounge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_nonempty_progression() {
        for id in ThemeId::ALL {
            let def = definition(id);
            assert_eq!(def.id, id);
            assert!(!def.chords.is_empty());
            for chord in def.chords {
                assert!(!chord.is_empty());
                for &f in chord.iter() {
                    assert!(f > 20.0 && f < 2000.0);
                }
            }
            assert!(def.tempo_bpm > 40.0 && def.tempo_bpm < 220.0);
            assert!(def.duck_depth > 0.0 && def.duck_depth < 1.0);
        }
    }

    #[test]
    fn auto_resolution_prefers_mood() {
        assert_eq!(
            resolve_auto(Some("italiana"), Some("festivo")),
            ThemeId::Festa
        );
        assert_eq!(resolve_auto(Some("italiana"), None), ThemeId::Noite);
        assert_eq!(resolve_auto(None, None), ThemeId::Lounge);
        assert_eq!(resolve_auto(Some("desconhecida"), None), ThemeId::Lounge);
    }
}
