use crate::{
    music::schedule::{AudioEvent, EventKind, MusicSchedule},
    rng::SeedRng,
    theme::{ThemeDefinition, Waveform},
};

pub const MIX_SAMPLE_RATE: u32 = 44_100;
pub const MIX_CHANNELS: u16 = 2;

/// A fully rendered audio bus: interleaved stereo f32 at 44.1 kHz.
#[derive(Clone, Debug)]
pub struct MusicBus {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl MusicBus {
    pub fn silence(duration_secs: f64) -> Self {
        let frames = (duration_secs.max(0.0) * f64::from(MIX_SAMPLE_RATE)).round() as usize;
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            samples: vec![0.0; frames * usize::from(MIX_CHANNELS)],
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    /// Accumulate another interleaved stereo buffer starting at an offset.
    pub fn mix_in(&mut self, other: &[f32], offset_secs: f64, gain: f32) {
        let offset = (offset_secs.max(0.0) * f64::from(self.sample_rate)).round() as usize
            * usize::from(self.channels);
        for (i, &s) in other.iter().enumerate() {
            let Some(dst) = self.samples.get_mut(offset + i) else {
                break;
            };
            *dst = (*dst + s * gain).clamp(-1.0, 1.0);
        }
    }
}

/// Render a schedule into PCM. Pure math over the event list; the master
/// fade/duck envelope and the theme reverb are applied on the summed bus.
pub fn render_schedule(schedule: &MusicSchedule, theme: &ThemeDefinition) -> MusicBus {
    let sr = f64::from(MIX_SAMPLE_RATE);
    let frames = (schedule.duration * sr).round() as usize;
    let mut left = vec![0.0f32; frames];
    let mut right = vec![0.0f32; frames];

    for (idx, ev) in schedule.events.iter().enumerate() {
        render_event(ev, idx as u64, theme, sr, &mut left, &mut right);
    }

    apply_reverb(&mut left, theme, sr);
    apply_reverb(&mut right, theme, sr);

    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let g = schedule.master_gain(i as f64 / sr);
        samples.push((left[i] * g).clamp(-1.0, 1.0));
        samples.push((right[i] * g).clamp(-1.0, 1.0));
    }

    MusicBus {
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        samples,
    }
}

fn render_event(
    ev: &AudioEvent,
    index: u64,
    theme: &ThemeDefinition,
    sr: f64,
    left: &mut [f32],
    right: &mut [f32],
) {
    let start = (ev.start * sr).round() as usize;
    let end = ((ev.end * sr).round() as usize).min(left.len());
    if start >= end {
        return;
    }
    let len_secs = ev.end - ev.start;

    match &ev.kind {
        EventKind::ChordPad { freqs } => {
            let attack = (len_secs * 0.25).min(0.5);
            let release = (len_secs * 0.25).min(0.6);
            let per_voice = ev.gain / freqs.len().max(1) as f32;
            for i in start..end {
                let t = i as f64 / sr - ev.start;
                let env = envelope(t, len_secs, attack, release);
                let mut v = 0.0f32;
                for &f in freqs {
                    v += oscillator(theme.pad_wave, f, t) * per_voice;
                }
                let v = v * env;
                left[i] += v;
                right[i] += v;
            }
        }
        EventKind::BassNote { freq } => {
            for i in start..end {
                let t = i as f64 / sr - ev.start;
                let env = envelope(t, len_secs, 0.01, 0.12);
                let v = oscillator(theme.bass_wave, *freq, t) * ev.gain * env;
                left[i] += v;
                right[i] += v;
            }
        }
        EventKind::Percussion { accent } => {
            let mut rng = SeedRng::new(index.wrapping_mul(0x5851_F42D_4C95_7F2D));
            let decay = if *accent { 0.035 } else { 0.02 };
            let bright = theme.percussion_brightness;
            let mut prev = 0.0f32;
            // Alternate bursts sit slightly off-center.
            let (lg, rg) = if index % 2 == 0 { (1.0, 0.7) } else { (0.7, 1.0) };
            for i in start..end {
                let t = i as f64 / sr - ev.start;
                let noise = rng.next_f32() * 2.0 - 1.0;
                // First difference approximates a highpass for brighter kits.
                let shaped = noise * (1.0 - bright) + (noise - prev) * bright;
                prev = noise;
                let env = (-t / decay).exp() as f32;
                let v = shaped * ev.gain * env;
                left[i] += v * lg;
                right[i] += v * rg;
            }
        }
    }
}

fn envelope(t: f64, len: f64, attack: f64, release: f64) -> f32 {
    let a = if attack > 0.0 {
        (t / attack).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let r = if release > 0.0 {
        ((len - t) / release).clamp(0.0, 1.0)
    } else {
        1.0
    };
    a.min(r) as f32
}

fn oscillator(wave: Waveform, freq: f32, t: f64) -> f32 {
    let phase = (f64::from(freq) * t).fract();
    match wave {
        Waveform::Sine => (phase * std::f64::consts::TAU).sin() as f32,
        Waveform::Triangle => (4.0 * (phase - 0.5).abs() - 1.0) as f32,
        // Saws are scaled down; otherwise they dominate the mix.
        Waveform::Saw => ((2.0 * phase - 1.0) * 0.6) as f32,
    }
}

/// Single feedback delay line, the cheapest plausible room.
fn apply_reverb(channel: &mut [f32], theme: &ThemeDefinition, sr: f64) {
    let delay = (theme.reverb.delay_secs * sr).round() as usize;
    if delay == 0 || delay >= channel.len() {
        return;
    }
    let feedback = theme.reverb.feedback;
    let mix = theme.reverb.mix;
    for i in delay..channel.len() {
        let echo = channel[i - delay] * feedback;
        channel[i] += echo * mix;
    }
}
