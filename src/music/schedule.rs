use crate::{
    narration::DuckWindow,
    rng::SeedRng,
    theme::ThemeDefinition,
};

/// Lead/lag applied around each narration window so the duck ramps never
/// click.
pub const DUCK_RAMP_SECS: f64 = 0.35;

#[derive(Clone, Debug)]
pub enum EventKind {
    /// Sustained chord voicing, one per bar.
    ChordPad { freqs: Vec<f32> },
    /// Single walking-bass note.
    BassNote { freq: f32 },
    /// Percussive noise burst.
    Percussion { accent: bool },
}

/// One scheduled source. `start`/`end` are seconds on the audio clock.
#[derive(Clone, Debug)]
pub struct AudioEvent {
    pub start: f64,
    pub end: f64,
    pub gain: f32,
    pub kind: EventKind,
}

/// The complete piece, computed in one pass before any sample is rendered.
#[derive(Clone, Debug)]
pub struct MusicSchedule {
    pub events: Vec<AudioEvent>,
    pub duration: f64,
    pub bar_secs: f64,
    pub fade_secs: f64,
    pub duck_windows: Vec<DuckWindow>,
    pub duck_depth: f32,
}

/// Build the full event schedule for a theme over `[0, duration]`:
/// a chord pad per bar, a swung walking bass per beat, percussion per
/// eighth-note subdivision. Every event satisfies `start < end` and
/// `end <= duration + one bar` (pads are allowed a tail).
pub fn build_schedule(
    theme: &ThemeDefinition,
    duration: f64,
    duck_windows: &[DuckWindow],
) -> MusicSchedule {
    let bar = theme.bar_secs();
    let beat = theme.beat_secs();
    let eighth = beat / 2.0;
    let max_end = duration + bar;

    let mut events = Vec::new();
    // Walking-bass choices are part of the schedule, so they come from a
    // stepped generator seeded only by the theme.
    let mut rng = SeedRng::new(theme.id as u64 + 1);

    let bars = (duration / bar).ceil() as usize;
    for b in 0..bars {
        let bar_start = b as f64 * bar;
        if bar_start >= duration {
            break;
        }
        let chord = theme.chords[b % theme.chords.len()];

        // Pad sustains through the bar with a slight overlap into the next.
        events.push(AudioEvent {
            start: bar_start,
            end: (bar_start + bar * 1.05).min(max_end),
            gain: 0.16,
            kind: EventKind::ChordPad {
                freqs: chord.to_vec(),
            },
        });

        for beat_idx in 0..4 {
            let swing = if beat_idx % 2 == 1 {
                theme.swing * beat
            } else {
                0.0
            };
            let note_start = bar_start + beat_idx as f64 * beat + swing;
            if note_start >= duration {
                continue;
            }
            // Walk the chord: root on the downbeat, then wander.
            let freq = if beat_idx == 0 {
                chord[0]
            } else {
                *rng.pick(chord).unwrap_or(&chord[0])
            };
            events.push(AudioEvent {
                start: note_start,
                end: (note_start + beat * 0.85).min(max_end),
                gain: 0.22,
                kind: EventKind::BassNote { freq: freq / 2.0 },
            });

            for sub in 0..2 {
                let tick_start = bar_start
                    + beat_idx as f64 * beat
                    + sub as f64 * eighth
                    + if sub == 1 { theme.swing * eighth } else { 0.0 };
                if tick_start >= duration {
                    continue;
                }
                let accent = sub == 0 && beat_idx % 2 == 0;
                events.push(AudioEvent {
                    start: tick_start,
                    end: (tick_start + 0.07).min(max_end),
                    gain: if accent { 0.10 } else { 0.05 },
                    kind: EventKind::Percussion { accent },
                });
            }
        }
    }

    MusicSchedule {
        events,
        duration,
        bar_secs: bar,
        fade_secs: (duration * 0.08).min(1.2),
        duck_windows: duck_windows.to_vec(),
        duck_depth: theme.duck_depth,
    }
}

impl MusicSchedule {
    /// Master bus gain at `t`: edge fades multiplied by the duck envelope.
    pub fn master_gain(&self, t: f64) -> f32 {
        (self.fade_gain(t) * self.duck_gain(t)) as f32
    }

    fn fade_gain(&self, t: f64) -> f64 {
        if self.fade_secs <= 0.0 {
            return 1.0;
        }
        let fade_in = (t / self.fade_secs).clamp(0.0, 1.0);
        let fade_out = ((self.duration - t) / self.fade_secs).clamp(0.0, 1.0);
        fade_in.min(fade_out)
    }

    /// Ramp down ahead of each window, hold at the duck depth, ramp back up
    /// after. Schedule-driven sidechaining; nothing is signal-detected.
    fn duck_gain(&self, t: f64) -> f64 {
        let depth = f64::from(self.duck_depth);
        let mut gain: f64 = 1.0;
        for w in &self.duck_windows {
            let g = if t >= w.start_secs && t <= w.end_secs {
                depth
            } else if t >= w.start_secs - DUCK_RAMP_SECS && t < w.start_secs {
                let f = (w.start_secs - t) / DUCK_RAMP_SECS;
                depth + (1.0 - depth) * f
            } else if t > w.end_secs && t <= w.end_secs + DUCK_RAMP_SECS {
                let f = (t - w.end_secs) / DUCK_RAMP_SECS;
                depth + (1.0 - depth) * f
            } else {
                1.0
            };
            gain = gain.min(g);
        }
        gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ThemeId, definition};

    #[test]
    fn every_event_is_bounded_for_all_themes_and_durations() {
        for id in ThemeId::ALL {
            let theme = definition(id);
            for duration in [15.0, 30.0, 45.0, 60.0] {
                let schedule = build_schedule(theme, duration, &[]);
                assert!(!schedule.events.is_empty());
                for ev in &schedule.events {
                    assert!(ev.start < ev.end, "{id:?}: start must precede end");
                    assert!(
                        ev.end <= duration + theme.bar_secs() + 1e-9,
                        "{id:?}: event end exceeds duration plus one bar"
                    );
                    assert!(ev.start >= 0.0);
                    assert!(ev.gain > 0.0);
                }
            }
        }
    }

    #[test]
    fn schedule_is_deterministic_per_theme() {
        let theme = definition(ThemeId::Bossa);
        let a = build_schedule(theme, 30.0, &[]);
        let b = build_schedule(theme, 30.0, &[]);
        assert_eq!(a.events.len(), b.events.len());
        for (x, y) in a.events.iter().zip(&b.events) {
            assert_eq!(x.start, y.start);
            assert_eq!(x.gain, y.gain);
        }
    }

    #[test]
    fn master_gain_fades_at_extremes() {
        let theme = definition(ThemeId::Lounge);
        let schedule = build_schedule(theme, 30.0, &[]);
        assert_eq!(schedule.master_gain(0.0), 0.0);
        assert_eq!(schedule.master_gain(30.0), 0.0);
        assert!((schedule.master_gain(15.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn duck_holds_depth_inside_window_and_ramps_outside() {
        let theme = definition(ThemeId::Festa);
        let window = DuckWindow {
            start_secs: 10.0,
            end_secs: 14.0,
        };
        let schedule = build_schedule(theme, 30.0, &[window]);
        let depth = f64::from(theme.duck_depth);

        assert!((f64::from(schedule.master_gain(12.0)) - depth).abs() < 1e-6);
        // Mid-ramp values sit strictly between depth and full gain.
        let down = f64::from(schedule.master_gain(10.0 - DUCK_RAMP_SECS / 2.0));
        assert!(down > depth && down < 1.0);
        let up = f64::from(schedule.master_gain(14.0 + DUCK_RAMP_SECS / 2.0));
        assert!(up > depth && up < 1.0);
        // Well clear of the window the bus is back at unity.
        assert!((f64::from(schedule.master_gain(20.0)) - 1.0).abs() < 1e-6);
    }
}
