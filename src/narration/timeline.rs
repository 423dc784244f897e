use crate::request::{ScriptSegment, SegmentKind};

/// Fraction of the normalized timeline reserved for speech.
const SPEECH_SPAN: f64 = 0.8;
/// Silent lead-in before the first segment.
const LEAD_IN: f64 = 0.08;
/// Hard ceiling for the last segment's end.
const TAIL_CLAMP: f64 = 0.95;
/// Fixed inter-segment gap, as a fraction of the whole timeline.
const SEGMENT_GAP: f64 = 0.05;
/// Each fade ramp spans this fraction of the segment's own duration.
const FADE_SPAN: f64 = 0.12;

/// A script segment with its timing window assigned, as fractions of the
/// total duration. Ordered and non-overlapping by construction.
#[derive(Clone, Debug)]
pub struct NarrationSegment {
    pub kind: SegmentKind,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug)]
pub struct NarrationTimeline {
    pub segments: Vec<NarrationSegment>,
    /// Whole script joined, for single-call TTS.
    pub full_text: String,
    pub duration_secs: f64,
}

/// Ducking window in seconds, handed to the audio engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Segment located at a given `t`, with its local progress and caption alpha.
#[derive(Clone, Debug)]
pub struct ActiveSegment {
    pub index: usize,
    pub progress: f64,
    pub alpha: f64,
}

/// Spread a flat script across the normalized timeline: 80% of it goes to
/// speech, split evenly, minus a fixed 5% gap between segments, starting at
/// 8% and clamping the final end to 95%.
pub fn build_timeline(script: &[ScriptSegment], duration_secs: f64) -> NarrationTimeline {
    let n = script.len();
    let mut segments = Vec::with_capacity(n);
    if n > 0 {
        let slot = SPEECH_SPAN / n as f64;
        // For unrealistically dense scripts the fixed gap would swallow a
        // whole slot; shrink it there so every segment keeps positive length.
        let gap = SEGMENT_GAP.min(slot * 0.5);
        for (i, seg) in script.iter().enumerate() {
            let start = LEAD_IN + slot * i as f64;
            let end = (start + slot - gap).min(TAIL_CLAMP);
            segments.push(NarrationSegment {
                kind: seg.kind,
                text: seg.text.clone(),
                start,
                end,
            });
        }
    }

    let full_text = script
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(". ");

    NarrationTimeline {
        segments,
        full_text,
        duration_secs,
    }
}

impl NarrationTimeline {
    /// Windows for schedule-driven sidechain ducking, in seconds.
    pub fn duck_windows(&self) -> Vec<DuckWindow> {
        self.segments
            .iter()
            .map(|s| DuckWindow {
                start_secs: s.start * self.duration_secs,
                end_secs: s.end * self.duration_secs,
            })
            .collect()
    }
}

/// Return the (at most one) segment containing `t`, with linear progress and
/// a fade alpha: min of a fade-in and fade-out ramp, each spanning 12% of the
/// segment's own duration. Very short segments lose visible time to the
/// fades; that tightness is intended.
pub fn find_active_segment(timeline: &NarrationTimeline, t: f64) -> Option<ActiveSegment> {
    for (index, seg) in timeline.segments.iter().enumerate() {
        if t >= seg.start && t < seg.end {
            let span = seg.end - seg.start;
            if span <= 0.0 {
                return None;
            }
            let progress = ((t - seg.start) / span).clamp(0.0, 1.0);
            let fade = span * FADE_SPAN;
            let fade_in = ((t - seg.start) / fade).clamp(0.0, 1.0);
            let fade_out = ((seg.end - t) / fade).clamp(0.0, 1.0);
            return Some(ActiveSegment {
                index,
                progress,
                alpha: fade_in.min(fade_out),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(texts: &[&str]) -> Vec<ScriptSegment> {
        texts
            .iter()
            .map(|t| ScriptSegment {
                kind: SegmentKind::Dish,
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn segments_are_ordered_nonoverlapping_and_positive() {
        for n in 1..=8 {
            let texts: Vec<String> = (0..n).map(|i| format!("seg {i}")).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let tl = build_timeline(&script(&refs), 30.0);
            assert_eq!(tl.segments.len(), n);
            let mut prev_end = 0.0;
            for seg in &tl.segments {
                assert!(seg.start >= 0.08 - 1e-9);
                assert!(seg.end <= 0.95 + 1e-9);
                assert!(seg.end > seg.start, "segment must have positive duration");
                assert!(seg.start >= prev_end);
                prev_end = seg.end;
            }
        }
    }

    #[test]
    fn two_segment_gap_matches_allocation() {
        // Scenario: ["Bem-vindo", "Peça já"], 30s.
        let tl = build_timeline(&script(&["Bem-vindo", "Peça já"]), 30.0);
        let a = &tl.segments[0];
        let b = &tl.segments[1];
        assert!((a.end + 0.05 - b.start).abs() < 1e-9);
        assert!(b.end <= 0.95 + 1e-9);
        assert_eq!(tl.full_text, "Bem-vindo. Peça já");
    }

    #[test]
    fn find_active_returns_none_outside_every_segment() {
        let tl = build_timeline(&script(&["a", "b"]), 30.0);
        assert!(find_active_segment(&tl, 0.0).is_none());
        assert!(find_active_segment(&tl, 0.999).is_none());
        // Inside the inter-segment gap.
        let gap_mid = (tl.segments[0].end + tl.segments[1].start) / 2.0;
        assert!(find_active_segment(&tl, gap_mid).is_none());
    }

    #[test]
    fn find_active_returns_exactly_one_inside() {
        let tl = build_timeline(&script(&["a", "b", "c"]), 45.0);
        for seg_idx in 0..3 {
            let seg = &tl.segments[seg_idx];
            let mid = (seg.start + seg.end) / 2.0;
            let active = find_active_segment(&tl, mid).expect("segment at midpoint");
            assert_eq!(active.index, seg_idx);
            assert!((active.progress - 0.5).abs() < 1e-9);
            assert!((active.alpha - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn alpha_ramps_at_segment_edges() {
        let tl = build_timeline(&script(&["a"]), 15.0);
        let seg = &tl.segments[0];
        let span = seg.end - seg.start;
        let just_in = seg.start + span * 0.01;
        let active = find_active_segment(&tl, just_in).unwrap();
        assert!(active.alpha < 0.2);
        let near_end = seg.end - span * 0.01;
        let active = find_active_segment(&tl, near_end).unwrap();
        assert!(active.alpha < 0.2);
    }

    #[test]
    fn duck_windows_scale_to_seconds() {
        let tl = build_timeline(&script(&["a"]), 30.0);
        let windows = tl.duck_windows();
        assert_eq!(windows.len(), 1);
        assert!((windows[0].start_secs - tl.segments[0].start * 30.0).abs() < 1e-9);
        assert!(windows[0].end_secs > windows[0].start_secs);
    }

    #[test]
    fn empty_script_yields_empty_timeline() {
        let tl = build_timeline(&[], 15.0);
        assert!(tl.segments.is_empty());
        assert!(find_active_segment(&tl, 0.5).is_none());
    }
}
