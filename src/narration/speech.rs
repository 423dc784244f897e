use std::sync::mpsc;

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::narration::timeline::NarrationTimeline;

/// Remote text-to-speech endpoint: POST `{text, lang}`, raw audio bytes back.
#[derive(Clone, Debug)]
pub struct RemoteTts {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl RemoteTts {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn synthesize(&self, text: &str, lang: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text, "lang": lang }))
            .send()
            .with_context(|| format!("tts request to '{}'", self.endpoint))?
            .error_for_status()
            .context("tts endpoint returned an error status")?;
        let bytes = resp.bytes().context("read tts response body")?;
        Ok(bytes.to_vec())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub lang: String,
}

#[derive(Clone, Debug)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
}

/// Local voice-synthesis capability with selectable locale voices. Utterances
/// are queued per segment; the engine never waits for playback.
pub trait VoiceSynth: Send {
    fn voices(&self) -> Vec<Voice>;
    fn enqueue(&mut self, utterance: Utterance);
    fn cancel(&mut self);
}

/// Exact locale match first, then language-prefix match ("pt-BR" → "pt").
pub fn pick_voice<'a>(voices: &'a [Voice], lang: &str) -> Option<&'a Voice> {
    if let Some(v) = voices.iter().find(|v| v.lang.eq_ignore_ascii_case(lang)) {
        return Some(v);
    }
    let prefix = lang.split(['-', '_']).next().unwrap_or(lang);
    voices
        .iter()
        .find(|v| v.lang.split(['-', '_']).next().unwrap_or(&v.lang) == prefix)
}

/// How narration gets voiced. All paths are best-effort.
pub enum SpeechAdapter {
    /// One fetch for the whole script; audio is mixed into the output track.
    Remote(RemoteTts),
    /// Per-segment utterance queue.
    Local(Box<dyn VoiceSynth>),
    Off,
}

/// Per-segment narration state. Transitioned on activation, never polled into
/// re-triggering while a segment stays active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentSpeech {
    NotStarted,
    Speaking,
    Done,
}

/// Tracks which segments have been spoken and drives the local adapter.
pub struct SpeechTracker {
    states: Vec<SegmentSpeech>,
}

impl SpeechTracker {
    pub fn new(segment_count: usize) -> Self {
        Self {
            states: vec![SegmentSpeech::NotStarted; segment_count],
        }
    }

    pub fn state(&self, index: usize) -> SegmentSpeech {
        self.states[index]
    }

    /// Advance per-frame. Returns true while the active segment is speaking
    /// (the avatar's mouth signal).
    pub fn on_tick(
        &mut self,
        active: Option<usize>,
        adapter: &mut SpeechAdapter,
        timeline: &NarrationTimeline,
        lang: &str,
    ) -> bool {
        // Segments whose window has passed are done regardless of adapter.
        for (i, state) in self.states.iter_mut().enumerate() {
            if *state == SegmentSpeech::Speaking && active != Some(i) {
                *state = SegmentSpeech::Done;
            }
        }

        let Some(index) = active else {
            return false;
        };

        if self.states[index] == SegmentSpeech::NotStarted {
            self.states[index] = SegmentSpeech::Speaking;
            if let SpeechAdapter::Local(synth) = adapter {
                let voice = pick_voice(&synth.voices(), lang).map(|v| v.id.clone());
                debug!(segment = index, ?voice, "queueing narration utterance");
                synth.enqueue(Utterance {
                    text: timeline.segments[index].text.clone(),
                    voice,
                });
            }
        }

        self.states[index] == SegmentSpeech::Speaking
    }

    pub fn shutdown(&mut self, adapter: &mut SpeechAdapter) {
        if let SpeechAdapter::Local(synth) = adapter {
            synth.cancel();
        }
    }
}

/// In-flight remote TTS fetch, spawned before the frame loop and only ever
/// polled by it.
pub struct NarrationFetch {
    rx: mpsc::Receiver<anyhow::Result<Vec<u8>>>,
    bytes: Option<Vec<u8>>,
    failed: bool,
    settled: bool,
}

impl NarrationFetch {
    pub fn spawn(tts: RemoteTts, text: String, lang: String) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(tts.synthesize(&text, &lang));
        });
        Self {
            rx,
            bytes: None,
            failed: false,
            settled: false,
        }
    }

    /// Non-blocking; safe to call every frame.
    pub fn poll(&mut self) {
        if self.settled {
            return;
        }
        match self.rx.try_recv() {
            Ok(Ok(bytes)) => {
                debug!(len = bytes.len(), "narration audio arrived");
                self.bytes = Some(bytes);
                self.settled = true;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "narration tts fetch failed; continuing without it");
                self.failed = true;
                self.settled = true;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.failed = true;
                self.settled = true;
            }
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn take_bytes(&mut self) -> Option<Vec<u8>> {
        self.bytes.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ScriptSegment, SegmentKind};

    fn timeline(n: usize) -> NarrationTimeline {
        let script: Vec<ScriptSegment> = (0..n)
            .map(|i| ScriptSegment {
                kind: SegmentKind::Dish,
                text: format!("seg {i}"),
            })
            .collect();
        crate::narration::build_timeline(&script, 30.0)
    }

    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSynth {
        utterances: Arc<Mutex<Vec<Utterance>>>,
        canceled: Arc<Mutex<bool>>,
    }

    impl VoiceSynth for RecordingSynth {
        fn voices(&self) -> Vec<Voice> {
            vec![
                Voice {
                    id: "en-voice".into(),
                    lang: "en-US".into(),
                },
                Voice {
                    id: "pt-voice".into(),
                    lang: "pt-BR".into(),
                },
            ]
        }

        fn enqueue(&mut self, utterance: Utterance) {
            self.utterances.lock().unwrap().push(utterance);
        }

        fn cancel(&mut self) {
            *self.canceled.lock().unwrap() = true;
        }
    }

    #[test]
    fn pick_voice_prefers_exact_then_prefix() {
        let voices = vec![
            Voice {
                id: "a".into(),
                lang: "pt-PT".into(),
            },
            Voice {
                id: "b".into(),
                lang: "pt-BR".into(),
            },
        ];
        assert_eq!(pick_voice(&voices, "pt-BR").unwrap().id, "b");
        assert_eq!(pick_voice(&voices, "pt").unwrap().id, "a");
        assert!(pick_voice(&voices, "ja-JP").is_none());
    }

    #[test]
    fn segment_is_spoken_exactly_once() {
        let tl = timeline(2);
        let mut tracker = SpeechTracker::new(2);
        let synth = RecordingSynth::default();
        let utterances = synth.utterances.clone();
        let canceled = synth.canceled.clone();
        let mut adapter = SpeechAdapter::Local(Box::new(synth));

        // Many frames inside segment 0 enqueue a single utterance.
        for _ in 0..10 {
            tracker.on_tick(Some(0), &mut adapter, &tl, "pt-BR");
        }
        assert_eq!(utterances.lock().unwrap().len(), 1);
        assert_eq!(
            utterances.lock().unwrap()[0].voice.as_deref(),
            Some("pt-voice")
        );

        // Gap, then segment 1.
        tracker.on_tick(None, &mut adapter, &tl, "pt-BR");
        assert_eq!(tracker.state(0), SegmentSpeech::Done);
        tracker.on_tick(Some(1), &mut adapter, &tl, "pt-BR");
        assert_eq!(tracker.state(1), SegmentSpeech::Speaking);
        assert_eq!(utterances.lock().unwrap().len(), 2);

        tracker.shutdown(&mut adapter);
        assert!(*canceled.lock().unwrap());
    }

    #[test]
    fn tick_without_active_segment_reports_not_speaking() {
        let tl = timeline(1);
        let mut tracker = SpeechTracker::new(1);
        let mut adapter = SpeechAdapter::Off;
        assert!(!tracker.on_tick(None, &mut adapter, &tl, "pt-BR"));
        assert!(tracker.on_tick(Some(0), &mut adapter, &tl, "pt-BR"));
    }
}
