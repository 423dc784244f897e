pub mod speech;
pub mod timeline;

pub use speech::{
    NarrationFetch, RemoteTts, SegmentSpeech, SpeechAdapter, SpeechTracker, Utterance, Voice,
    VoiceSynth, pick_voice,
};
pub use timeline::{
    ActiveSegment, DuckWindow, NarrationSegment, NarrationTimeline, build_timeline,
    find_active_segment,
};
