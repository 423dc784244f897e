use tracing::warn;

use crate::{
    media,
    music::{
        schedule::MusicSchedule,
        synth::{MIX_CHANNELS, MIX_SAMPLE_RATE, MusicBus},
    },
    narration::DuckWindow,
};

/// Duck depth used when the track comes from an external source and no theme
/// supplies one.
const SOURCE_DUCK_DEPTH: f32 = 0.30;

/// Build a bus from an externally supplied, already-fetched track: decode,
/// loop to the target duration, then apply the same edge-fade and duck
/// envelope the synthesizer uses. Best-effort: any failure yields silence.
pub fn bus_from_source(bytes: &[u8], duration: f64, duck_windows: &[DuckWindow]) -> MusicBus {
    let pcm = match media::decode_audio_to_pcm(bytes) {
        Ok(pcm) => pcm,
        Err(e) => {
            warn!(error = %e, "music source decode failed; rendering silence");
            return MusicBus::silence(duration);
        }
    };

    let frames = (duration * f64::from(MIX_SAMPLE_RATE)).round() as usize;
    let channels = usize::from(MIX_CHANNELS);
    let src_len = pcm.interleaved.len();
    if src_len == 0 {
        return MusicBus::silence(duration);
    }

    // Looping is sample-index modular; the source is already at mix format.
    let mut samples = Vec::with_capacity(frames * channels);
    for i in 0..frames * channels {
        samples.push(pcm.interleaved[i % src_len]);
    }

    let envelope = MusicSchedule {
        events: Vec::new(),
        duration,
        bar_secs: 0.0,
        fade_secs: (duration * 0.08).min(1.2),
        duck_windows: duck_windows.to_vec(),
        duck_depth: SOURCE_DUCK_DEPTH,
    };
    for (i, sample) in samples.iter_mut().enumerate() {
        let t = (i / channels) as f64 / f64::from(MIX_SAMPLE_RATE);
        *sample = (*sample * envelope.master_gain(t)).clamp(-1.0, 1.0);
    }

    MusicBus {
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        samples,
    }
}
