use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    encode::{AudioInputConfig, FfmpegEncoder, default_mp4_config, mux_audio, write_f32le_file},
    error::{ReelError, ReelResult},
    fetch::{ImageFetcher, fetch_and_decode_all},
    media::{self, TempFileGuard},
    music::{self, MIX_CHANNELS, MIX_SAMPLE_RATE, MusicBus},
    narration::{
        NarrationFetch, NarrationTimeline, SpeechAdapter, SpeechTracker, build_timeline,
        find_active_segment,
    },
    request::{MusicChoice, RenderRequest},
    surface::Surface,
    templates::{PRESENTER_TEMPLATE_ID, TemplateCtx, TemplateRegistry},
    text::FontBank,
    theme,
};

/// Lifecycle of one render session. Transitions are strictly forward except
/// into the three terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Preparing,
    Recording,
    Finalizing,
    Done,
    Failed,
    Canceled,
}

/// Shared flag that aborts a session from another thread. Cancellation halts
/// the frame loop, stops narration, and discards the partial output file.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How the frame loop advances time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pacing {
    /// Wall-clock elapsed time; frames are paced to the fps interval.
    Realtime,
    /// Fixed time step per frame, as fast as the encoder accepts frames.
    Offline,
}

/// Best-effort subsystems that failed without aborting the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degradation {
    /// Presenter mode only: image decode failed, rendered without images.
    Images,
    /// Music fetch/decode produced silence.
    Music,
    /// Narration audio never arrived or failed to decode.
    Narration,
    /// No usable font; text layers were skipped.
    Fonts,
    /// Audio was rendered but could not be muxed; output is video-only.
    AudioMux,
}

#[derive(Debug)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Final session outcome: the encoded artifact plus every degradation that
/// was swallowed along the way.
#[derive(Debug)]
pub struct SessionReport {
    pub video: EncodedVideo,
    pub degraded: Vec<Degradation>,
}

pub struct SessionOptions {
    pub out_path: PathBuf,
    pub fps: u32,
    pub pacing: Pacing,
    pub cancel: CancelToken,
    /// Integer percentage callback, invoked only when the value changes.
    pub progress: Option<Box<dyn FnMut(u8) + Send>>,
    pub on_state: Option<Box<dyn FnMut(SessionState) + Send>>,
}

impl SessionOptions {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            fps: 30,
            pacing: Pacing::Offline,
            cancel: CancelToken::new(),
            progress: None,
            on_state: None,
        }
    }
}

/// External capabilities a session consumes.
pub struct Collaborators {
    pub fetcher: Box<dyn ImageFetcher>,
    pub speech: SpeechAdapter,
}

/// Encoder-flush grace before stopping, in realtime pacing.
const FINALIZE_GRACE: Duration = Duration::from_millis(250);
/// Bound on waiting for in-flight narration audio at finalize.
const NARRATION_SETTLE: Duration = Duration::from_secs(2);

/// Drives one complete session: decode inputs, synthesize audio, run the
/// frame loop into the encoder, and mux the audio track at the end.
///
/// Encoder failures are fatal. Music, narration, and font failures degrade
/// and are reported in [`SessionReport::degraded`].
#[tracing::instrument(skip_all, fields(template = %request.template, seed = request.seed))]
pub fn render_session(
    request: &RenderRequest,
    collaborators: Collaborators,
    mut options: SessionOptions,
) -> ReelResult<SessionReport> {
    let mut state = SessionState::Preparing;
    let mut set_state = |s: SessionState, options: &mut SessionOptions| {
        debug!(state = ?s, "session state");
        if let Some(cb) = options.on_state.as_mut() {
            cb(s);
        }
    };
    set_state(state, &mut options);

    let result = run_session(request, collaborators, &mut options, &mut set_state);
    state = match &result {
        Ok(_) => SessionState::Done,
        Err(ReelError::Canceled) => SessionState::Canceled,
        Err(_) => SessionState::Failed,
    };
    set_state(state, &mut options);
    result
}

fn run_session(
    request: &RenderRequest,
    mut collaborators: Collaborators,
    options: &mut SessionOptions,
    set_state: &mut dyn FnMut(SessionState, &mut SessionOptions),
) -> ReelResult<SessionReport> {
    request.validate()?;
    let duration = request.duration.seconds();
    let (width, height) = request.aspect.dimensions();
    let presenter = request.template == PRESENTER_TEMPLATE_ID;
    let mut degraded = Vec::new();

    // Image decode fan-out. Presenter mode renders without images on
    // failure; every other template treats a decode failure as fatal.
    let images = match fetch_and_decode_all(collaborators.fetcher.as_ref(), &request.images) {
        Ok(images) => images,
        Err(e) if presenter => {
            warn!(error = %e, "presenter mode continuing without images");
            degraded.push(Degradation::Images);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let registry = TemplateRegistry::builtin();
    let template = registry.resolve(&request.template);

    let mut fonts = FontBank::discover();
    if !fonts.available() {
        degraded.push(Degradation::Fonts);
    }

    // Narration timeline drives both captions and music ducking.
    let timeline: Option<NarrationTimeline> = request
        .narration
        .as_deref()
        .map(|script| build_timeline(script, duration));
    let duck_windows = timeline
        .as_ref()
        .map(|tl| tl.duck_windows())
        .unwrap_or_default();

    // Music is strictly best-effort: any failure here renders silence.
    let mut music_bus: Option<MusicBus> = match &request.music {
        MusicChoice::Off => None,
        MusicChoice::Theme(id) => Some(music::synthesize(*id, duration, &duck_windows)),
        MusicChoice::Auto => {
            let id = theme::resolve_auto(request.cuisine.as_deref(), request.mood.as_deref());
            info!(theme = id.name(), "auto-resolved music theme");
            Some(music::synthesize(id, duration, &duck_windows))
        }
        MusicChoice::Source(url) => match collaborators.fetcher.fetch(url) {
            Ok(bytes) => {
                let bus = music::bus_from_source(&bytes, duration, &duck_windows);
                if bus.is_silent() {
                    degraded.push(Degradation::Music);
                }
                Some(bus)
            }
            Err(e) => {
                warn!(error = %e, url = %url, "music source fetch failed; continuing silent");
                degraded.push(Degradation::Music);
                None
            }
        },
    };

    // Remote TTS is fetched concurrently and only polled by the frame loop.
    let mut narration_fetch: Option<NarrationFetch> = match (&collaborators.speech, &timeline) {
        (SpeechAdapter::Remote(tts), Some(tl)) if !tl.full_text.is_empty() => Some(
            NarrationFetch::spawn(tts.clone(), tl.full_text.clone(), request.lang.clone()),
        ),
        _ => None,
    };
    let mut tracker = timeline
        .as_ref()
        .map(|tl| SpeechTracker::new(tl.segments.len()));

    let mut encoder = FfmpegEncoder::new(
        default_mp4_config(&options.out_path, width, height, options.fps),
        [0, 0, 0, 255],
    )?;
    let mut surface = Surface::new(width, height);
    let mut last_pct: Option<u8> = None;

    set_state(SessionState::Recording, options);

    let fps = options.fps.max(1);
    let frame_step = 1.0 / f64::from(fps) / duration;
    let start = Instant::now();
    let mut frame: u64 = 0;

    loop {
        let t = match options.pacing {
            Pacing::Offline => frame as f64 * frame_step,
            Pacing::Realtime => start.elapsed().as_secs_f64() / duration,
        };
        if t >= 1.0 {
            break;
        }

        if options.cancel.is_canceled() {
            if let (Some(tracker), Some(_)) = (tracker.as_mut(), timeline.as_ref()) {
                tracker.shutdown(&mut collaborators.speech);
            }
            encoder.finish_discard();
            return Err(ReelError::Canceled);
        }

        if let Some(fetch) = narration_fetch.as_mut() {
            fetch.poll();
        }

        let (active, speaking) = match (tracker.as_mut(), timeline.as_ref()) {
            (Some(tracker), Some(tl)) => {
                let active = find_active_segment(tl, t);
                let speaking = tracker.on_tick(
                    active.as_ref().map(|a| a.index),
                    &mut collaborators.speech,
                    tl,
                    &request.lang,
                );
                (active, speaking)
            }
            _ => (None, false),
        };

        let ctx = TemplateCtx {
            images: &images,
            text: &request.text,
            seed: request.seed,
            duration_secs: duration,
            speaking,
        };
        template.render(&mut surface, &mut fonts, t, &ctx);

        if let (Some(active), Some(tl)) = (&active, timeline.as_ref()) {
            let text = &tl.segments[active.index].text;
            crate::caption::draw_caption(
                &mut surface,
                &mut fonts,
                text,
                active.progress,
                active.alpha as f32,
            );
        }

        encoder.encode_frame(&surface)?;

        let pct = (t * 100.0).round().clamp(0.0, 100.0) as u8;
        if last_pct != Some(pct) && last_pct.map_or(true, |p| pct > p) {
            last_pct = Some(pct);
            if let Some(cb) = options.progress.as_mut() {
                cb(pct);
            }
        }

        frame += 1;
        if options.pacing == Pacing::Realtime {
            let next = start + Duration::from_secs_f64(frame as f64 / f64::from(fps));
            if let Some(sleep) = next.checked_duration_since(Instant::now()) {
                std::thread::sleep(sleep);
            }
        }
    }

    set_state(SessionState::Finalizing, options);
    if options.pacing == Pacing::Realtime {
        // Let trailing frames drain before closing the encoder's stdin.
        std::thread::sleep(FINALIZE_GRACE);
    }
    if let Some(tracker) = tracker.as_mut() {
        tracker.shutdown(&mut collaborators.speech);
    }

    let video_path = encoder.finish()?;

    // Narration audio may still be in flight; give it a bounded settle.
    if let (Some(fetch), Some(tl)) = (narration_fetch.as_mut(), timeline.as_ref()) {
        let deadline = Instant::now() + NARRATION_SETTLE;
        let bytes = loop {
            fetch.poll();
            if let Some(bytes) = fetch.take_bytes() {
                break Some(bytes);
            }
            if fetch.failed() || Instant::now() >= deadline {
                break None;
            }
            std::thread::sleep(Duration::from_millis(25));
        };
        match bytes.map(|b| media::decode_audio_to_pcm(&b)) {
            Some(Ok(pcm)) => {
                let offset = tl.segments.first().map_or(0.0, |s| s.start) * duration;
                let bus = music_bus.get_or_insert_with(|| MusicBus::silence(duration));
                bus.mix_in(&pcm.interleaved, offset, 0.9);
            }
            Some(Err(e)) => {
                warn!(error = %e, "narration audio decode failed; output has no narration");
                degraded.push(Degradation::Narration);
            }
            None => {
                debug!("narration audio never arrived; output has no narration");
                degraded.push(Degradation::Narration);
            }
        }
    }

    if let Some(bus) = music_bus.filter(|b| !b.is_silent()) {
        let pcm_path = std::env::temp_dir().join(format!(
            "promoreel_mix_{}_{}.f32le",
            std::process::id(),
            start.elapsed().as_nanos()
        ));
        let guard = TempFileGuard(Some(pcm_path.clone()));
        let mux = write_f32le_file(&pcm_path, &bus.samples).and_then(|()| {
            mux_audio(
                &video_path,
                &AudioInputConfig {
                    path: pcm_path.clone(),
                    sample_rate: MIX_SAMPLE_RATE,
                    channels: MIX_CHANNELS,
                },
            )
        });
        drop(guard);
        if let Err(e) = mux {
            warn!(error = %e, "audio mux failed; delivering video-only output");
            degraded.push(Degradation::AudioMux);
        }
    }

    if last_pct != Some(100) {
        if let Some(cb) = options.progress.as_mut() {
            cb(100);
        }
    }

    let bytes = std::fs::read(&video_path)
        .map_err(|e| ReelError::encode(format!("failed to read encoded output: {e}")))?;
    info!(
        path = %video_path.display(),
        bytes = bytes.len(),
        degraded = degraded.len(),
        "session complete"
    );

    Ok(SessionReport {
        video: EncodedVideo {
            path: video_path,
            mime_type: "video/mp4",
            bytes,
        },
        degraded,
    })
}
