use std::{
    path::PathBuf,
    process::Command,
    sync::{Arc, Mutex},
};

use promoreel::{
    Aspect, CancelToken, ClipDuration, Collaborators, ImageFetcher, MusicChoice, Pacing,
    ReelError, RenderRequest, ScriptSegment, SessionOptions, SessionState, SpeechAdapter,
    TextContent, render_session,
    request::SegmentKind,
};

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn temp_out(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "promoreel_{tag}_{}_{}.mp4",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

struct PngFetcher;

impl ImageFetcher for PngFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let shade = url.len() as u8 * 20;
        let img = image::RgbaImage::from_pixel(32, 24, image::Rgba([shade, 80, 40, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )?;
        Ok(bytes)
    }
}

struct FailingFetcher;

impl ImageFetcher for FailingFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("no bytes for '{url}'")
    }
}

fn basic_request(template: &str) -> RenderRequest {
    RenderRequest {
        images: vec!["prato-um".into(), "prato-dois".into()],
        text: TextContent {
            headline: "Sabores da casa".into(),
            subtext: "Feito na hora".into(),
            cta: "Peça já".into(),
            restaurant_name: "Cantina do Porto".into(),
        },
        template: template.into(),
        duration: ClipDuration::S15,
        aspect: Aspect::Square,
        music: MusicChoice::Auto,
        narration: Some(vec![
            ScriptSegment {
                kind: SegmentKind::Opening,
                text: "Bem-vindo".into(),
            },
            ScriptSegment {
                kind: SegmentKind::Closing,
                text: "Peça já".into(),
            },
        ]),
        cuisine: Some("italiana".into()),
        mood: None,
        lang: "pt-BR".into(),
        seed: 11,
    }
}

fn low_fps_options(out: &PathBuf) -> SessionOptions {
    let mut options = SessionOptions::new(out);
    options.fps = 2;
    options.pacing = Pacing::Offline;
    options
}

#[test]
fn full_session_produces_mp4_with_monotone_progress() {
    if !ffmpeg_available() {
        return;
    }
    let out = temp_out("full");
    let progress: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let states: Arc<Mutex<Vec<SessionState>>> = Arc::new(Mutex::new(Vec::new()));

    let mut options = low_fps_options(&out);
    let progress_sink = progress.clone();
    options.progress = Some(Box::new(move |pct| {
        progress_sink.lock().unwrap().push(pct);
    }));
    let state_sink = states.clone();
    options.on_state = Some(Box::new(move |s| {
        state_sink.lock().unwrap().push(s);
    }));

    let report = render_session(
        &basic_request("elegante"),
        Collaborators {
            fetcher: Box::new(PngFetcher),
            speech: SpeechAdapter::Off,
        },
        options,
    )
    .unwrap();

    assert!(report.video.path.exists());
    assert!(!report.video.bytes.is_empty());
    assert_eq!(report.video.mime_type, "video/mp4");

    let progress = progress.lock().unwrap();
    assert!(progress.windows(2).all(|w| w[0] < w[1]), "progress regressed");
    assert_eq!(*progress.last().unwrap(), 100);

    let states = states.lock().unwrap();
    assert_eq!(
        *states,
        vec![
            SessionState::Preparing,
            SessionState::Recording,
            SessionState::Finalizing,
            SessionState::Done,
        ]
    );

    let _ = std::fs::remove_file(&out);
}

#[test]
fn canceled_session_discards_partial_output() {
    if !ffmpeg_available() {
        return;
    }
    let out = temp_out("cancel");
    let states: Arc<Mutex<Vec<SessionState>>> = Arc::new(Mutex::new(Vec::new()));

    let mut options = low_fps_options(&out);
    let cancel = CancelToken::new();
    cancel.cancel();
    options.cancel = cancel;
    let state_sink = states.clone();
    options.on_state = Some(Box::new(move |s| {
        state_sink.lock().unwrap().push(s);
    }));

    let err = render_session(
        &basic_request("moderno"),
        Collaborators {
            fetcher: Box::new(PngFetcher),
            speech: SpeechAdapter::Off,
        },
        options,
    )
    .unwrap_err();

    assert!(matches!(err, ReelError::Canceled));
    assert!(!out.exists(), "canceled session left a partial file behind");
    assert_eq!(
        *states.lock().unwrap().last().unwrap(),
        SessionState::Canceled
    );
}

#[test]
fn presenter_mode_degrades_when_images_fail_to_decode() {
    if !ffmpeg_available() {
        return;
    }
    let out = temp_out("presenter");

    let report = render_session(
        &basic_request("apresentador"),
        Collaborators {
            fetcher: Box::new(FailingFetcher),
            speech: SpeechAdapter::Off,
        },
        low_fps_options(&out),
    )
    .unwrap();

    assert!(
        report
            .degraded
            .contains(&promoreel::session::Degradation::Images)
    );
    assert!(report.video.path.exists());
    let _ = std::fs::remove_file(&out);
}

#[test]
fn general_template_fails_when_images_fail_to_decode() {
    // Validation and decode both run before the encoder spawns, so this
    // holds with or without ffmpeg installed.
    let out = temp_out("decodefail");
    let err = render_session(
        &basic_request("classico"),
        Collaborators {
            fetcher: Box::new(FailingFetcher),
            speech: SpeechAdapter::Off,
        },
        low_fps_options(&out),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Media(_)));
    assert!(!out.exists());
}

#[test]
fn concurrent_sessions_do_not_corrupt_each_other() {
    if !ffmpeg_available() {
        return;
    }
    let out_a = temp_out("conc_a");
    let out_b = temp_out("conc_b");

    let spawn = |out: PathBuf, template: &'static str, seed: u64| {
        std::thread::spawn(move || {
            let mut request = basic_request(template);
            request.seed = seed;
            request.narration = None;
            render_session(
                &request,
                Collaborators {
                    fetcher: Box::new(PngFetcher),
                    speech: SpeechAdapter::Off,
                },
                low_fps_options(&out),
            )
        })
    };

    let a = spawn(out_a.clone(), "vibrante", 1);
    let b = spawn(out_b.clone(), "minimalista", 2);
    let report_a = a.join().unwrap().unwrap();
    let report_b = b.join().unwrap().unwrap();

    assert!(!report_a.video.bytes.is_empty());
    assert!(!report_b.video.bytes.is_empty());
    assert_ne!(report_a.video.bytes, report_b.video.bytes);

    let _ = std::fs::remove_file(&out_a);
    let _ = std::fs::remove_file(&out_b);
}
