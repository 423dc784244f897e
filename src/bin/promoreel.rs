use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "promoreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a video from a request JSON (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// List the built-in visual templates.
    Templates,
    /// List the built-in music themes.
    Themes,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long)]
    request: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Output frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Pace frames against the wall clock instead of rendering flat out.
    #[arg(long)]
    realtime: bool,

    /// Remote text-to-speech endpoint for narration audio.
    #[arg(long)]
    tts_endpoint: Option<String>,

    /// Resolve image entries as local paths instead of URLs.
    #[arg(long)]
    local_images: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Templates => {
            for id in promoreel::TemplateRegistry::builtin().ids() {
                println!("{id}");
            }
            Ok(())
        }
        Command::Themes => {
            for id in promoreel::ThemeId::ALL {
                println!("{}", id.name());
            }
            Ok(())
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let f = File::open(&args.request)
        .with_context(|| format!("open request '{}'", args.request.display()))?;
    let request: promoreel::RenderRequest =
        serde_json::from_reader(BufReader::new(f)).context("parse request JSON")?;

    let fetcher: Box<dyn promoreel::ImageFetcher> = if args.local_images {
        Box::new(promoreel::FsFetcher::default())
    } else {
        Box::new(promoreel::HttpFetcher::new()?)
    };

    let speech = match args.tts_endpoint {
        Some(endpoint) if request.narration.is_some() => {
            promoreel::SpeechAdapter::Remote(promoreel::RemoteTts::new(endpoint))
        }
        _ => promoreel::SpeechAdapter::Off,
    };

    let mut options = promoreel::SessionOptions::new(&args.out);
    options.fps = args.fps;
    options.pacing = if args.realtime {
        promoreel::Pacing::Realtime
    } else {
        promoreel::Pacing::Offline
    };
    options.progress = Some(Box::new(|pct| eprintln!("progress: {pct}%")));

    let report = promoreel::render_session(
        &request,
        promoreel::Collaborators { fetcher, speech },
        options,
    )?;

    for d in &report.degraded {
        eprintln!("degraded: {d:?}");
    }
    eprintln!("wrote {}", report.video.path.display());
    Ok(())
}
