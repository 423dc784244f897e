#![forbid(unsafe_code)]

pub mod caption;
pub mod effects;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod media;
pub mod music;
pub mod narration;
pub mod request;
pub mod rng;
pub mod session;
pub mod surface;
pub mod templates;
pub mod text;
pub mod theme;

pub use encode::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use error::{ReelError, ReelResult};
pub use fetch::{FsFetcher, HttpFetcher, ImageFetcher};
pub use narration::{RemoteTts, SpeechAdapter, build_timeline, find_active_segment};
pub use request::{Aspect, ClipDuration, MusicChoice, RenderRequest, ScriptSegment, TextContent};
pub use session::{
    CancelToken, Collaborators, Degradation, EncodedVideo, Pacing, SessionOptions, SessionReport,
    SessionState, render_session,
};
pub use surface::Surface;
pub use templates::{DEFAULT_TEMPLATE_ID, PRESENTER_TEMPLATE_ID, Template, TemplateRegistry};
pub use theme::ThemeId;
