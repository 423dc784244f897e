pub mod schedule;
pub mod source;
pub mod synth;

pub use schedule::{AudioEvent, DUCK_RAMP_SECS, EventKind, MusicSchedule, build_schedule};
pub use source::bus_from_source;
pub use synth::{MIX_CHANNELS, MIX_SAMPLE_RATE, MusicBus, render_schedule};

use crate::{narration::DuckWindow, theme};

/// Schedule and render a theme over `[0, duration]` in one pass. Strictly
/// best-effort by contract; this path has no failure modes.
pub fn synthesize(
    theme_id: theme::ThemeId,
    duration_secs: f64,
    duck_windows: &[DuckWindow],
) -> MusicBus {
    let def = theme::definition(theme_id);
    let schedule = build_schedule(def, duration_secs, duck_windows);
    render_schedule(&schedule, def)
}
