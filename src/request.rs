use crate::{
    error::{ReelError, ReelResult},
    theme::ThemeId,
};

/// One render invocation's input. Immutable once a session starts.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    /// Image URLs (or local paths, depending on the configured fetcher).
    pub images: Vec<String>,
    pub text: TextContent,
    /// Template id; unknown ids fall back to the default template.
    pub template: String,
    pub duration: ClipDuration,
    pub aspect: Aspect,
    #[serde(default)]
    pub music: MusicChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<Vec<ScriptSegment>>,
    /// Feeds automatic theme resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// BCP-47-ish language tag for narration ("pt-BR" by default).
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Determinism seed for decorative effects.
    #[serde(default)]
    pub seed: u64,
}

fn default_lang() -> String {
    "pt-BR".to_string()
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub subtext: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub restaurant_name: String,
}

/// Supported clip lengths. The fixed set keeps downstream pricing and
/// template pacing predictable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClipDuration {
    #[serde(rename = "15s")]
    S15,
    #[serde(rename = "30s")]
    S30,
    #[serde(rename = "45s")]
    S45,
    #[serde(rename = "60s")]
    S60,
}

impl ClipDuration {
    pub fn seconds(self) -> f64 {
        match self {
            Self::S15 => 15.0,
            Self::S30 => 30.0,
            Self::S45 => 45.0,
            Self::S60 => 60.0,
        }
    }

    pub const ALL: [ClipDuration; 4] = [Self::S15, Self::S30, Self::S45, Self::S60];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Vertical,
    Square,
}

impl Aspect {
    /// Output raster dimensions (even on both axes for yuv420p).
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Vertical => (1080, 1920),
            Self::Square => (1080, 1080),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicChoice {
    /// Resolve a theme from cuisine/mood.
    #[default]
    Auto,
    Theme(ThemeId),
    /// Externally supplied track, fetched and decoded.
    Source(String),
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Opening,
    Dish,
    Offer,
    Closing,
}

/// Flat narration script entry, as produced by the script-generation
/// collaborator. Timing is assigned later by the timeline builder.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScriptSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl RenderRequest {
    pub fn validate(&self) -> ReelResult<()> {
        if self.images.is_empty() && self.template != crate::templates::PRESENTER_TEMPLATE_ID {
            return Err(ReelError::validation("no images supplied"));
        }
        if let MusicChoice::Source(url) = &self.music
            && url.trim().is_empty()
        {
            return Err(ReelError::validation("music source url must be non-empty"));
        }
        if let Some(script) = &self.narration {
            if script.is_empty() {
                return Err(ReelError::validation(
                    "narration script must have at least one segment when present",
                ));
            }
            for (i, seg) in script.iter().enumerate() {
                if seg.text.trim().is_empty() {
                    return Err(ReelError::validation(format!(
                        "narration segment {i} has empty text"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_request() -> RenderRequest {
        RenderRequest {
            images: vec!["a.jpg".into(), "b.jpg".into()],
            text: TextContent {
                headline: "Sabores da casa".into(),
                subtext: "Feito na hora".into(),
                cta: "Peça já".into(),
                restaurant_name: "Cantina do Porto".into(),
            },
            template: "elegante".into(),
            duration: ClipDuration::S15,
            aspect: Aspect::Vertical,
            music: MusicChoice::Auto,
            narration: None,
            cuisine: Some("italiana".into()),
            mood: None,
            lang: "pt-BR".into(),
            seed: 7,
        }
    }

    #[test]
    fn json_roundtrip() {
        let req = basic_request();
        let s = serde_json::to_string_pretty(&req).unwrap();
        let de: RenderRequest = serde_json::from_str(&s).unwrap();
        assert_eq!(de.images.len(), 2);
        assert_eq!(de.duration, ClipDuration::S15);
        assert_eq!(de.aspect, Aspect::Vertical);
    }

    #[test]
    fn validate_rejects_zero_images_outside_presenter_mode() {
        let mut req = basic_request();
        req.images.clear();
        assert!(req.validate().is_err());

        req.template = crate::templates::PRESENTER_TEMPLATE_ID.to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_narration_segment() {
        let mut req = basic_request();
        req.narration = Some(vec![ScriptSegment {
            kind: SegmentKind::Opening,
            text: "   ".into(),
        }]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn aspect_dimensions_are_even() {
        for aspect in [Aspect::Vertical, Aspect::Square] {
            let (w, h) = aspect.dimensions();
            assert_eq!(w % 2, 0);
            assert_eq!(h % 2, 0);
        }
    }
}
