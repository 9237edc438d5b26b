//! Video metadata synthesis.
//!
//! Titles and descriptions come from the text-completion service; on any
//! failure the static templates below are used instead. A finished video
//! is never blocked on the completion service.

use serde_json::{json, Value};

use crate::config::UploadSettings;
use crate::text::TextComplete;

/// Fixed tag list applied to every upload.
const TAGS: &[&str] = &[
    "white noise for babies",
    "baby sleep",
    "white noise",
    "baby white noise",
    "colic relief",
    "infant sleep",
    "baby crying",
    "sleep sounds",
    "baby sleep sounds",
    "colicky baby",
    "soothe baby",
    "calm baby",
    "sleep aid",
    "pink noise",
    "brown noise",
    "newborn",
    "infant",
];

/// Metadata attached to an uploaded video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: u32,
    pub privacy: String,
}

impl VideoMetadata {
    /// Render the JSON body for the resumable upload session.
    pub fn snippet_json(&self) -> Value {
        json!({
            "snippet": {
                "title": self.title,
                "description": self.description,
                "tags": self.tags,
                "categoryId": self.category_id.to_string(),
            },
            "status": {
                "privacyStatus": self.privacy,
            }
        })
    }
}

/// Generates upload metadata for a finished video.
pub struct MetadataGenerator<'a> {
    settings: &'a UploadSettings,
    text: &'a dyn TextComplete,
}

impl<'a> MetadataGenerator<'a> {
    pub fn new(settings: &'a UploadSettings, text: &'a dyn TextComplete) -> Self {
        Self { settings, text }
    }

    /// Generate metadata for a video of the given nominal hour count.
    pub fn generate(&self, hours: u32) -> VideoMetadata {
        let title = match self.text.complete(&title_prompt(hours)) {
            Ok(t) => sanitize_line(&t),
            Err(e) => {
                tracing::warn!("title generation failed, using template: {}", e);
                fallback_title(hours)
            }
        };

        let description = match self.text.complete(&description_prompt(hours)) {
            Ok(d) => format!("{}\n\n{}", d.replace('*', "").trim(), keywords_section()),
            Err(e) => {
                tracing::warn!("description generation failed, using template: {}", e);
                fallback_description(hours)
            }
        };

        VideoMetadata {
            title,
            description,
            tags: TAGS.iter().map(|t| t.to_string()).collect(),
            category_id: self.settings.category_id,
            privacy: self.settings.privacy.as_str().to_string(),
        }
    }
}

fn title_prompt(hours: u32) -> String {
    format!(
        "Write ONE video title under 100 characters for a {hours}-hour white noise video \
         for babies. Use emotional keywords: soothe, calm, peaceful, magic sound, fall asleep \
         fast. You may separate parts with pipes or dashes. No emojis, no clickbait. \
         Return only the title."
    )
}

fn description_prompt(hours: u32) -> String {
    format!(
        "Write a 150-300 word video description for a {hours}-hour white noise video made \
         for babies. It helps newborns and infants fall asleep faster, sleep deeper, and calm \
         down when crying, and may soothe colicky babies. Natural, professional English, \
         search-optimized, tone calm and reassuring toward parents. No emojis, timestamps, \
         hashtags, or links. Return only the description."
    )
}

/// Template title used when the completion service is unavailable.
pub fn fallback_title(hours: u32) -> String {
    format!("White Noise for Babies | {hours} Hours of Peaceful Sleep | Soothe Crying Infant")
}

/// Template description used when the completion service is unavailable.
pub fn fallback_description(hours: u32) -> String {
    format!(
        "This white noise video is designed to help babies fall asleep faster and sleep \
         deeper. The continuous, gentle sound soothes crying infants and provides colic \
         relief. Perfect for naps, bedtime, or anytime your baby needs calming. Features \
         {hours} hours of uninterrupted soothing sound with no interruptions.\n\n{}",
        keywords_section()
    )
}

fn keywords_section() -> String {
    "Keywords: white noise for babies, baby sleep sounds, soothing baby sleep, colic relief, \
     infant sleep aid, calm baby crying, sleep music for newborns, white noise for sleeping, \
     baby sleep music"
        .to_string()
}

/// Collapse a completion to a single trimmed line.
fn sanitize_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .trim_matches('"')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{TextError, TextResult};

    struct StubText {
        response: Option<String>,
    }

    impl TextComplete for StubText {
        fn complete(&self, _prompt: &str) -> TextResult<String> {
            match &self.response {
                Some(r) => Ok(r.clone()),
                None => Err(TextError::EmptyResponse),
            }
        }
    }

    #[test]
    fn uses_completion_when_available() {
        let settings = UploadSettings::default();
        let stub = StubText {
            response: Some("Magic Sleep Sound for Babies".to_string()),
        };
        let generator = MetadataGenerator::new(&settings, &stub);

        let meta = generator.generate(10);
        assert_eq!(meta.title, "Magic Sleep Sound for Babies");
        assert!(meta.description.contains("Magic Sleep Sound"));
    }

    #[test]
    fn falls_back_to_templates_on_error() {
        let settings = UploadSettings::default();
        let stub = StubText { response: None };
        let generator = MetadataGenerator::new(&settings, &stub);

        let meta = generator.generate(3);
        assert_eq!(meta.title, fallback_title(3));
        assert!(meta.description.contains("3 hours"));
        assert!(meta.description.contains("Keywords:"));
    }

    #[test]
    fn metadata_carries_fixed_tags_and_category() {
        let settings = UploadSettings::default();
        let stub = StubText { response: None };
        let meta = MetadataGenerator::new(&settings, &stub).generate(1);

        assert_eq!(meta.category_id, 24);
        assert_eq!(meta.privacy, "public");
        assert!(meta.tags.iter().any(|t| t == "white noise for babies"));
    }

    #[test]
    fn snippet_json_shape() {
        let meta = VideoMetadata {
            title: "T".to_string(),
            description: "D".to_string(),
            tags: vec!["a".to_string()],
            category_id: 24,
            privacy: "public".to_string(),
        };

        let json = meta.snippet_json();
        assert_eq!(json["snippet"]["title"], "T");
        assert_eq!(json["snippet"]["categoryId"], "24");
        assert_eq!(json["status"]["privacyStatus"], "public");
    }

    #[test]
    fn sanitize_takes_first_nonempty_line() {
        assert_eq!(sanitize_line("\n\n \"A Title\" \nextra"), "A Title");
    }
}
