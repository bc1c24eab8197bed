use url::Url;

use crate::model::body::HtmlBody;
use crate::model::ids::LessonId;

/// A single lesson inside a module's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    video: String,
    duration: String,
    explanation: String,
}

impl Lesson {
    #[must_use]
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        video: impl Into<String>,
        duration: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            video: video.into(),
            duration: duration.into(),
            explanation: explanation.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Video reference, relative to the configured video host unless absolute.
    #[must_use]
    pub fn video(&self) -> &str {
        &self.video
    }

    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Raw HTML body of the lesson.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Resolve the video reference against `host`.
    ///
    /// Returns `None` when the lesson has no video.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the reference cannot be joined onto the host.
    pub fn video_url(&self, host: &Url) -> Result<Option<Url>, url::ParseError> {
        let video = self.video.trim();
        if video.is_empty() {
            return Ok(None);
        }
        host.join(video).map(Some)
    }
}

impl HtmlBody for Lesson {
    fn html_body(&self) -> &str {
        &self.explanation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(video: &str) -> Lesson {
        Lesson::new(
            LessonId::new("l1").unwrap(),
            "Intro",
            video,
            "10 min",
            "<p>Hello</p>",
        )
    }

    #[test]
    fn video_url_joins_relative_reference_onto_host() {
        let host = Url::parse("https://codewithchris.github.io/learningJSON/").unwrap();
        let url = lesson("Lesson 1.mp4").video_url(&host).unwrap().unwrap();
        assert_eq!(
            url.as_str(),
            "https://codewithchris.github.io/learningJSON/Lesson%201.mp4"
        );
    }

    #[test]
    fn absolute_video_reference_replaces_host() {
        let host = Url::parse("https://videos.example/base/").unwrap();
        let url = lesson("https://cdn.example/v.mp4")
            .video_url(&host)
            .unwrap()
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/v.mp4");
    }

    #[test]
    fn missing_video_has_no_url() {
        let host = Url::parse("https://videos.example/").unwrap();
        assert!(lesson("  ").video_url(&host).unwrap().is_none());
    }

    #[test]
    fn html_body_is_explanation() {
        assert_eq!(lesson("").html_body(), "<p>Hello</p>");
    }
}
