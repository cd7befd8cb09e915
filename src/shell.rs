//! Interaction shell: one user submission from description to download link.
//!
//! ```text
//! Idle ──(description non-empty)──▶ Generating ──▶ Persisting ──▶ Rendering ──▶ Done
//!                                       │              │              │
//!                                       └──────────────┴──────────────┴──▶ Failed
//! ```
//!
//! Every failure is terminal for the submission and maps to exactly one
//! user-facing message. A new submission always starts again from `Idle`;
//! only the model provider's cache survives between submissions.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::{AppConfig, MAX_DURATION_S};
use crate::link::{encode_download_link, escape_html, inline_player};
use crate::model::ModelLoader;
use crate::persist::{AudioPersister, PersistError, clip_path};
use crate::provider::{ModelProvider, ProviderError};
use crate::{Error, Result};

/// The two inputs of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    description: String,
    duration_s: u32,
}

impl GenerationRequest {
    /// Durations above the slider maximum are rejected.
    pub fn new(description: impl Into<String>, duration_s: u32) -> Result<Self> {
        if duration_s > MAX_DURATION_S {
            return Err(Error::Config(format!(
                "duration must be between 0 and {MAX_DURATION_S} seconds, got {duration_s}"
            )));
        }
        Ok(Self {
            description: description.into(),
            duration_s,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn duration_s(&self) -> u32 {
        self.duration_s
    }

    /// Generation starts as soon as the description is non-empty.
    pub fn is_ready(&self) -> bool {
        !self.description.is_empty()
    }

    /// Echo of the inputs as shown above the results.
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "Your Description": self.description,
            "Selected Time Duration (in Seconds)": self.duration_s,
        })
    }
}

/// Why a submission ended in [`Stage::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("error loading model: {0}")]
    ModelLoad(String),

    #[error("error during music generation: {0}")]
    Generation(String),

    #[error("no audio samples to save")]
    PersistenceSkipped,

    #[error("failed to save audio: {0}")]
    Persistence(String),

    #[error("expected {} after saving, but it does not exist", .0.display())]
    OutputFileMissing(PathBuf),

    #[error("failed to read generated audio: {0}")]
    FileRead(String),
}

impl Failure {
    /// Banner text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) | Self::Generation(_) => "Music generation failed.",
            Self::PersistenceSkipped | Self::Persistence(_) => "Saving generated audio failed.",
            Self::OutputFileMissing(_) => "Generated audio file not found.",
            Self::FileRead(_) => "Reading generated audio failed.",
        }
    }
}

impl From<ProviderError> for Failure {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Load(msg) => Self::ModelLoad(msg),
            ProviderError::Generate(e) => Self::Generation(e.to_string()),
        }
    }
}

impl From<PersistError> for Failure {
    fn from(error: PersistError) -> Self {
        match error {
            PersistError::MissingWaveform => Self::PersistenceSkipped,
            PersistError::Write(e) => Self::Persistence(e.to_string()),
        }
    }
}

/// What a successful submission shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub audio_path: PathBuf,
    pub audio_bytes: Vec<u8>,
    pub player_html: String,
    pub download_html: String,
}

/// State of the current submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Generating,
    Persisting,
    Rendering,
    Failed(Failure),
    Done(Rendered),
}

/// Fieldless mirror of [`Stage`], for recording the path a submission took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Idle,
    Generating,
    Persisting,
    Rendering,
    Failed,
    Done,
}

impl Stage {
    pub fn step(&self) -> Step {
        match self {
            Self::Idle => Step::Idle,
            Self::Generating => Step::Generating,
            Self::Persisting => Step::Persisting,
            Self::Rendering => Step::Rendering,
            Self::Failed(_) => Step::Failed,
            Self::Done(_) => Step::Done,
        }
    }
}

/// Drives submissions against a shared model provider.
pub struct Interaction<'a, L: ModelLoader> {
    provider: &'a ModelProvider<L>,
    config: &'a AppConfig,
    stage: Stage,
    history: Vec<Step>,
}

impl<'a, L: ModelLoader> Interaction<'a, L> {
    pub fn new(provider: &'a ModelProvider<L>, config: &'a AppConfig) -> Self {
        Self {
            provider,
            config,
            stage: Stage::Idle,
            history: vec![Step::Idle],
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Steps visited by the latest submission, in order.
    pub fn history(&self) -> &[Step] {
        &self.history
    }

    /// Run one submission to completion and return where it ended.
    pub fn submit(&mut self, request: &GenerationRequest) -> &Stage {
        self.history.clear();
        self.enter(Stage::Idle);
        if !request.is_ready() {
            return &self.stage;
        }

        let artifact_dir = self.config.artifact_dir();
        let last = match self.run(request, &artifact_dir) {
            Ok(rendered) => {
                tracing::info!(path = %rendered.audio_path.display(), "generated music ready");
                Stage::Done(rendered)
            }
            Err(failure) => {
                tracing::error!(%failure, "{}", failure.message());
                Stage::Failed(failure)
            }
        };
        self.enter(last);
        &self.stage
    }

    fn run(
        &mut self,
        request: &GenerationRequest,
        artifact_dir: &Path,
    ) -> std::result::Result<Rendered, Failure> {
        self.enter(Stage::Generating);
        tracing::info!(
            description = %request.description(),
            duration_s = request.duration_s(),
            "generating music"
        );
        let waveform = self
            .provider
            .generate(request.description(), request.duration_s())?;

        self.enter(Stage::Persisting);
        let persister = AudioPersister {
            sample_rate: self.config.sample_rate,
            output_dir: artifact_dir.to_path_buf(),
        };
        let written = persister.save(Some(&waveform))?;
        drop(waveform);

        self.enter(Stage::Rendering);
        let audio_path = clip_path(artifact_dir, 0);
        // A file left in the slot by an earlier run does not count.
        if !written.contains(&audio_path) {
            return Err(Failure::OutputFileMissing(audio_path));
        }
        render_clip(audio_path)
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!(step = ?stage.step(), "interaction step");
        self.history.push(stage.step());
        self.stage = stage;
    }
}

/// Read a saved clip back and build the player and download link for it.
pub(crate) fn render_clip(audio_path: PathBuf) -> std::result::Result<Rendered, Failure> {
    if !audio_path.exists() {
        return Err(Failure::OutputFileMissing(audio_path));
    }
    let audio_bytes = std::fs::read(&audio_path).map_err(|e| Failure::FileRead(e.to_string()))?;
    let download_html = encode_download_link(&audio_path, "Audio")
        .map_err(|e| Failure::FileRead(e.to_string()))?;

    Ok(Rendered {
        player_html: inline_player(&audio_bytes),
        audio_path,
        audio_bytes,
        download_html,
    })
}

/// Self-contained results page for one submission.
pub fn render_page(request: &GenerationRequest, stage: &Stage) -> String {
    let mut body = String::new();
    body.push_str("<h1>Text to Music Generator 🎵</h1>\n");
    body.push_str(
        "<details><summary>See explanation</summary><p>Music generator built on a \
         pretrained text-to-music model. We are using the MusicGen Small checkpoint.</p></details>\n",
    );
    body.push_str(&format!(
        "<label>Enter your description<br><textarea name=\"description\" rows=\"4\" cols=\"60\">{}</textarea></label>\n",
        escape_html(request.description())
    ));
    body.push_str(&format!(
        "<label>Select time duration (In Seconds)<br><input type=\"range\" name=\"duration\" min=\"0\" max=\"{MAX_DURATION_S}\" value=\"{0}\"> {0}</label>\n",
        request.duration_s()
    ));

    if request.is_ready() {
        let summary =
            serde_json::to_string_pretty(&request.summary_json()).unwrap_or_default();
        body.push_str(&format!("<pre>{}</pre>\n", escape_html(&summary)));
        body.push_str("<h2>Generated Music</h2>\n");
    }

    match stage {
        Stage::Done(rendered) => {
            body.push_str(&rendered.player_html);
            body.push('\n');
            body.push_str(&rendered.download_html);
            body.push('\n');
        }
        Stage::Failed(failure) => {
            body.push_str(&format!(
                "<div class=\"error\">{}</div>\n",
                escape_html(failure.message())
            ));
        }
        _ => {}
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Music Gen</title>\n\
         <style>.error {{ color: #b00020; border: 1px solid #b00020; padding: 0.5em; }}</style>\n\
         </head>\n<body>\n{body}</body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_long_duration() {
        assert!(GenerationRequest::new("x", 20).is_ok());
        assert!(GenerationRequest::new("x", 0).is_ok());
        assert!(matches!(
            GenerationRequest::new("x", 21),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_description_not_ready() {
        assert!(!GenerationRequest::new("", 10).unwrap().is_ready());
        // Whitespace counts as a description.
        assert!(GenerationRequest::new(" ", 10).unwrap().is_ready());
        assert!(GenerationRequest::new("jazz", 10).unwrap().is_ready());
    }

    #[test]
    fn test_accessors() {
        let request = GenerationRequest::new("ambient drone", 7).unwrap();
        assert_eq!(request.description(), "ambient drone");
        assert_eq!(request.duration_s(), 7);
    }

    #[test]
    fn test_render_clip_reads_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio_0.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        let rendered = render_clip(path.clone()).unwrap();
        assert_eq!(rendered.audio_path, path);
        assert_eq!(rendered.audio_bytes, b"RIFF");
        assert!(rendered.download_html.contains("download=\"audio_0.wav\""));
    }

    #[test]
    fn test_render_clip_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        // Exists, but reading it as a file fails.
        let path = dir.path().join("audio_0.wav");
        std::fs::create_dir(&path).unwrap();
        let failure = render_clip(path).err().unwrap();
        assert!(matches!(failure, Failure::FileRead(_)));
        assert_eq!(failure.message(), "Reading generated audio failed.");
    }

    #[test]
    fn test_render_clip_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let failure = render_clip(dir.path().join("audio_0.wav")).err().unwrap();
        assert!(matches!(failure, Failure::OutputFileMissing(_)));
    }

    #[test]
    fn test_summary_json() {
        let request = GenerationRequest::new("lofi beats", 12).unwrap();
        let summary = request.summary_json();
        assert_eq!(summary["Your Description"], "lofi beats");
        assert_eq!(summary["Selected Time Duration (in Seconds)"], 12);
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            Failure::ModelLoad("x".into()).message(),
            "Music generation failed."
        );
        assert_eq!(
            Failure::Generation("x".into()).message(),
            "Music generation failed."
        );
        assert_eq!(
            Failure::OutputFileMissing(PathBuf::from("a")).message(),
            "Generated audio file not found."
        );
        assert_eq!(
            Failure::from(PersistError::MissingWaveform),
            Failure::PersistenceSkipped
        );
    }

    #[test]
    fn test_render_failed_page() {
        let request = GenerationRequest::new("<script>", 5).unwrap();
        let page = render_page(
            &request,
            &Stage::Failed(Failure::Generation("boom".into())),
        );
        assert!(page.contains("Text to Music Generator"));
        assert!(page.contains("<div class=\"error\">Music generation failed.</div>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_render_idle_page_has_no_results() {
        let request = GenerationRequest::new("", 10).unwrap();
        let page = render_page(&request, &Stage::Idle);
        assert!(!page.contains("Generated Music"));
        assert!(page.contains("value=\"10\""));
    }
}
