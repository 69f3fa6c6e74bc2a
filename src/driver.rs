use std::path::{Path, PathBuf};

use crate::ai::ollama::OllamaClient;
use crate::ai::stt::{SttError, WhisperClient};
use crate::config::AppConfig;
use crate::history::{HistoryStore, LoadOutcome, Role, Turn};
use crate::images::{self, SavedImageArea};

const CAPTION_INSTRUCTION: &str = "Describe this image briefly.";

/// An image accepted by [`ChatDriver::save_image`]: where the copy landed
/// and what the caption model said about it.
#[derive(Debug, Clone)]
pub struct SavedImage {
    pub path: PathBuf,
    pub caption: String,
}

/// Sequences one conversation: appends turns to the history store, packs
/// recent turns into model context, and records replies.
///
/// Owns its service handles outright; each operation is a single awaited
/// unit of work with no internal parallelism or retry.
pub struct ChatDriver {
    config: AppConfig,
    history: HistoryStore,
    images: SavedImageArea,
    llm: OllamaClient,
    stt: WhisperClient,
}

impl ChatDriver {
    pub fn new(config: AppConfig) -> Result<Self, String> {
        let history = HistoryStore::new(&config.log_file)?;
        let images = SavedImageArea::new(&config.images_dir)?;
        let llm = OllamaClient::new(&config);
        let stt = WhisperClient::new(&config);
        Ok(Self {
            config,
            history,
            images,
            llm,
            stt,
        })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Records the user's message, sends the recent window to the model,
    /// records the reply, and returns it. Blocks until the model answers.
    pub async fn generate_response(&mut self, user_text: &str) -> Result<String, String> {
        self.history.append(Role::User, user_text)?;

        let context = build_context(self.history.recent_window(self.config.context_turns));
        log::debug!("Sending {} bytes of context to the model", context.len());

        let reply = self.llm.complete(&context).await?;

        self.history.append(Role::Assistant, reply.content.clone())?;
        Ok(reply.content)
    }

    /// Copies a user-supplied image into the saved area, records it, and
    /// asks the caption model to describe it. A path that does not point
    /// at an existing file yields `Ok(None)` with nothing recorded.
    pub async fn save_image(&mut self, path: &Path) -> Result<Option<SavedImage>, String> {
        if !path.is_file() {
            log::warn!("Image path does not exist: {}", path.display());
            return Ok(None);
        }

        let saved_path = self.images.store(path)?;
        self.history
            .append(Role::Image, saved_path.display().to_string())?;

        let encoded = images::encode_for_caption(&saved_path)?;
        let reply = self.llm.caption(&encoded, CAPTION_INSTRUCTION).await?;

        self.history.append(Role::Assistant, reply.content.clone())?;
        Ok(Some(SavedImage {
            path: saved_path,
            caption: reply.content,
        }))
    }

    /// Turns captured WAV audio into text. The caller decides what to do
    /// with each [`SttError`] variant; nothing is recorded here.
    pub async fn transcribe(&self, audio_wav: Vec<u8>) -> Result<String, SttError> {
        self.stt.transcribe(audio_wav).await
    }

    /// Writes the full transcript to `path` without changing the active log.
    pub fn save_transcript_as(&self, path: &Path) -> Result<(), String> {
        self.history.save_as(path)
    }

    /// Switches to a different log file by replacing the history store
    /// with a fresh one, so no turns from the old log survive the switch.
    pub fn switch_log(&mut self, path: &Path) -> Result<LoadOutcome, String> {
        let history = HistoryStore::new(path)?;
        let outcome = if history.is_empty() && !path.exists() {
            LoadOutcome::NotFound
        } else {
            LoadOutcome::Loaded(history.len())
        };
        self.config.log_file = path.to_path_buf();
        self.history = history;
        Ok(outcome)
    }
}

/// Joins the window's content fields with newlines, oldest first. The
/// model receives raw content only, no role labels.
fn build_context(window: &[Turn]) -> String {
    window
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
