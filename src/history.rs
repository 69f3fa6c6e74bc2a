use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const USER_PREFIX: &str = "You:";
const ASSISTANT_PREFIX: &str = "Assistant:";

/// Matches an image reference line like `![Image](/path/to/file.png)`.
static IMAGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[Image\]\((.+)\)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    Image,
}

/// One recorded unit of conversation: a user message, an assistant reply,
/// or a reference to a saved image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Encodes this turn as one log-file line (without the trailing newline).
    pub fn encode(&self) -> String {
        match self.role {
            Role::User => format!("{} {}", USER_PREFIX, self.content),
            Role::Assistant => format!("{} {}", ASSISTANT_PREFIX, self.content),
            Role::Image => format!("![Image]({})", self.content),
        }
    }

    /// Classifies one log-file line by its prefix. Lines that match no
    /// known prefix yield `None` and are skipped on load.
    pub fn decode(line: &str) -> Option<Self> {
        if let Some(caps) = IMAGE_LINE.captures(line) {
            return Some(Self::new(Role::Image, caps[1].trim()));
        }
        if let Some(rest) = line.strip_prefix(USER_PREFIX) {
            return Some(Self::new(Role::User, rest.trim()));
        }
        if let Some(rest) = line.strip_prefix(ASSISTANT_PREFIX) {
            return Some(Self::new(Role::Assistant, rest.trim()));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The log file existed; `n` lines classified into turns.
    Loaded(usize),
    /// No log file at the path. The transcript is left empty.
    NotFound,
}

/// In-memory transcript backed by a line-oriented log file.
///
/// The log file is the source of truth: `append` writes the encoded line
/// to disk before mutating the in-memory transcript, so a crash between
/// the two effects never records a turn that is missing from the file.
pub struct HistoryStore {
    log_path: PathBuf,
    turns: Vec<Turn>,
}

impl HistoryStore {
    /// Opens a store against `path` and loads whatever history it holds.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, String> {
        let mut store = Self {
            log_path: path.into(),
            turns: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Clears the transcript and replays the log file line by line.
    /// A missing file is not an error; it just means empty history.
    pub fn load(&mut self) -> Result<LoadOutcome, String> {
        self.turns.clear();

        if !self.log_path.exists() {
            return Ok(LoadOutcome::NotFound);
        }

        let file = std::fs::File::open(&self.log_path)
            .map_err(|e| format!("Failed to open log {}: {}", self.log_path.display(), e))?;

        for line in BufReader::new(file).lines() {
            let line = line
                .map_err(|e| format!("Failed to read log {}: {}", self.log_path.display(), e))?;
            if let Some(turn) = Turn::decode(&line) {
                self.turns.push(turn);
            }
        }

        log::info!(
            "Loaded {} turns from {}",
            self.turns.len(),
            self.log_path.display()
        );
        Ok(LoadOutcome::Loaded(self.turns.len()))
    }

    /// Records one turn: the encoded line goes to the log file first,
    /// then the turn is pushed onto the in-memory transcript.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> Result<(), String> {
        let turn = Turn::new(role, content);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| format!("Failed to open log {}: {}", self.log_path.display(), e))?;
        writeln!(file, "{}", turn.encode())
            .map_err(|e| format!("Failed to append to log {}: {}", self.log_path.display(), e))?;

        self.turns.push(turn);
        Ok(())
    }

    /// The last `n` turns in chronological order. A plain turn-count
    /// cutoff; no token accounting.
    pub fn recent_window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// The full transcript as encoded display lines.
    pub fn render(&self) -> Vec<String> {
        self.turns.iter().map(Turn::encode).collect()
    }

    pub fn render_text(&self) -> String {
        self.render().join("\n")
    }

    /// Writes the full rendered transcript to `path`, overwriting any
    /// existing content. Does not change the active log path.
    pub fn save_as(&self, path: &Path) -> Result<(), String> {
        let mut text = self.render_text();
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(path, text)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_log.md");
        (dir, path)
    }

    #[test]
    fn missing_log_file_yields_empty_history() {
        let (_dir, path) = temp_log();
        let store = HistoryStore::new(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_reports_not_found_for_missing_file() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        assert_eq!(store.load().unwrap(), LoadOutcome::NotFound);
    }

    #[test]
    fn append_then_window_returns_turns_in_order() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        store.append(Role::User, "hi").unwrap();
        store.append(Role::Assistant, "hello").unwrap();

        let window = store.recent_window(10);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0], Turn::new(Role::User, "hi"));
        assert_eq!(window[1], Turn::new(Role::Assistant, "hello"));
    }

    #[test]
    fn recent_window_is_a_turn_count_cutoff() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        for i in 0..7 {
            store.append(Role::User, format!("msg {}", i)).unwrap();
        }

        assert_eq!(store.recent_window(3).len(), 3);
        assert_eq!(store.recent_window(3)[0].content, "msg 4");
        assert_eq!(store.recent_window(3)[2].content, "msg 6");
        // n larger than the transcript returns everything, once.
        assert_eq!(store.recent_window(100).len(), 7);
    }

    #[test]
    fn append_adds_exactly_one_turn_at_the_end() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        store.append(Role::User, "first").unwrap();
        let before = store.len();
        store.append(Role::Assistant, "second").unwrap();

        assert_eq!(store.len(), before + 1);
        let last = store.recent_window(100).last().unwrap();
        assert_eq!(*last, Turn::new(Role::Assistant, "second"));
    }

    #[test]
    fn render_then_load_round_trips_text_turns() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        store.append(Role::User, "what is rust?").unwrap();
        store.append(Role::Assistant, "a systems language").unwrap();
        store.append(Role::User, "thanks").unwrap();

        let copy = path.with_file_name("copy.md");
        store.save_as(&copy).unwrap();

        let reloaded = HistoryStore::new(&copy).unwrap();
        assert_eq!(reloaded.turns(), store.turns());
    }

    #[test]
    fn image_line_classifies_as_image_turn() {
        let turn = Turn::decode("![Image](/tmp/x.png)").unwrap();
        assert_eq!(turn.role, Role::Image);
        assert_eq!(turn.content, "/tmp/x.png");
    }

    #[test]
    fn image_turns_survive_reload() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        store.append(Role::Image, "/tmp/shot.png").unwrap();
        store.append(Role::Assistant, "a screenshot").unwrap();

        let reloaded = HistoryStore::new(&path).unwrap();
        assert_eq!(reloaded.turns()[0], Turn::new(Role::Image, "/tmp/shot.png"));
        assert_eq!(reloaded.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn unrecognized_lines_are_ignored_on_load() {
        let (_dir, path) = temp_log();
        std::fs::write(&path, "You: hi\n# a manual note\nAssistant: hello\n").unwrap();

        let store = HistoryStore::new(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.turns()[0].role, Role::User);
        assert_eq!(store.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn render_reconstructs_the_encoding() {
        let (_dir, path) = temp_log();
        let mut store = HistoryStore::new(&path).unwrap();
        store.append(Role::User, "hi").unwrap();
        store.append(Role::Image, "/tmp/x.png").unwrap();

        let lines = store.render();
        assert_eq!(lines, vec!["You: hi", "![Image](/tmp/x.png)"]);
    }
}
