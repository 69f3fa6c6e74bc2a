pub mod ai;
pub mod config;
pub mod driver;
pub mod history;
pub mod images;

pub use config::AppConfig;
pub use driver::{ChatDriver, SavedImage};
pub use history::{HistoryStore, LoadOutcome, Role, Turn};
