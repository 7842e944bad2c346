mod settings;

pub use settings::{SettingsRepository, SqliteSettingsRepository};
