use std::fs;
use std::path::PathBuf;

/// Persisted high score: one non-negative integer. Collaborator failures are
/// swallowed — a missing or unreadable value reads as zero and a failed write
/// never reaches the game.
pub trait ScoreStore {
    fn load(&mut self) -> u32;
    fn save(&mut self, value: u32);
}

/// Plain-text file in the platform data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            path: base.join("flappy-term").join("highscore"),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ScoreStore for FileStore {
    fn load(&mut self) -> u32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn save(&mut self, value: u32) {
        if let Some(dir) = self.path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let _ = fs::write(&self.path, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let path = std::env::temp_dir()
            .join(format!("flappy-term-test-{}-{}", name, std::process::id()))
            .join("highscore");
        let _ = fs::remove_file(&path);
        FileStore::with_path(path)
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let mut store = temp_store("missing");
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn saved_value_round_trips() {
        let mut store = temp_store("roundtrip");
        store.save(42);
        assert_eq!(store.load(), 42);
        store.save(117);
        assert_eq!(store.load(), 117);
    }

    #[test]
    fn garbage_reads_as_zero() {
        let mut store = temp_store("garbage");
        store.save(7);
        fs::write(store.path.clone(), "not a number").unwrap();
        assert_eq!(store.load(), 0);
    }
}
