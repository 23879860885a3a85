//! Persist the best score to disk (XDG config or ~/.config/ochimikan).

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscores";

/// Returns the path to the high score file (config dir / ochimikan / highscores).
fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("ochimikan").join(FILENAME)
}

/// Best score so far; 0 when missing or unreadable.
pub fn load_high_score() -> u64 {
    load_from(&config_path())
}

/// Saves the best score. Creates the config directory if needed.
pub fn save_high_score(score: u64) -> Result<()> {
    save_to(&config_path(), score)
}

fn load_from(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| content.lines().next()?.trim().parse().ok())
        .unwrap_or(0)
}

fn save_to(path: &Path, score: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{score}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_missing_file() {
        let dir = std::env::temp_dir().join(format!("ochimikan-test-{}", std::process::id()));
        let path = dir.join("nested").join(FILENAME);
        assert_eq!(load_from(&path), 0);

        save_to(&path, 12_345).unwrap();
        assert_eq!(load_from(&path), 12_345);

        fs::write(&path, "not a number\n").unwrap();
        assert_eq!(load_from(&path), 0);
        fs::remove_dir_all(dir).unwrap();
    }
}
