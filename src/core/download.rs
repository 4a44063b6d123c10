//! # Chart Downloads
//!
//! Saves fetched image bytes into the download directory as
//! `visualization-<unix-millis>.png`.
//!
//! Bytes go to a `.tmp` file first and are `rename()`d into place, so a
//! half-written chart never appears under its final name and the temporary
//! file never outlives the call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;

/// File name for a download started at `timestamp_millis`.
pub fn visualization_file_name(timestamp_millis: i64) -> String {
    format!("visualization-{timestamp_millis}.png")
}

/// Write `bytes` into `dir` under a fresh timestamped name and return its path.
pub fn save_visualization(dir: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    save_as(dir, &visualization_file_name(Utc::now().timestamp_millis()), bytes)
}

fn save_as(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let target = dir.join(file_name);
    let tmp = target.with_extension("png.tmp");

    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, &target)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    debug!("Saved {} bytes to {}", bytes.len(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_embeds_timestamp() {
        assert_eq!(
            visualization_file_name(1_700_000_000_123),
            "visualization-1700000000123.png"
        );
    }

    #[test]
    fn save_writes_bytes_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_as(dir.path(), "visualization-1.png", b"\x89PNG").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["visualization-1.png".to_string()]);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let path = save_visualization(&nested, b"data").unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("visualization-"));
    }

    #[test]
    fn save_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        assert!(save_visualization(&blocker, b"data").is_err());
    }
}
