use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{EtlError, Result};

/// File layout of the staged artifacts handed between pipeline stages.
#[derive(Debug, Clone)]
pub struct StagePaths {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
}

impl StagePaths {
    pub fn new(settings: &Settings) -> Self {
        Self {
            raw_dir: PathBuf::from(&settings.stage.raw_dir),
            processed_dir: PathBuf::from(&settings.stage.processed_dir),
        }
    }

    pub fn from_dirs<P: Into<PathBuf>, Q: Into<PathBuf>>(raw_dir: P, processed_dir: Q) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
        }
    }

    /// Extractor output: JSON array of media items with attached comments.
    pub fn raw_posts(&self) -> PathBuf {
        self.raw_dir.join("raw_posts.json")
    }

    /// Transformer outputs. Posts and comments are tabular (one record per
    /// line); flat texts are a single JSON array.
    pub fn posts(&self) -> PathBuf {
        self.processed_dir.join("posts.ndjson")
    }

    pub fn comments(&self) -> PathBuf {
        self.processed_dir.join("comments.ndjson")
    }

    pub fn flat_texts(&self) -> PathBuf {
        self.processed_dir.join("flat_texts.json")
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a JSON document next to its final path, then rename into place.
/// A killed run leaves at most a stale .tmp file, never a truncated artifact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path);
    {
        let mut w = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.write_all(b"\n")?;
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write rows as NDJSON (one JSON record per line) with the same
/// write-then-rename discipline.
pub fn write_ndjson_atomic<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_sibling(path);
    {
        let mut w = BufWriter::new(File::create(&tmp)?);
        for row in rows {
            serde_json::to_writer(&mut w, row)?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a JSON artifact, mapping absence to MissingInput so the caller
/// knows which stage has to run first.
pub fn read_json<T: DeserializeOwned>(path: &Path, produced_by: &'static str) -> Result<T> {
    if !path.exists() {
        return Err(EtlError::MissingInput {
            path: path.to_path_buf(),
            stage: produced_by,
        });
    }
    let rdr = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(rdr)?)
}

/// Read an NDJSON artifact into rows, skipping blank lines.
pub fn read_ndjson<T: DeserializeOwned>(path: &Path, produced_by: &'static str) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(EtlError::MissingInput {
            path: path.to_path_buf(),
            stage: produced_by,
        });
    }
    let rdr = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_paths(dir: &tempfile::TempDir) -> StagePaths {
        StagePaths::from_dirs(dir.path().join("raw"), dir.path().join("processed"))
    }

    #[test]
    fn json_round_trip_is_atomic() {
        let dir = tempdir().unwrap();
        // Parent directories do not exist yet; the writer creates them.
        let path = test_paths(&dir).raw_posts();
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();

        let got: Vec<i32> = read_json(&path, "extract").unwrap();
        assert_eq!(got, vec![1, 2, 3]);
        // No temp file left behind after the rename.
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn ndjson_round_trip_preserves_order() {
        let dir = tempdir().unwrap();
        let path = test_paths(&dir).posts();
        let rows = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        write_ndjson_atomic(&path, &rows).unwrap();

        let got: Vec<String> = read_ndjson(&path, "transform").unwrap();
        assert_eq!(got, rows);
    }

    #[test]
    fn missing_artifact_names_producing_stage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = read_json::<Vec<i32>>(&path, "extract").unwrap_err();
        match err {
            EtlError::MissingInput { path: p, stage } => {
                assert_eq!(p, path);
                assert_eq!(stage, "extract");
            }
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }
}
