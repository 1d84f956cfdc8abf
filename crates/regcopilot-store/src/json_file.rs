//! Whole-file JSON persistence.
//!
//! Writes go to a temporary file in the destination directory and are then
//! renamed over the target, so readers see either the old or the new file.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::PersistError;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let raw = std::fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&raw).map_err(|source| PersistError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err(dir))?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|source| PersistError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(b"\n").map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| PersistError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_creates_parent_dirs_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/out.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        write_json(&path, &vec![4]).unwrap();
        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![4]);
    }

    #[test]
    fn read_malformed_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json::<Vec<i32>>(&path).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }));
    }

    #[test]
    fn read_missing_is_io() {
        let tmp = TempDir::new().unwrap();
        let err = read_json::<Vec<i32>>(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PersistError::Io { .. }));
    }
}
