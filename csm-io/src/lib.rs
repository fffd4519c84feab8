//! Thin wrappers around file reads and writes. Every error carries the offending path, since
//! config and keyfile handling moves a lot of paths around and the bare `std::io` messages do not
//! say which file failed.
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum IoError {
    #[error("File read error at path {path}")]
    FileReadError {
        #[source]
        source: std::io::Error,
        path: String,
    },

    #[error("File write error at path {path}")]
    FileWriteError {
        #[source]
        source: std::io::Error,
        path: String,
    },

    #[error("JSON parse error at path {path}")]
    SerdeJsonError {
        #[source]
        source: serde_json::Error,
        path: String,
    },

    #[error("TOML deserialize error at path {path}")]
    TomlDeError {
        #[source]
        source: toml::de::Error,
        path: String,
    },

    #[error("TOML serialize error at path {path}")]
    TomlSerError {
        #[source]
        source: toml::ser::Error,
        path: String,
    },

    #[error("Directory creation error at path {path}")]
    DirCreationError {
        #[source]
        source: std::io::Error,
        path: String,
    },
}

pub fn read_json<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, IoError> {
    let json_str = fs::read_to_string(path)
        .map_err(|e| IoError::FileReadError { source: e, path: path.display().to_string() })?;
    let res = serde_json::from_str::<T>(&json_str)
        .map_err(|e| IoError::SerdeJsonError { source: e, path: path.display().to_string() })?;
    Ok(res)
}

pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), IoError> {
    let data = serde_json::to_string(data)
        .map_err(|e| IoError::SerdeJsonError { source: e, path: path.display().to_string() })?;
    fs::write(path, data)
        .map_err(|e| IoError::FileWriteError { source: e, path: path.display().to_string() })?;
    Ok(())
}

pub fn read_toml<T: for<'a> Deserialize<'a>>(path: &Path) -> Result<T, IoError> {
    let toml_str = fs::read_to_string(path)
        .map_err(|e| IoError::FileReadError { source: e, path: path.display().to_string() })?;
    let res = toml::from_str(&toml_str)
        .map_err(|e| IoError::TomlDeError { source: e, path: path.display().to_string() })?;
    Ok(res)
}

/// Serializes `data` to `path`, creating missing parent directories first.
pub fn write_toml<T: Serialize>(path: &Path, data: &T) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let data = toml::to_string(data)
        .map_err(|e| IoError::TomlSerError { source: e, path: path.display().to_string() })?;
    fs::write(path, data)
        .map_err(|e| IoError::FileWriteError { source: e, path: path.display().to_string() })?;
    Ok(())
}

pub fn create_dir_all(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path)
        .map_err(|e| IoError::DirCreationError { source: e, path: path.display().to_string() })?;
    Ok(())
}

#[cfg(test)]
mod io_tests {
    use super::*;
    use std::{fs::File, io::Write};
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct RpcEntry {
        network: String,
        url: String,
        chain_id: u64,
    }

    #[test]
    fn test_read_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");

        let data = vec![1, 2, 3];
        let data_str = serde_json::to_string(&data).unwrap();

        let mut file = File::create(&path).unwrap();
        file.write_all(data_str.as_bytes()).unwrap();

        let res: Vec<u64> = read_json(&path).unwrap();
        assert_eq!(res, data);

        let new_data = vec![4, 5, 6];
        write_json(&path, &new_data).unwrap();

        let res: Vec<u64> = read_json(&path).unwrap();
        assert_eq!(res, new_data);
    }

    #[test]
    fn test_write_toml_creates_parent_dirs() {
        let data = RpcEntry {
            network: "holesky".to_string(),
            url: "http://localhost:8545".to_string(),
            chain_id: 17000,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rpc.toml");

        write_toml(&path, &data).unwrap();

        let res: RpcEntry = read_toml(&path).unwrap();
        assert_eq!(res, data);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = read_json::<Vec<u64>>(&path).unwrap_err();
        match err {
            IoError::FileReadError { path: p, .. } => assert!(p.ends_with("missing.json")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
