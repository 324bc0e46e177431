//! JSON snapshot output, one file per run.

use std::path::{Path, PathBuf};

use spacetime_core::Run;

use crate::error::EngineError;

/// Write `run` as `<dir>/<name>-<run id>.json`, creating `dir` if needed.
///
/// # Errors
///
/// Returns [`EngineError::Write`] if the directory or file cannot be
/// written, or the error of any lazily computed annotation.
pub fn write(dir: &Path, run: &Run, pretty: bool) -> Result<PathBuf, EngineError> {
    std::fs::create_dir_all(dir).map_err(|source| EngineError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let snapshot = run.snapshot()?;
    let json = if pretty {
        serde_json::to_vec_pretty(&snapshot)?
    } else {
        serde_json::to_vec(&snapshot)?
    };

    let path = dir.join(file_name(&run.config().name, &run.id().to_string()));
    std::fs::write(&path, json).map_err(|source| EngineError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// File name for a run, with anything but ASCII alphanumerics, `-` and `_`
/// in the run name replaced by `_`.
fn file_name(name: &str, id: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{clean}-{id}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(file_name("horizon 1.5/a", "x"), "horizon_1_5_a-x.json");
        assert_eq!(file_name("baseline", "abc"), "baseline-abc.json");
    }
}
