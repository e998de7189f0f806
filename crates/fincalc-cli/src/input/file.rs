use fincalc_core::GuardConfig;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON request file into a typed input struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?;
    Ok(value)
}

/// Load guard bounds from `--limits`, or the compiled-in defaults.
///
/// The file may name any subset of fields; the rest keep their defaults.
pub fn read_limits(path: Option<&str>) -> Result<GuardConfig, Box<dyn std::error::Error>> {
    let limits = match path {
        Some(p) => {
            let limits: GuardConfig = read_json(p)?;
            log::debug!("loaded limits from {p}: {limits:?}");
            limits
        }
        None => GuardConfig::default(),
    };
    limits.validate()?;
    Ok(limits)
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.is_file() {
        return Err(format!("Not a readable file: {}", resolved.display()).into());
    }
    Ok(resolved)
}
