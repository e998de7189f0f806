pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use std::error::Error;

/// Pick the request source: `--input` file, then piped stdin, then flags.
pub fn resolve<T, F>(input_path: Option<&str>, from_flags: F) -> Result<T, Box<dyn Error>>
where
    T: DeserializeOwned,
    F: FnOnce() -> Result<T, Box<dyn Error>>,
{
    if let Some(path) = input_path {
        return file::read_json(path);
    }
    if let Some(data) = stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    from_flags()
}

/// Error for a missing flag when no `--input` or stdin was given.
pub fn required(flag: &str) -> String {
    format!("--{flag} is required (or provide --input)")
}
