pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a JSON request from `--input <file>` if given, otherwise from piped
/// stdin. Returns `None` when neither source supplies anything, so callers can
/// fall back to command-line flags.
pub fn load_json<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}
