use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub storage_key: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    /// Without an explicit file the slot lives in `./<storage_key>.json`.
    #[must_use]
    pub fn new(api_url: Option<String>, storage_key: String, session_file: Option<PathBuf>) -> Self {
        let session_file =
            session_file.unwrap_or_else(|| PathBuf::from(format!("{storage_key}.json")));
        Self {
            api_url,
            storage_key,
            session_file,
        }
    }
}
