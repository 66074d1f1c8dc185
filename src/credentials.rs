// Credential store: the bearer token lives in a JSON file (by default
// `~/.gist`) holding the authorization response exactly as the service
// returned it.

use crate::api::ApiClient;
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default location of the credential file.
pub const DEFAULT_CONFIG: &str = "~/.gist";

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if path == "~" {
        dir
    } else if let Some(rest) = path.strip_prefix("~/") {
        dir.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Return the stored token, or run the one-time authorization exchange and
/// persist its response to `path`.
///
/// `prompt` is only called when the file does not exist yet.
pub fn load_or_create<F>(path: &Path, login: &str, api: &ApiClient, prompt: F) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    if path.exists() {
        debug!("loading credentials from {}", path.display());
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Reading credentials from {}", path.display()))?;
        return token_from(&data)
            .with_context(|| format!("Malformed credentials file {}", path.display()));
    }

    info!("no credentials at {}, authorizing {}", path.display(), login);
    let password = prompt()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Authorizing...");
    let response = api.authorize(login, &password);
    spinner.finish_and_clear();
    let response = response.context("Authorization failed")?;

    let token = token_from(&response).context("Parsing authorization response")?;
    persist(path, &response)?;
    Ok(token)
}

/// Hidden password prompt on the terminal.
pub fn prompt_password() -> Result<String> {
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()?;
    Ok(password)
}

fn token_from(data: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    value
        .get("token")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing `token` field"))
}

/// Write the file readable by its owner only.
fn persist(path: &Path, response: &str) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("Writing credentials to {}", path.display()))?;
    file.write_all(response.as_bytes())
        .with_context(|| format!("Writing credentials to {}", path.display()))?;
    debug!("credentials written to {}", path.display());
    Ok(())
}
