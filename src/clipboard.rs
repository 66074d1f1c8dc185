// Best-effort clipboard support. A `Clipboard` is a ranked list of copy
// strategies tried in order; the first one that succeeds wins and failures
// are never surfaced to the user.

use log::debug;
use std::io::Write;
use std::process::{Command, Stdio};

/// One way of putting text on the system clipboard.
pub trait CopyStrategy {
    fn name(&self) -> &str;
    fn copy(&self, text: &str) -> std::io::Result<()>;
}

/// Pipes the text into an external clipboard utility.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: &'static str,
    args: &'static [&'static str],
}

impl ExternalCommand {
    pub const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        ExternalCommand { program, args }
    }
}

impl CopyStrategy for ExternalCommand {
    fn name(&self) -> &str {
        self.program
    }

    fn copy(&self, text: &str) -> std::io::Result<()> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} exited with {}", self.program, status),
            ))
        }
    }
}

pub struct Clipboard {
    strategies: Vec<Box<dyn CopyStrategy>>,
}

impl Clipboard {
    /// Strategies for the current platform.
    ///
    /// - Windows: `clip`
    /// - macOS: `pbcopy`
    /// - other Unix: `wl-copy`, then `xclip`, then `xsel`
    pub fn system() -> Self {
        let mut strategies: Vec<Box<dyn CopyStrategy>> = Vec::new();

        #[cfg(target_os = "windows")]
        strategies.push(Box::new(ExternalCommand::new("clip", &[])));

        #[cfg(target_os = "macos")]
        strategies.push(Box::new(ExternalCommand::new("pbcopy", &[])));

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            strategies.push(Box::new(ExternalCommand::new("wl-copy", &[])));
            strategies.push(Box::new(ExternalCommand::new(
                "xclip",
                &["-selection", "clipboard"],
            )));
            strategies.push(Box::new(ExternalCommand::new(
                "xsel",
                &["--clipboard", "--input"],
            )));
        }

        Clipboard { strategies }
    }

    /// A clipboard that never copies anything.
    pub fn disabled() -> Self {
        Clipboard {
            strategies: Vec::new(),
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn CopyStrategy>>) -> Self {
        Clipboard { strategies }
    }

    /// Returns whether any strategy managed to copy the text.
    pub fn copy(&self, text: &str) -> bool {
        for strategy in &self.strategies {
            match strategy.copy(text) {
                Ok(()) => {
                    debug!("copied to clipboard with {}", strategy.name());
                    return true;
                }
                Err(e) => debug!("clipboard strategy {} failed: {}", strategy.name(), e),
            }
        }
        false
    }
}
