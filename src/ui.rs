// UI layer: controllers translating parsed commands into gateway calls and
// terminal output. Results go to `out`, request failures to `err`.

use crate::api::{
    ApiClient, ApiError, Gist, GistEdit, GistListing, NewGist, RepoOwner, Visibility,
};
use crate::cli::{
    Cli, Commands, CreateArgs, EditArgs, GistCommands, GistListArgs, RepoCommands, RepoListArgs,
};
use crate::clipboard::Clipboard;
use crate::credentials;
use anyhow::{Context, Result};
use crossterm::tty::IsTty;
use log::{debug, warn};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Filename used for pastes read from standard input without `--name`.
pub const STDIN_NAME: &str = "stdin";

/// Whether a dispatched command fully succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    fn and(self, other: Outcome) -> Outcome {
        if self == Outcome::Success && other == Outcome::Success {
            Outcome::Success
        } else {
            Outcome::Failed
        }
    }
}

/// Where the text of a create/edit comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    /// An explicit path wins (`-` meaning stdin). Without one, stdin is only
    /// used when it is not an interactive terminal.
    pub fn resolve(paste: Option<&Path>, stdin_is_tty: bool) -> Option<InputSource> {
        match paste {
            Some(p) if p == Path::new("-") => Some(InputSource::Stdin),
            Some(p) => Some(InputSource::File(p.to_path_buf())),
            None if !stdin_is_tty => Some(InputSource::Stdin),
            None => None,
        }
    }

    /// Filename for the gist: the override, else the file's basename.
    pub fn filename(&self, name: Option<&str>) -> String {
        if let Some(n) = name {
            return n.to_string();
        }
        match self {
            InputSource::File(p) => p
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| STDIN_NAME.to_string()),
            InputSource::Stdin => STDIN_NAME.to_string(),
        }
    }

    pub fn read(&self) -> Result<String> {
        match self {
            InputSource::File(p) => std::fs::read_to_string(p)
                .with_context(|| format!("Reading {}", p.display())),
            InputSource::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Reading standard input")?;
                Ok(buf)
            }
        }
    }
}

/// Which gists `list` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityFilter {
    Any,
    Only(Visibility),
}

impl VisibilityFilter {
    pub fn admits(self, gist: &Gist) -> bool {
        match self {
            VisibilityFilter::Any => true,
            VisibilityFilter::Only(v) => gist.visibility == v,
        }
    }
}

/// Newest first. The sort is stable, so gists created at the same instant
/// keep the order the service returned them in; gists without a timestamp
/// go last.
pub fn sort_newest_first(gists: &mut [Gist]) {
    gists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub struct Controller<'a, O: Write, E: Write> {
    api: &'a ApiClient,
    clipboard: &'a Clipboard,
    verbose: bool,
    stdin_is_tty: bool,
    out: O,
    err: E,
}

impl<'a, O: Write, E: Write> Controller<'a, O, E> {
    pub fn new(api: &'a ApiClient, clipboard: &'a Clipboard, out: O, err: E) -> Self {
        Controller {
            api,
            clipboard,
            verbose: false,
            stdin_is_tty: std::io::stdin().is_tty(),
            out,
            err,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn stdin_is_tty(mut self, is_tty: bool) -> Self {
        self.stdin_is_tty = is_tty;
        self
    }

    pub fn dispatch(&mut self, command: &Commands) -> Result<Outcome> {
        match command {
            Commands::Gist(GistCommands::Create(args)) => self.create(args),
            Commands::Gist(GistCommands::Edit(args)) => self.edit(args),
            Commands::Gist(GistCommands::Delete(args)) => {
                self.each(&args.ids, |api, id| api.delete_gist(id), "Deleted")
            }
            Commands::Gist(GistCommands::List(args)) => self.list(args),
            Commands::Gist(GistCommands::Star(args)) => {
                self.each(&args.ids, |api, id| api.star_gist(id), "Starred")
            }
            Commands::Gist(GistCommands::Unstar(args)) => {
                self.each(&args.ids, |api, id| api.unstar_gist(id), "Unstarred")
            }
            Commands::Gist(GistCommands::View(args)) => self.view(&args.ids),
            Commands::Repo(RepoCommands::List(args)) => self.repo_list(args),
        }
    }

    /// Print a failed item: a rejected status verbatim, an unreadable body
    /// with its cause. Transport and header errors are fatal and handed back
    /// to the caller.
    fn report(&mut self, res: std::result::Result<(), ApiError>) -> Result<Outcome> {
        match res {
            Ok(()) => Ok(Outcome::Success),
            Err(ApiError::Status { status, body }) => {
                writeln!(self.err, "{} {}", status, body)?;
                Ok(Outcome::Failed)
            }
            Err(e @ ApiError::Decode(_)) => {
                writeln!(self.err, "{:#}", anyhow::Error::from(e))?;
                Ok(Outcome::Failed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_input(
        &mut self,
        paste: Option<&Path>,
        name: Option<&str>,
    ) -> Result<Option<(String, String)>> {
        match InputSource::resolve(paste, self.stdin_is_tty) {
            Some(source) => {
                let filename = source.filename(name);
                let content = source.read()?;
                Ok(Some((filename, content)))
            }
            None => {
                writeln!(
                    self.err,
                    "Nothing to paste: pass a file or pipe content on standard input"
                )?;
                Ok(None)
            }
        }
    }

    fn announce(&mut self, html_url: &str) -> Result<()> {
        writeln!(self.out, "{}", html_url)?;
        if !self.clipboard.copy(html_url) {
            debug!("could not copy {} to the clipboard", html_url);
        }
        Ok(())
    }

    pub fn create(&mut self, args: &CreateArgs) -> Result<Outcome> {
        let Some((filename, content)) =
            self.read_input(args.paste.as_deref(), args.name.as_deref())?
        else {
            return Ok(Outcome::Failed);
        };
        let visibility = Visibility::from(args.public);
        let gist = NewGist::single_file(filename, content, args.message.clone(), visibility);

        match self.api.create_gist(&gist) {
            Ok(created) => {
                self.announce(&created.html_url)?;
                Ok(Outcome::Success)
            }
            Err(e) => self.report(Err(e)),
        }
    }

    pub fn edit(&mut self, args: &EditArgs) -> Result<Outcome> {
        let Some((filename, content)) =
            self.read_input(args.paste.as_deref(), args.name.as_deref())?
        else {
            return Ok(Outcome::Failed);
        };
        let description = Some(args.message.clone()).filter(|m| !m.is_empty());
        let edit = GistEdit::single_file(filename, content, description);

        match self.api.edit_gist(&args.id, &edit) {
            Ok(edited) => {
                self.announce(&edited.html_url)?;
                Ok(Outcome::Success)
            }
            Err(e) => self.report(Err(e)),
        }
    }

    /// Run `call` for every id in turn, confirming each success with
    /// `<verb> <id>`. A failed id does not stop the rest.
    fn each<F>(&mut self, ids: &[String], call: F, verb: &str) -> Result<Outcome>
    where
        F: Fn(&ApiClient, &str) -> std::result::Result<(), ApiError>,
    {
        let mut outcome = Outcome::Success;
        for id in ids {
            let res = call(self.api, id);
            let done = self.report(res)?;
            if done == Outcome::Success {
                writeln!(self.out, "{} {}", verb, id)?;
            } else {
                warn!("{} failed for {}", verb.to_lowercase(), id);
            }
            outcome = outcome.and(done);
        }
        Ok(outcome)
    }

    pub fn view(&mut self, ids: &[String]) -> Result<Outcome> {
        let mut outcome = Outcome::Success;
        for id in ids {
            let gist = match self.api.get_gist(id) {
                Ok(gist) => gist,
                Err(e) => {
                    outcome = outcome.and(self.report(Err(e))?);
                    continue;
                }
            };
            for (name, file) in &gist.files {
                if self.verbose {
                    writeln!(self.out, "{}", "-".repeat(10))?;
                    writeln!(
                        self.out,
                        "name: {}\n  raw_url: {}\n  size: {}",
                        file.filename.as_deref().unwrap_or(name),
                        file.raw_url.as_deref().unwrap_or(""),
                        file.size.map(|s| s.to_string()).unwrap_or_default()
                    )?;
                    writeln!(self.out, "{}", "-".repeat(10))?;
                }
                writeln!(self.out, "{}", file.content.as_deref().unwrap_or(""))?;
            }
        }
        Ok(outcome)
    }

    pub fn list(&mut self, args: &GistListArgs) -> Result<Outcome> {
        let listing = if args.all {
            GistListing::AllPublic
        } else if let Some(user) = &args.user {
            GistListing::User(user.clone())
        } else if args.starred {
            GistListing::Starred
        } else {
            GistListing::Own
        };
        let filter = if args.only_public {
            VisibilityFilter::Only(Visibility::Public)
        } else if args.only_private {
            VisibilityFilter::Only(Visibility::Private)
        } else {
            VisibilityFilter::Any
        };

        let mut gists = match self.api.list_gists(&listing) {
            Ok(gists) => gists,
            Err(e) => return self.report(Err(e)),
        };
        gists.retain(|g| filter.admits(g));
        sort_newest_first(&mut gists);

        for gist in &gists {
            if self.verbose {
                let files: Vec<&str> = gist.files.keys().map(String::as_str).collect();
                writeln!(
                    self.out,
                    "{}:\n  description: {}\n  files: {}",
                    gist.html_url,
                    gist.description.as_deref().unwrap_or(""),
                    files.join(" ")
                )?;
            } else {
                writeln!(self.out, "{}", gist.html_url)?;
            }
        }
        Ok(Outcome::Success)
    }

    pub fn repo_list(&mut self, args: &RepoListArgs) -> Result<Outcome> {
        let owner = if let Some(user) = &args.user {
            RepoOwner::User(user.clone())
        } else if let Some(org) = &args.org {
            RepoOwner::Org(org.clone())
        } else {
            RepoOwner::Authenticated
        };

        let repos = match self.api.list_repos(&owner) {
            Ok(repos) => repos,
            Err(e) => return self.report(Err(e)),
        };
        for repo in &repos {
            writeln!(
                self.out,
                "{} {} {}",
                repo.name,
                repo.description.as_deref().unwrap_or(""),
                repo.html_url
            )?;
        }
        Ok(Outcome::Success)
    }
}

/// Load credentials, then dispatch the parsed command against the API
/// configured by the environment.
pub fn run(cli: Cli) -> Result<Outcome> {
    let mut api = ApiClient::from_env().context("Failed to build HTTP client")?;
    let config = credentials::expand_home(&cli.config);
    let token = credentials::load_or_create(&config, &cli.login, &api, credentials::prompt_password)?;
    api.set_token(&token);

    let clipboard = if cli.no_clipboard {
        Clipboard::disabled()
    } else {
        Clipboard::system()
    };
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut controller =
        Controller::new(&api, &clipboard, stdout.lock(), stderr.lock()).verbose(cli.verbose);
    controller.dispatch(&cli.command)
}
