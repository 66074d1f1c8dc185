// Command line definition: two resources, `gist` and `repo`, each with its
// own subcommands, plus global options shared by all of them.

use crate::credentials::DEFAULT_CONFIG;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gist")]
#[command(about = "Command line tool for gist.github.com", long_about = None)]
pub struct Cli {
    /// Credentials file to use
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// Turn on additional output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Github login used when authorizing for the first time
    #[arg(long, global = true, default_value_t = default_login())]
    pub login: String,

    /// Do not copy resulting URLs to the clipboard
    #[arg(long, global = true)]
    pub no_clipboard: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage gists
    #[command(subcommand)]
    Gist(GistCommands),
    /// Manage repos
    #[command(subcommand)]
    Repo(RepoCommands),
}

#[derive(Subcommand, Debug)]
pub enum GistCommands {
    /// Create a new gist
    Create(CreateArgs),
    /// Edit an existing gist
    Edit(EditArgs),
    /// Delete gists
    Delete(IdsArgs),
    /// List gists. Defaults to showing all your gists
    List(GistListArgs),
    /// Star gists
    Star(IdsArgs),
    /// Unstar gists
    Unstar(IdsArgs),
    /// View gists
    View(IdsArgs),
}

#[derive(Subcommand, Debug)]
pub enum RepoCommands {
    /// List repos owned by a user or org
    List(RepoListArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Give an explicit filename. Most useful for stdin
    #[arg(short, long)]
    pub name: Option<String>,

    /// A message describing this gist
    #[arg(short, long, default_value = "")]
    pub message: String,

    /// Make the gist public
    #[arg(long)]
    pub public: bool,

    /// File to paste, or - for stdin
    pub paste: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Gist id
    #[arg(long)]
    pub id: String,

    /// Give an explicit filename. Most useful for stdin
    #[arg(short, long)]
    pub name: Option<String>,

    /// A new description for this gist
    #[arg(short, long, default_value = "")]
    pub message: String,

    /// File to paste, or - for stdin
    pub paste: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct IdsArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct GistListArgs {
    /// A user's public gists
    #[arg(short, long)]
    pub user: Option<String>,

    /// All public gists
    #[arg(short, long)]
    pub all: bool,

    /// Only your private gists
    #[arg(long)]
    pub only_private: bool,

    /// Only your public gists
    #[arg(long)]
    pub only_public: bool,

    /// Your starred gists
    #[arg(long)]
    pub starred: bool,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct RepoListArgs {
    /// A user's repos
    #[arg(short, long)]
    pub user: Option<String>,

    /// An org's repos
    #[arg(short, long)]
    pub org: Option<String>,
}

fn default_login() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_defaults_to_private_without_message() {
        let cli = Cli::try_parse_from(["gist", "gist", "create", "notes.txt"]).unwrap();
        match cli.command {
            Commands::Gist(GistCommands::Create(args)) => {
                assert!(!args.public);
                assert_eq!(args.message, "");
                assert_eq!(args.paste, Some(PathBuf::from("notes.txt")));
                assert!(args.name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config, "~/.gist");
    }

    #[test]
    fn list_visibility_filters_are_mutually_exclusive() {
        let res = Cli::try_parse_from(["gist", "gist", "list", "--only-public", "--only-private"]);
        assert!(res.is_err());
        let res = Cli::try_parse_from(["gist", "gist", "list", "--all", "--starred"]);
        assert!(res.is_err());
    }

    #[test]
    fn repo_list_user_and_org_conflict() {
        assert!(Cli::try_parse_from(["gist", "repo", "list", "-u", "a", "-o", "b"]).is_err());
        assert!(Cli::try_parse_from(["gist", "repo", "list", "-o", "b"]).is_ok());
    }

    #[test]
    fn id_commands_need_at_least_one_id() {
        assert!(Cli::try_parse_from(["gist", "gist", "delete"]).is_err());
        let cli = Cli::try_parse_from(["gist", "gist", "star", "a", "b"]).unwrap();
        match cli.command {
            Commands::Gist(GistCommands::Star(args)) => assert_eq!(args.ids, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["gist", "gist", "view", "x", "-v", "--no-clipboard"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_clipboard);
    }

    #[test]
    fn edit_requires_id() {
        assert!(Cli::try_parse_from(["gist", "gist", "edit", "file.txt"]).is_err());
    }
}
