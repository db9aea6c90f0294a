//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};
use storytime_core::StoryQuery;

pub const USAGE: &str = "\
Usage: storytime <command> [args]

Session:
  login [TOKEN]             Save a bearer token (prompts when omitted)
  logout                    Forget token and profile
  whoami                    Show the signed-in user
  profile KEY=VALUE...      Update profile fields

Browsing:
  stories [--sort S] [--title T] [--category C]
  home                      Popular, newest and categories at once
  popular | newest | categories
  category ID               Stories in a category
  show ID                   Public story detail

Your stories:
  mine | bookmarks
  get ID                    Fetch one of your stories
  create --title T --category C (--content TEXT | --content-file FILE) [--cover FILE]...
  update ID [--title T] [--category C] [--content TEXT | --content-file FILE] [--cover FILE]...
  delete ID
  bookmark ID               Toggle a bookmark
  bookmarked ID             Check whether a story is bookmarked
  upload FILE...            Upload images and print their URLs
";

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    File(PathBuf),
}

/// Flags shared by `create` and `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryArgs {
    pub title: Option<String>,
    pub category: Option<String>,
    pub content: Option<Content>,
    pub covers: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Login { token: Option<String> },
    Logout,
    WhoAmI,
    Profile { changes: Map<String, Value> },
    Stories(StoryQuery),
    Home,
    Popular,
    Newest,
    Categories,
    Category { id: String },
    Mine,
    Bookmarks,
    Show { id: String },
    Get { id: String },
    Create(StoryArgs),
    Update { id: String, args: StoryArgs },
    Delete { id: String },
    Bookmark { id: String },
    Bookmarked { id: String },
    Upload { files: Vec<PathBuf> },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "help" | "--help" | "-h" => Command::Help,
            "login" => Command::Login {
                token: optional_positional(rest)?,
            },
            "logout" => no_args(rest, Command::Logout)?,
            "whoami" => no_args(rest, Command::WhoAmI)?,
            "profile" => Command::Profile {
                changes: parse_assignments(rest)?,
            },
            "stories" => Command::Stories(parse_query(rest)?),
            "home" => no_args(rest, Command::Home)?,
            "popular" => no_args(rest, Command::Popular)?,
            "newest" => no_args(rest, Command::Newest)?,
            "categories" => no_args(rest, Command::Categories)?,
            "category" => Command::Category { id: single_id(rest)? },
            "mine" => no_args(rest, Command::Mine)?,
            "bookmarks" => no_args(rest, Command::Bookmarks)?,
            "show" => Command::Show { id: single_id(rest)? },
            "get" => Command::Get { id: single_id(rest)? },
            "create" => Command::Create(parse_story_args(rest)?),
            "update" => {
                let (id, flags) = rest
                    .split_first()
                    .ok_or_else(|| anyhow!("update needs a story ID"))?;
                Command::Update {
                    id: id.clone(),
                    args: parse_story_args(flags)?,
                }
            }
            "delete" => Command::Delete { id: single_id(rest)? },
            "bookmark" => Command::Bookmark { id: single_id(rest)? },
            "bookmarked" => Command::Bookmarked { id: single_id(rest)? },
            "upload" => {
                if rest.is_empty() {
                    bail!("upload needs at least one file");
                }
                Command::Upload {
                    files: rest.iter().map(PathBuf::from).collect(),
                }
            }
            other => bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

fn no_args(rest: &[String], command: Command) -> Result<Command> {
    if let Some(extra) = rest.first() {
        bail!("Unexpected argument: {}", extra);
    }
    Ok(command)
}

fn optional_positional(rest: &[String]) -> Result<Option<String>> {
    match rest {
        [] => Ok(None),
        [value] => Ok(Some(value.clone())),
        [_, extra, ..] => bail!("Unexpected argument: {}", extra),
    }
}

fn single_id(rest: &[String]) -> Result<String> {
    optional_positional(rest)?
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("Missing ID argument"))
}

/// Walk `--flag value` pairs, handing each to `apply`.
fn parse_flags(
    rest: &[String],
    mut apply: impl FnMut(&str, String) -> Result<()>,
) -> Result<()> {
    let mut iter = rest.iter();
    while let Some(flag) = iter.next() {
        if !flag.starts_with("--") {
            bail!("Unexpected argument: {}", flag);
        }
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", flag))?;
        apply(flag, value.clone())?;
    }
    Ok(())
}

fn parse_query(rest: &[String]) -> Result<StoryQuery> {
    let mut query = StoryQuery::new();
    parse_flags(rest, |flag, value| {
        match flag {
            "--sort" => query.sort = Some(value),
            "--title" => query.title = Some(value),
            "--category" => query.category = Some(value),
            other => bail!("Unknown flag for stories: {}", other),
        }
        Ok(())
    })?;
    Ok(query)
}

fn parse_story_args(rest: &[String]) -> Result<StoryArgs> {
    let mut args = StoryArgs::default();
    parse_flags(rest, |flag, value| {
        match flag {
            "--title" => args.title = Some(value),
            "--category" => args.category = Some(value),
            "--content" => args.content = Some(Content::Text(value)),
            "--content-file" => args.content = Some(Content::File(PathBuf::from(value))),
            "--cover" => args.covers.push(PathBuf::from(value)),
            other => bail!("Unknown flag: {}", other),
        }
        Ok(())
    })?;
    Ok(args)
}

/// `KEY=VALUE` pairs; values that parse as JSON keep their type.
fn parse_assignments(rest: &[String]) -> Result<Map<String, Value>> {
    if rest.is_empty() {
        bail!("profile needs at least one KEY=VALUE");
    }
    rest.iter()
        .map(|pair| {
            let (key, raw) = pair
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| anyhow!("Expected KEY=VALUE, got {}", pair))?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Ok((key.to_string(), value))
        })
        .collect()
}
