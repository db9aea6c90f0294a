//! Command execution against the story API.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use storytime_core::models::{NewStory, Story, StoryUpdate, Upload, UserProfile};
use storytime_core::{Session, StoryClient};
use tracing::debug;

use crate::cli::{Command, Content, StoryArgs, USAGE};
use crate::utils::{bookmark_line, category_line, story_detail, story_line};

pub async fn run(command: Command, session: &mut Session, client: &StoryClient) -> Result<()> {
    let api = session.authorize(client);
    debug!(authenticated = session.is_authenticated(), "Running command");

    match command {
        Command::Help => print!("{}", USAGE),

        // ===== Session =====
        Command::Login { token } => login(session, client, token).await?,
        Command::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Command::WhoAmI => {
            if !session.is_authenticated() {
                println!("Not signed in");
                return Ok(());
            }
            let user = match session.fetch_current_user(client).await {
                Some(user) => Some(user),
                None => {
                    eprintln!("Could not refresh profile; showing saved copy");
                    session.user().cloned()
                }
            };
            match user {
                Some(user) => print_profile(&user)?,
                None => println!("Signed in (no profile saved)"),
            }
        }
        Command::Profile { changes } => {
            let profile = session
                .update_profile(client, &Value::Object(changes))
                .await?;
            print_profile(&profile)?;
        }

        // ===== Browsing =====
        Command::Stories(query) => print_stories(&api.fetch_stories(&query).await),
        Command::Home => {
            let (popular, newest, categories) = futures::future::join3(
                api.fetch_popular_stories(),
                api.fetch_newest_stories(),
                api.fetch_categories(),
            )
            .await;
            println!("== Popular ==");
            print_stories(&popular);
            println!("\n== Newest ==");
            print_stories(&newest);
            println!("\n== Categories ==");
            print_lines(categories.iter().map(category_line), "No categories.");
        }
        Command::Popular => print_stories(&api.fetch_popular_stories().await),
        Command::Newest => print_stories(&api.fetch_newest_stories().await),
        Command::Categories => {
            print_lines(api.fetch_categories().await.iter().map(category_line), "No categories.")
        }
        Command::Category { id } => print_stories(&api.fetch_category_stories(&id).await),
        Command::Show { id } => print!("{}", story_detail(&api.fetch_story_detail(&id).await?)),

        // ===== Your stories =====
        Command::Mine => {
            require_login(session)?;
            print_stories(&api.fetch_user_stories().await);
        }
        Command::Bookmarks => {
            require_login(session)?;
            print_lines(api.fetch_bookmarks().await.iter().map(bookmark_line), "No bookmarks.");
        }
        Command::Get { id } => print!("{}", story_detail(&api.fetch_story(&id).await?)),
        Command::Create(args) => {
            let story = new_story(args)?;
            let created = api.create_story(&story).await?;
            let id = created.data.as_ref().and_then(|s| s.id.clone());
            println!(
                "{} (id {})",
                created.message_or("Story created"),
                id.as_deref().unwrap_or("?")
            );
        }
        Command::Update { id, args } => {
            let existing = api.fetch_story(&id).await?;
            let update = story_update(args, existing)?;
            let updated = api.update_story(&id, &update).await?;
            println!("{}", updated.message_or("Story updated"));
        }
        Command::Delete { id } => {
            api.delete_story(&id).await?;
            println!("Deleted story {}", id);
        }
        Command::Bookmark { id } => {
            if !api.toggle_bookmark(&id).await? {
                bail!("Bookmark change for story {} was not accepted", id);
            }
            let now = api.check_bookmark_status(&id).await;
            println!(
                "Story {} {}",
                id,
                if now { "bookmarked" } else { "removed from bookmarks" }
            );
        }
        Command::Bookmarked { id } => {
            println!("{}", if api.check_bookmark_status(&id).await { "yes" } else { "no" })
        }
        Command::Upload { files } => {
            let uploads = read_uploads(&files)?;
            match api.upload_images(&uploads).await? {
                Some(urls) => urls.iter().for_each(|url| println!("{}", url)),
                None => bail!("Upload was not accepted"),
            }
        }
    }
    Ok(())
}

async fn login(session: &mut Session, client: &StoryClient, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Token: ").context("Failed to read token")?,
    };
    let token = token.trim();
    if token.is_empty() {
        bail!("Token cannot be empty");
    }

    session.set_token(Some(token))?;
    match session.fetch_current_user(client).await {
        Some(user) => println!("Signed in as {}", user.name().unwrap_or("unknown user")),
        None => eprintln!("Token saved, but the profile could not be fetched"),
    }
    Ok(())
}

/// Listings degrade to empty without a token; say so instead of printing nothing.
fn require_login(session: &Session) -> Result<()> {
    if !session.is_authenticated() {
        bail!("Not signed in. Run `storytime login` first.");
    }
    Ok(())
}

fn print_profile(profile: &UserProfile) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(profile.as_map())?);
    Ok(())
}

fn print_stories(stories: &[Story]) {
    print_lines(stories.iter().map(story_line), "No stories found.");
}

fn print_lines(lines: impl Iterator<Item = String>, empty: &str) {
    let mut any = false;
    for line in lines {
        println!("{}", line);
        any = true;
    }
    if !any {
        println!("{}", empty);
    }
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths
        .iter()
        .map(|path| {
            Upload::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

fn read_content(content: Content) -> Result<String> {
    match content {
        Content::Text(text) => Ok(text),
        Content::File(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn new_story(args: StoryArgs) -> Result<NewStory> {
    let Some(title) = args.title.filter(|t| !t.trim().is_empty()) else {
        bail!("create needs --title");
    };
    let Some(category_id) = args.category.filter(|c| !c.trim().is_empty()) else {
        bail!("create needs --category");
    };
    let Some(content) = args.content else {
        bail!("create needs --content or --content-file");
    };
    Ok(NewStory {
        title,
        category_id,
        content: read_content(content)?,
        cover: read_uploads(&args.covers)?,
    })
}

/// Flags not given keep the story's current values.
fn story_update(args: StoryArgs, existing: Story) -> Result<StoryUpdate> {
    let content = match args.content {
        Some(content) => read_content(content)?,
        None => existing.content.unwrap_or_default(),
    };
    Ok(StoryUpdate {
        title: args.title.unwrap_or(existing.title),
        category_id: args.category.or(existing.category_id).unwrap_or_default(),
        content,
        cover: read_uploads(&args.covers)?,
        existing_cover: existing.cover.filter(|c| !c.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing() -> Story {
        serde_json::from_value(json!({
            "id": 4,
            "title": "Old title",
            "category_id": 2,
            "content": "<p>old</p>",
            "cover": "http://img/old.png"
        }))
        .unwrap()
    }

    #[test]
    fn test_new_story_requires_fields() {
        let args = StoryArgs {
            title: Some("T".into()),
            category: Some("1".into()),
            ..Default::default()
        };
        assert!(new_story(args.clone()).is_err());

        let story = new_story(StoryArgs {
            content: Some(Content::Text("body".into())),
            ..args
        })
        .unwrap();
        assert_eq!(story.title, "T");
        assert_eq!(story.category_id, "1");
        assert_eq!(story.content, "body");
        assert!(story.cover.is_empty());

        assert!(new_story(StoryArgs {
            title: Some(" ".into()),
            category: Some("1".into()),
            content: Some(Content::Text("x".into())),
            covers: vec![],
        })
        .is_err());
    }

    #[test]
    fn test_update_keeps_unspecified_fields() {
        let update = story_update(
            StoryArgs {
                title: Some("New title".into()),
                ..Default::default()
            },
            existing(),
        )
        .unwrap();
        assert_eq!(update.title, "New title");
        assert_eq!(update.category_id, "2");
        assert_eq!(update.content, "<p>old</p>");
        assert_eq!(update.existing_cover.as_deref(), Some("http://img/old.png"));
        assert!(update.cover.is_empty());
    }

    #[test]
    fn test_content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.md");
        std::fs::write(&path, "Once upon a time").unwrap();

        let update = story_update(
            StoryArgs {
                content: Some(Content::File(path)),
                ..Default::default()
            },
            existing(),
        )
        .unwrap();
        assert_eq!(update.content, "Once upon a time");

        let missing = read_content(Content::File(dir.path().join("missing.md")));
        assert!(missing.is_err());
    }

    #[test]
    fn test_read_uploads_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let uploads = read_uploads(&[path]).unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "cover.png");
        assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
        assert!(read_uploads(&[dir.path().join("nope.png")]).is_err());
    }
}
