use storytime_core::models::{Bookmark, Category, Story};

/// Widest title shown in a listing row
const TITLE_WIDTH: usize = 48;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // Keep the YYYY-MM-DD prefix of "YYYY-MM-DD HH:MM:SS" style stamps
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// Story content comes from a rich-text editor; drop tags and collapse
/// whitespace for terminal output.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One listing row: `#id  title  [category] by author, date`
pub fn story_line(story: &Story) -> String {
    let mut line = format!(
        "#{:<5} {}",
        story.id.as_deref().unwrap_or("?"),
        truncate_string(&story.title, TITLE_WIDTH)
    );
    if let Some(category) = story.category_name() {
        line.push_str(&format!("  [{}]", category));
    }
    if let Some(author) = story.author_name() {
        line.push_str(&format!(" by {}", author));
    }
    if let Some(date) = story.created_at() {
        line.push_str(&format!(", {}", format_date(date)));
    }
    line
}

pub fn category_line(category: &Category) -> String {
    format!("#{:<5} {}", category.id.as_deref().unwrap_or("?"), category.name)
}

pub fn bookmark_line(bookmark: &Bookmark) -> String {
    match &bookmark.story {
        Some(story) => story_line(story),
        None => format!("bookmark #{}", bookmark.id.as_deref().unwrap_or("?")),
    }
}

/// Full story view used by `show` and `get`.
pub fn story_detail(story: &Story) -> String {
    let mut out = format!("{}\n", story.title);
    if let Some(category) = story.category_name().or(story.category_id.as_deref()) {
        out.push_str(&format!("Category: {}\n", category));
    }
    if let Some(author) = story.author_name() {
        out.push_str(&format!("Author:   {}\n", author));
    }
    if let Some(date) = story.created_at() {
        out.push_str(&format!("Created:  {}\n", format_date(date)));
    }
    if let Some(cover) = story.cover.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("Cover:    {}\n", cover));
    }
    for image in &story.images {
        out.push_str(&format!("Image:    {}\n", image));
    }
    if let Some(content) = story.content.as_deref() {
        out.push('\n');
        out.push_str(&strip_html(content));
        out.push('\n');
    }
    out
}
