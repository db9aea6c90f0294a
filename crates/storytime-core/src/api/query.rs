/// Filters for the story listing. Only non-empty filters reach the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    pub sort: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
}

impl StoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Query parameters in `sort`, `title`, `category` order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("sort", &self.sort),
            ("title", &self.title),
            ("category", &self.category),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((key, v)),
            _ => None,
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}
