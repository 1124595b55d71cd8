use crate::feed::{parse_items, FeedItem, FetchedFeed};

/// One feed's heading and its parsed items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSection {
    pub name: String,
    pub items: Vec<FeedItem>,
}

impl FeedSection {
    pub fn new(name: impl Into<String>, items: Vec<FeedItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

impl From<&FetchedFeed> for FeedSection {
    fn from(feed: &FetchedFeed) -> Self {
        Self::new(feed.name.clone(), parse_items(&feed.content))
    }
}

/// Renders sections as a markdown checklist, one heading per feed.
///
/// The layout is consumed by markdown checklist tooling, keep it byte-exact:
///
/// ```text
/// # <feed name>
///
/// - [ ] **<title>**
///   - Date: <date>
///   - [Article Link](<link>) | [Comments](<comments>)
///
/// ```
///
/// followed by one extra blank line after each feed's items.
pub fn render_digest(sections: &[FeedSection]) -> String {
    let mut out = String::new();

    for section in sections {
        out.push_str(&format!("# {}\n\n", section.name));

        for item in &section.items {
            out.push_str(&format!(
                "- [ ] **{}**\n  - Date: {}\n  - [Article Link]({}) | [Comments]({})\n\n",
                item.title, item.pub_date, item.link, item.comments
            ));
        }

        out.push('\n');
    }

    out
}
