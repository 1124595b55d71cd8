use quick_xml::events::Event;
use quick_xml::Reader;

const NO_TITLE: &str = "No Title";
const NO_DATE: &str = "No Date";
const NO_LINK: &str = "#";

/// Child elements looked up for every item, in `FeedItem` field order.
const FIELD_TAGS: [&[u8]; 4] = [b"title", b"pubDate", b"link", b"comments"];

/// One `<item>` of a feed document. Values are copied verbatim from the XML
/// text, no date or URL parsing happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub pub_date: String,
    pub link: String,
    pub comments: String,
}

impl Default for FeedItem {
    fn default() -> Self {
        Self {
            title: NO_TITLE.to_string(),
            pub_date: NO_DATE.to_string(),
            link: NO_LINK.to_string(),
            comments: NO_LINK.to_string(),
        }
    }
}

#[derive(Debug, Default)]
enum Field {
    #[default]
    Missing,
    /// Inside the first matching descendant, which opened at `depth`.
    Capturing { depth: usize, text: String },
    Found(String),
}

impl Field {
    fn into_value(self, default: &str) -> String {
        let text = match self {
            Field::Missing => String::new(),
            Field::Capturing { text, .. } | Field::Found(text) => text,
        };
        if text.is_empty() {
            default.to_string()
        } else {
            text
        }
    }
}

/// An `<item>` whose end tag has not been seen yet.
struct OpenItem {
    slot: usize,
    depth: usize,
    fields: [Field; 4],
}

impl OpenItem {
    fn finish(self) -> FeedItem {
        let [title, pub_date, link, comments] = self.fields;
        FeedItem {
            title: title.into_value(NO_TITLE),
            pub_date: pub_date.into_value(NO_DATE),
            link: link.into_value(NO_LINK),
            comments: comments.into_value(NO_LINK),
        }
    }
}

/// Extracts every `<item>` element of `content`, in document order.
///
/// Items are matched by qualified tag name at any depth, so nested items are
/// reported too. Each field is the full text of the first descendant element
/// with the field's tag name; a missing element or empty text falls back to
/// the default (`No Title`, `No Date`, `#`).
///
/// Never fails. Malformed XML stops extraction at the first syntax error and
/// only the items closed before it are returned.
pub fn parse_items(content: &str) -> Vec<FeedItem> {
    // SEC-002: quick-xml 0.37 never expands <!ENTITY> declarations, only the
    // five predefined entities and character references.
    let mut reader = Reader::from_str(content);

    // Slots keep document order of start tags while items close inner-first
    let mut slots: Vec<Option<FeedItem>> = Vec::new();
    let mut open: Vec<OpenItem> = Vec::new();
    let mut depth: usize = 0;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.name();
                if let Some(index) = field_index(name.as_ref()) {
                    for item in open.iter_mut() {
                        if matches!(item.fields[index], Field::Missing) {
                            item.fields[index] = Field::Capturing {
                                depth,
                                text: String::new(),
                            };
                        }
                    }
                } else if name.as_ref() == b"item" {
                    open.push(OpenItem {
                        slot: slots.len(),
                        depth,
                        fields: Default::default(),
                    });
                    slots.push(None);
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if let Some(index) = field_index(name.as_ref()) {
                    for item in open.iter_mut() {
                        if matches!(item.fields[index], Field::Missing) {
                            item.fields[index] = Field::Found(String::new());
                        }
                    }
                } else if name.as_ref() == b"item" {
                    slots.push(Some(FeedItem::default()));
                }
            }
            Ok(Event::Text(e)) => {
                if is_capturing(&open) {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        // Unknown entities (&nbsp; and friends) are kept as written
                        Err(_) => String::from_utf8_lossy(&e).into_owned(),
                    };
                    append_text(&mut open, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if is_capturing(&open) {
                    append_text(&mut open, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => {
                for item in open.iter_mut() {
                    for field in item.fields.iter_mut() {
                        if let Field::Capturing { depth: d, text } = field {
                            if *d == depth {
                                *field = Field::Found(std::mem::take(text));
                            }
                        }
                    }
                }
                if e.name().as_ref() == b"item"
                    && open.last().is_some_and(|item| item.depth == depth)
                {
                    if let Some(item) = open.pop() {
                        let slot = item.slot;
                        slots[slot] = Some(item.finish());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    position = reader.error_position(),
                    error = %e,
                    "Malformed feed XML, keeping items parsed so far"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    slots.into_iter().flatten().collect()
}

fn field_index(name: &[u8]) -> Option<usize> {
    FIELD_TAGS.iter().position(|tag| *tag == name)
}

fn is_capturing(open: &[OpenItem]) -> bool {
    open.iter().any(|item| {
        item.fields
            .iter()
            .any(|field| matches!(field, Field::Capturing { .. }))
    })
}

fn append_text(open: &mut [OpenItem], chunk: &str) {
    for item in open.iter_mut() {
        for field in item.fields.iter_mut() {
            if let Field::Capturing { text, .. } = field {
                text.push_str(chunk);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_rss_items() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Channel title is not an item</title>
    <item>
        <title>First</title>
        <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
        <link>https://example.com/1</link>
        <comments>https://example.com/1#comments</comments>
    </item>
    <item>
        <title>Second</title>
        <link>https://example.com/2</link>
    </item>
</channel></rss>"#;

        let items = parse_items(rss);

        assert_eq!(
            items,
            vec![
                FeedItem {
                    title: "First".into(),
                    pub_date: "Mon, 01 Jan 2024 00:00:00 GMT".into(),
                    link: "https://example.com/1".into(),
                    comments: "https://example.com/1#comments".into(),
                },
                FeedItem {
                    title: "Second".into(),
                    pub_date: "No Date".into(),
                    link: "https://example.com/2".into(),
                    comments: "#".into(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_and_empty_fields_use_defaults() {
        let rss = "<rss><channel><item><title></title><link/></item></channel></rss>";
        assert_eq!(parse_items(rss), vec![FeedItem::default()]);
    }

    #[test]
    fn test_empty_item_element() {
        assert_eq!(parse_items("<channel><item/></channel>"), vec![FeedItem::default()]);
    }

    #[test]
    fn test_first_matching_element_wins() {
        let rss = "<item><link></link><link>https://example.com/late</link></item>";
        assert_eq!(parse_items(rss)[0].link, "#");

        let rss = "<item><title>One</title><title>Two</title></item>";
        assert_eq!(parse_items(rss)[0].title, "One");
    }

    #[test]
    fn test_text_content_includes_descendants_and_cdata() {
        let rss = "<item><title>Rust <b>1.80</b> <![CDATA[<released>]]></title></item>";
        assert_eq!(parse_items(rss)[0].title, "Rust 1.80 <released>");
    }

    #[test]
    fn test_entities_unescaped_and_whitespace_kept() {
        let rss = "<item><title>  Q&amp;A &#8212; today  </title></item>";
        assert_eq!(parse_items(rss)[0].title, "  Q&A \u{2014} today  ");
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        let rss = "<item><title>a&nbsp;b</title></item>";
        assert_eq!(parse_items(rss)[0].title, "a&nbsp;b");
    }

    #[test]
    fn test_prefixed_tags_do_not_match() {
        let rss = r#"<rdf:RDF xmlns:rdf="r" xmlns:dc="d">
            <rdf:item><title>Not an item</title></rdf:item>
            <item><dc:title>Wrong tag</dc:title></item>
        </rdf:RDF>"#;
        assert_eq!(parse_items(rss), vec![FeedItem::default()]);
    }

    #[test]
    fn test_atom_entries_are_not_items() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
            <entry><title>Atom entry</title></entry>
        </feed>"#;
        assert!(parse_items(atom).is_empty());
    }

    #[test]
    fn test_nested_items_in_document_order() {
        let rss = "<item><link>outer</link><item><title>inner</title></item></item>";
        let items = parse_items(rss);

        assert_eq!(items.len(), 2);
        // The outer item has no title of its own, so it picks up the inner one
        assert_eq!(items[0].title, "inner");
        assert_eq!(items[0].link, "outer");
        assert_eq!(items[1].title, "inner");
        assert_eq!(items[1].link, "#");
    }

    #[test]
    fn test_not_xml_yields_no_items() {
        assert!(parse_items("").is_empty());
        assert!(parse_items("plain text, not a feed").is_empty());
        assert!(parse_items("{\"json\": true}").is_empty());
    }

    #[test]
    fn test_malformed_xml_keeps_closed_items() {
        let rss = "<channel><item><title>ok</title></item><item><title>broken</wrong></item>";
        let items = parse_items(rss);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "ok");
    }

    proptest! {
        #[test]
        fn parse_never_panics(input in ".{0,200}") {
            let _ = parse_items(&input);
        }

        #[test]
        fn every_item_is_reported(titles in prop::collection::vec("[a-zA-Z0-9 ]{1,20}", 0..10)) {
            let body: String = titles
                .iter()
                .map(|t| format!("<item><title>{t}</title></item>"))
                .collect();
            let items = parse_items(&format!("<rss><channel>{body}</channel></rss>"));

            let parsed: Vec<_> = items.into_iter().map(|i| i.title).collect();
            prop_assert_eq!(parsed, titles);
        }
    }
}
