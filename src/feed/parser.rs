use quick_xml::escape::{resolve_html5_entity, unescape_with};
use serde::Deserialize;

// ============================================================================
// Wire Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RawChannel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawChannel {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "item")]
    items: Vec<RawItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItem {
    title: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

// ============================================================================
// Decoded Types
// ============================================================================

/// One parsed feed document with free-text fields entity-decoded
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<Item>,
}

/// One feed entry. `pub_date` is the raw date string from the document;
/// interpreting it is the ingestion engine's concern.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Parse an RSS document from raw response bytes.
///
/// Decodes the fixed `rss > channel > item*` schema; missing elements
/// default to empty strings rather than failing the document. HTML entities
/// in the channel title/description and every item title/description are
/// resolved so downstream consumers see literal text.
pub fn parse_channel(body: &[u8]) -> Result<Channel, quick_xml::DeError> {
    let text = String::from_utf8_lossy(body);
    let doc: RssDocument = quick_xml::de::from_str(&text)?;
    let raw = doc.channel;

    Ok(Channel {
        title: decode_entities(&raw.title),
        link: raw.link,
        description: decode_entities(&raw.description),
        items: raw
            .items
            .into_iter()
            .map(|item| Item {
                title: decode_entities(&item.title),
                link: item.link,
                description: decode_entities(&item.description),
                pub_date: item.pub_date,
            })
            .collect(),
    })
}

/// Resolve HTML entity references (`&amp;`, `&nbsp;`, `&#8217;`, ...) in
/// free text. Malformed ampersand sequences leave the input unchanged;
/// feed text must never fail ingestion over a stray `&`.
fn decode_entities(text: &str) -> String {
    match unescape_with(text, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}
