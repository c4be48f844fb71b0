//! Page-level signals: robots directives, canonical reference, links and
//! social markup.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::parse::{Document, Element};

/// Anchor text recorded for links without any text.
pub const EMPTY_ANCHOR: &str = "[No Text]";

/// Link containers excluded from the link report.
const CHROME_TAGS: &[&str] = &["header", "footer", "nav"];

/// The `robots` meta directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RobotsStatus {
    /// Raw `content`, empty when the tag is missing.
    pub content: String,
    /// False when the directive contains `noindex`.
    pub is_indexable: bool,
}

/// The canonical reference compared against the page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalStatus {
    /// Raw `href`, empty when the tag is missing.
    pub href: String,
    pub is_match: bool,
    /// Page URL without its fragment, empty when unknown.
    pub current_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkItem {
    pub anchor: String,
    /// Absolute URL.
    pub href: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
    pub total: usize,
}

/// Links outside the page chrome, split by host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkAnalysis {
    pub internal: Vec<LinkItem>,
    pub external: Vec<LinkItem>,
    pub counts: LinkCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenGraph {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TwitterCard {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

/// schema.org JSON-LD blocks, flattened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaOrg {
    /// True when the page has at least one JSON-LD script, valid or not.
    pub exists: bool,
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocialTags {
    pub open_graph: OpenGraph,
    pub twitter_card: TwitterCard,
    pub schema_org: SchemaOrg,
}

/// Reads the robots meta directive.
pub fn robots(doc: &Document) -> RobotsStatus {
    let content = doc.meta_content("robots").unwrap_or_default();
    let is_indexable = !content.to_lowercase().contains("noindex");
    RobotsStatus { content, is_indexable }
}

/// Resolves `link[rel=canonical]` against the page URL and compares the two.
///
/// Without a page URL only absolute canonical references can be read, and they
/// never match.
pub fn canonical(doc: &Document) -> CanonicalStatus {
    let current = doc.base_url().map(|url| {
        let mut url = url.clone();
        url.set_fragment(None);
        url
    });

    let href = doc
        .select_first(r#"link[rel="canonical"]"#)
        .ok()
        .flatten()
        .and_then(|el| el.attr("href"))
        .unwrap_or_default()
        .to_string();

    let is_match = match (&current, href.is_empty()) {
        (Some(current), false) => current.join(&href).map(|resolved| resolved == *current).unwrap_or(false),
        _ => false,
    };

    CanonicalStatus { href, is_match, current_url: current.map(|u| u.to_string()).unwrap_or_default() }
}

/// Collects anchors outside `header`, `footer` and `nav`.
///
/// Hrefs are resolved against the page URL; anything that does not resolve is
/// skipped. A link is internal when its host equals the page host.
pub fn links(doc: &Document) -> LinkAnalysis {
    let page = doc.base_url();
    let mut analysis = LinkAnalysis::default();

    let Ok(anchors) = doc.select("a[href]") else {
        return analysis;
    };

    for anchor in anchors.iter().filter(|a| !a.has_ancestor(CHROME_TAGS)) {
        let Some(url) = anchor.attr("href").and_then(|href| resolve(page, href)) else {
            continue;
        };

        let item = LinkItem { anchor: anchor_text(anchor), href: url.to_string() };
        match page {
            Some(page) if page.host_str() == url.host_str() => analysis.internal.push(item),
            _ => analysis.external.push(item),
        }
    }

    analysis.counts = LinkCounts {
        internal: analysis.internal.len(),
        external: analysis.external.len(),
        total: analysis.internal.len() + analysis.external.len(),
    };
    analysis
}

fn resolve(page: Option<&Url>, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match page {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}

fn anchor_text(anchor: &Element<'_>) -> String {
    let text = anchor.text();
    let text = text.trim();
    if text.is_empty() { EMPTY_ANCHOR.to_string() } else { text.to_string() }
}

/// Reads Open Graph, Twitter card and JSON-LD markup.
pub fn social(doc: &Document) -> SocialTags {
    let title = doc.meta_content("og:title");
    let description = doc.meta_content("og:description");
    let image = doc.meta_content("og:image");
    let exists = title.is_some() || description.is_some() || image.is_some();
    let open_graph = OpenGraph { exists, title, description, image };

    let card = doc.meta_content("twitter:card");
    let site = doc.meta_content("twitter:site");
    let twitter_card = TwitterCard { exists: card.is_some() || site.is_some(), card, site };

    SocialTags { open_graph, twitter_card, schema_org: schema_org(doc) }
}

/// Parses every JSON-LD script. Top-level arrays and `@graph` arrays are
/// flattened; invalid JSON is skipped.
pub fn schema_org(doc: &Document) -> SchemaOrg {
    let scripts = doc.select(r#"script[type="application/ld+json"]"#).unwrap_or_default();
    let mut data = Vec::new();

    for script in &scripts {
        let text = script.text();
        let Ok(value) = serde_json::from_str::<Value>(text.trim()) else {
            tracing::debug!("skipping invalid JSON-LD block");
            continue;
        };

        match value {
            Value::Array(items) => data.extend(items),
            Value::Object(mut obj) if obj.get("@graph").is_some_and(Value::is_array) => {
                if let Some(Value::Array(items)) = obj.remove("@graph") {
                    data.extend(items);
                }
            }
            other => data.push(other),
        }
    }

    SchemaOrg { exists: !scripts.is_empty(), data }
}
