//! Slugs and user markup.

use std::collections::{HashMap, HashSet};

use rand::Rng;

const SAFE_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "blockquote", "br", "code", "em", "i", "li", "ol", "p", "pre", "strong", "ul",
];

/// URL-safe form of `name`. Non-ASCII text is transliterated.
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

/// Post slugs carry 8 random hex characters so equal titles never collide.
pub fn post_slug(title: &str) -> String {
    let suffix = format!("{:08x}", rand::thread_rng().r#gen::<u32>());
    match slugify(title) {
        base if base.is_empty() => suffix,
        base => format!("{base}-{suffix}"),
    }
}

/// Reduces user supplied HTML to the allow-listed formatting tags.
pub fn sanitize(content: &str) -> String {
    let tag_attributes = HashMap::from([
        ("a", HashSet::from(["href", "title"])),
        ("abbr", HashSet::from(["title"])),
        ("acronym", HashSet::from(["title"])),
    ]);
    ammonia::Builder::default()
        .tags(SAFE_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("nofollow noopener noreferrer"))
        .clean(content)
        .to_string()
}

/// Splits the comma separated tag field. Blank entries are dropped and
/// repeated names collapse to their first occurrence.
pub fn split_tag_names(csv: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    csv.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_is_deterministic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust & Tokio!  "), "rust-tokio");
        assert_eq!(slugify("Hello World"), slugify("Hello World"));
    }

    #[test]
    fn equal_titles_get_distinct_post_slugs() {
        let a = post_slug("Same title");
        let b = post_slug("Same title");
        assert_ne!(a, b);
        assert!(a.starts_with("same-title-"));
        assert_eq!(a.len(), "same-title-".len() + 8);
    }

    #[test]
    fn untitled_posts_still_get_a_slug() {
        assert_eq!(post_slug("!!!").len(), 8);
    }

    #[test]
    fn sanitize_strips_scripts_and_unknown_attributes() {
        let dirty = r#"<p onclick="x()">hi <script>alert(1)</script><strong>there</strong></p>"#;
        assert_eq!(sanitize(dirty), "<p>hi <strong>there</strong></p>");
    }

    #[test]
    fn sanitize_keeps_safe_links() {
        let clean = sanitize(r#"<a href="https://example.com" style="color:red">x</a>"#);
        assert!(clean.contains(r#"href="https://example.com""#));
        assert!(!clean.contains("style"));
        assert!(!sanitize(r#"<a href="javascript:alert(1)">x</a>"#).contains("javascript"));
    }

    #[test]
    fn tag_csv_is_trimmed_and_deduplicated() {
        assert_eq!(split_tag_names(" rust, web ,,rust , "), vec!["rust", "web"]);
        assert!(split_tag_names("").is_empty());
    }
}
