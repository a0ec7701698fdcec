use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

/// The banner the store renders over the buy button when stock runs out.
const STATUS_SELECTOR: &str = "div.ogs-v2-text.weight-bold.color-danger.align-center";

static STATUS_BANNER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(STATUS_SELECTOR).expect("status selector is valid"));

static SOLD_OUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSOLD\s+OUT\b").expect("sold out pattern is valid"));

/// Elements whose text never renders on the page.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Where a "sold out" indicator was found, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Inside the dedicated status banner.
    Element,
    /// Only in the whole-page text. May be unrelated copy on the page.
    Page,
    Absent,
}

impl Detection {
    #[must_use]
    pub fn is_sold_out(self) -> bool {
        !matches!(self, Detection::Absent)
    }
}

/// Scans `html` for the sold out indicator, checking the status banner
/// first and the full document text second.
///
/// # Behavior
///
/// - Text inside `script`, `style`, `noscript` and `template` is ignored
/// - A banner without the indicator does not short-circuit the page scan
/// - Matching is case-insensitive and needs whitespace between the words
#[must_use]
pub fn detect(html: &str) -> Detection {
    let document = Html::parse_document(html);

    if let Some(banner) = document.select(&STATUS_BANNER).next() {
        if SOLD_OUT.is_match(&visible_text(banner)) {
            return Detection::Element;
        }
    }

    if SOLD_OUT.is_match(&visible_text(document.root_element())) {
        Detection::Page
    } else {
        Detection::Absent
    }
}

#[must_use]
pub fn is_sold_out(html: &str) -> bool {
    detect(html).is_sold_out()
}

// Text nodes are trimmed and joined with a space so neighbouring inline
// elements never run together.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) if !node.ancestors().any(|a| is_hidden(a.value())) => {
                Some(text.trim())
            }
            _ => None,
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_hidden(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| HIDDEN_ELEMENTS.iter().any(|&name| name == element.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(banner: Option<&str>, body: &str) -> String {
        let banner = banner.map_or(String::new(), |text| {
            format!(r#"<div class="ogs-v2-text weight-bold color-danger align-center">{text}</div>"#)
        });
        format!("<html><head><title>SMK272</title></head><body>{banner}<p>{body}</p></body></html>")
    }

    #[test]
    fn test_banner_sold_out() {
        let html = page(Some("SOLD OUT"), "Tour T-shirt");
        assert_eq!(detect(&html), Detection::Element);
        assert!(is_sold_out(&html));
    }

    #[test]
    fn test_fallback_only_sold_out() {
        let html = page(None, "This item is sold out.");
        assert_eq!(detect(&html), Detection::Page);
        assert!(is_sold_out(&html));
    }

    #[test]
    fn test_banner_without_indicator_falls_back_to_page() {
        let html = page(Some("Few left"), "Sold Out");
        assert_eq!(detect(&html), Detection::Page);
    }

    #[test]
    fn test_available() {
        let html = page(None, "Add to cart");
        assert_eq!(detect(&html), Detection::Absent);
        assert!(!is_sold_out(&html));
    }

    #[test]
    fn test_case_and_whitespace_tolerant() {
        for text in ["sold out", "Sold  Out", "SOLD\n\tOUT", "sOlD oUt!"] {
            assert!(is_sold_out(&page(Some(text), "")), "{text:?} should match");
        }
    }

    #[test]
    fn test_word_boundaries_required() {
        for text in ["soldout", "SOLD OUTLET", "UNSOLD OUT", "sold-out"] {
            assert!(!is_sold_out(&page(None, text)), "{text:?} should not match");
        }
    }

    #[test]
    fn test_split_across_inline_elements() {
        let html = r#"<div class="ogs-v2-text weight-bold color-danger align-center"><span>SOLD</span><span>OUT</span></div>"#;
        assert_eq!(detect(html), Detection::Element);
    }

    #[test]
    fn test_banner_needs_all_classes() {
        let html = r#"<div class="ogs-v2-text color-danger">SOLD OUT</div>"#;
        assert_eq!(detect(html), Detection::Page);
    }

    #[test]
    fn test_script_and_style_text_is_not_visible() {
        let html = r#"<html><head>
            <script>window.__I18N__={"soldOut":"SOLD OUT"};</script>
            <style>.badge::after{content:"sold out"}</style>
            </head><body>
            <noscript>Sold Out</noscript>
            <button>Add to cart</button>
            </body></html>"#;
        assert_eq!(detect(html), Detection::Absent);
    }

    #[test]
    fn test_visible_text_next_to_script_still_matches() {
        let html = r#"<html><body>
            <script>var stock = 0;</script>
            <p>Sold out</p>
            </body></html>"#;
        assert_eq!(detect(html), Detection::Page);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(detect(""), Detection::Absent);
    }
}
