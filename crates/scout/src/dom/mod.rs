// ABOUTME: Parsed page wrapper (Document) and the single Node abstraction used by extractors.
// ABOUTME: Node exposes image detection, attribute lookup and visible-text extraction.

//! DOM access for extraction.
//!
//! A [`Document`] owns one parsed page and is only ever queried. Extractors
//! never touch `scraper` element types directly; they go through [`Node`],
//! which answers three questions: is this an image, what is attribute `x`,
//! and what is the trimmed visible text.

pub mod xpath;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never renders.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document. Parsing never fails; broken markup is repaired.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub(crate) fn root(&self) -> NodeRef<'_, scraper::Node> {
        self.html.tree.root()
    }

    /// All elements matching a compiled CSS selector, in document order.
    pub fn select<'a, 'b>(
        &'a self,
        selector: &'b Selector,
    ) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    /// The earliest element in document order matching `selector`.
    pub fn select_one(&self, selector: &Selector) -> Option<Node<'_>> {
        self.html.select(selector).next().map(Node::new)
    }
}

/// One element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    el: ElementRef<'a>,
}

impl<'a> Node<'a> {
    pub fn new(el: ElementRef<'a>) -> Self {
        Self { el }
    }

    pub fn element(&self) -> ElementRef<'a> {
        self.el
    }

    /// Lowercase tag name.
    pub fn name(&self) -> &'a str {
        self.el.value().name()
    }

    pub fn is_image(&self) -> bool {
        self.name() == "img"
    }

    pub fn is_meta(&self) -> bool {
        self.name() == "meta"
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    /// Visible text with whitespace collapsed. Script and style content is skipped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_visible_text(*self.el, &mut out);
        normalize_whitespace(&out)
    }

    /// The value a plain text field takes from this node.
    ///
    /// Images yield their raw `src`, meta tags their trimmed `content`, and
    /// everything else its visible text.
    pub fn content(&self) -> String {
        if self.is_image() {
            return self.attr("src").unwrap_or_default().to_string();
        }
        if self.is_meta() {
            return self.attr("content").unwrap_or_default().trim().to_string();
        }
        self.text()
    }
}

fn collect_visible_text(node: NodeRef<'_, scraper::Node>, out: &mut String) {
    match node.value() {
        scraper::Node::Text(text) => {
            out.push_str(text);
            return;
        }
        scraper::Node::Element(el) if INVISIBLE_TAGS.contains(&el.name()) => return,
        _ => {}
    }
    for child in node.children() {
        collect_visible_text(child, out);
    }
}
