// ABOUTME: Evaluates catalog locators (CSS or structural paths) against a Document.
// ABOUTME: Invalid locators yield an empty match sequence instead of an error.

//! Locator evaluation.
//!
//! [`locate`] returns a [`Matches`] iterator over every element a locator
//! selects, in document order. [`locate_first`] is the "select one" shortcut
//! used by the field resolvers: it returns the earliest match only.

use crate::dom::{Document, Node};
use crate::extractors::catalog::{Compiled, Locator};

/// A single-pass sequence of elements matched by one locator.
pub enum Matches<'a, 'b> {
    Css(scraper::html::Select<'a, 'b>),
    Nodes(std::vec::IntoIter<Node<'a>>),
    Empty,
}

impl<'a> Iterator for Matches<'a, '_> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Matches::Css(select) => select.next().map(Node::new),
            Matches::Nodes(nodes) => nodes.next(),
            Matches::Empty => None,
        }
    }
}

/// All elements matching `locator`, in document order.
pub fn locate<'a, 'b>(doc: &'a Document, locator: &'b Locator) -> Matches<'a, 'b> {
    match locator.compiled() {
        Compiled::Css(selector) => Matches::Css(doc.select(selector)),
        Compiled::Xpath(xpath) => Matches::Nodes(xpath.select(doc).into_iter()),
        Compiled::Invalid => Matches::Empty,
    }
}

/// The earliest element in document order matching `locator`.
pub fn locate_first<'a>(doc: &'a Document, locator: &Locator) -> Option<Node<'a>> {
    match locator.compiled() {
        Compiled::Css(selector) => doc.select_one(selector),
        Compiled::Xpath(xpath) => xpath.select(doc).into_iter().next(),
        Compiled::Invalid => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <div class="Nx9bqj CxhGGd">₹1,299</div>
            <div class="Nx9bqj">₹1,499</div>
            <span id="productTitle">Title</span>
        </body></html>
    "#;

    #[test]
    fn css_matches_in_document_order() {
        let doc = Document::parse(PAGE);
        let loc = Locator::css("div.Nx9bqj");
        let texts: Vec<String> = locate(&doc, &loc).map(|n| n.text()).collect();
        assert_eq!(texts, vec!["₹1,299", "₹1,499"]);
    }

    #[test]
    fn compound_class_selector_picks_single_node() {
        let doc = Document::parse(PAGE);
        let loc = Locator::css("div.Nx9bqj.CxhGGd");
        assert_eq!(locate(&doc, &loc).count(), 1);
    }

    #[test]
    fn xpath_and_css_agree_on_first_match() {
        let doc = Document::parse(PAGE);
        let by_css = locate_first(&doc, &Locator::css("#productTitle")).unwrap();
        let by_xpath = locate_first(&doc, &Locator::xpath("//span[@id='productTitle']")).unwrap();
        assert_eq!(by_css.text(), by_xpath.text());
        assert_eq!(by_css.element().id(), by_xpath.element().id());
    }

    #[test]
    fn invalid_locators_match_nothing() {
        let doc = Document::parse(PAGE);
        assert_eq!(locate(&doc, &Locator::css("div[[[")).count(), 0);
        assert!(locate_first(&doc, &Locator::xpath("div[")).is_none());
    }

    #[test]
    fn unmatched_locator_is_empty() {
        let doc = Document::parse(PAGE);
        assert!(locate_first(&doc, &Locator::css("span.VU-ZEz")).is_none());
    }
}
