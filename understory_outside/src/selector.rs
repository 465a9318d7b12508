// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small selector engine for exception selectors.
//!
//! Supported syntax:
//!
//! - selector lists: `a, b`
//! - type and universal selectors: `div`, `*`
//! - `#id`, `.class`, `[attr]`, `[attr=value]`, `[attr="value"]`
//! - descendant (`a b`) and child (`a > b`) combinators
//!
//! Pseudo-classes and sibling combinators are rejected with
//! [`SelectorError::Unsupported`].
//!
//! ```
//! use understory_outside::dom::Document;
//! use understory_outside::selector::Selector;
//!
//! let mut doc = Document::new();
//! let menu = doc.create_element("ul");
//! doc.add_class(menu, "menu");
//! let item = doc.create_element("li");
//! doc.append_child(doc.root(), menu);
//! doc.append_child(menu, item);
//!
//! let sel: Selector = ".menu > li, [data-keep-open]".parse().unwrap();
//! assert!(sel.matches(&doc, &item));
//! assert!(!sel.matches(&doc, &menu));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::lookup::NodeLookup;

/// Errors produced while parsing a selector.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector was empty or only whitespace.
    #[error("empty selector")]
    Empty,
    /// A character that cannot appear at this position.
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected {
        /// Offending character.
        found: char,
        /// Byte offset into the source.
        offset: usize,
    },
    /// Valid selector syntax this engine does not implement.
    #[error("unsupported selector syntax {found:?} at offset {offset}")]
    Unsupported {
        /// First character of the unsupported construct.
        found: char,
        /// Byte offset into the source.
        offset: usize,
    },
    /// The source ended in the middle of a selector.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1].
    combinators: Vec<Combinator>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    local_name: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttrMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrMatch {
    Exists(String),
    Equals(String, String),
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser { src: source, pos: 0 };
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(parser.complex()?);
            match parser.bump() {
                None => break,
                Some(',') => {}
                Some(c) => {
                    return Err(SelectorError::Unexpected {
                        found: c,
                        offset: parser.pos - c.len_utf8(),
                    });
                }
            }
        }
        Ok(Self {
            source: source.trim().into(),
            alternatives,
        })
    }

    /// The trimmed source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` is an element matching any selector in the list.
    pub fn matches<K, L>(&self, lookup: &L, node: &K) -> bool
    where
        L: NodeLookup<K> + ?Sized,
    {
        self.alternatives.iter().any(|complex| {
            let last = complex.compounds.len() - 1;
            complex.matches_at(lookup, node, last)
        })
    }
}

impl core::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl core::fmt::Display for Selector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Complex {
    // Right-to-left match of compounds[..=i] with `node` as the subject of compounds[i].
    fn matches_at<K, L>(&self, lookup: &L, node: &K, i: usize) -> bool
    where
        L: NodeLookup<K> + ?Sized,
    {
        if !self.compounds[i].matches(lookup, node) {
            return false;
        }
        if i == 0 {
            return true;
        }
        match self.combinators[i - 1] {
            Combinator::Child => lookup
                .parent_of(node)
                .filter(|p| lookup.is_element(p))
                .is_some_and(|p| self.matches_at(lookup, &p, i - 1)),
            Combinator::Descendant => {
                let mut cur = lookup.parent_of(node);
                while let Some(ancestor) = cur {
                    if !lookup.is_element(&ancestor) {
                        break;
                    }
                    if self.matches_at(lookup, &ancestor, i - 1) {
                        return true;
                    }
                    cur = lookup.parent_of(&ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches<K, L>(&self, lookup: &L, node: &K) -> bool
    where
        L: NodeLookup<K> + ?Sized,
    {
        if !lookup.is_element(node) {
            return false;
        }
        if let Some(name) = &self.local_name
            && lookup.local_name(node) != Some(name.as_str())
        {
            return false;
        }
        self.ids
            .iter()
            .all(|id| lookup.element_id(node) == Some(id.as_str()))
            && self.classes.iter().all(|c| lookup.has_class(node, c))
            && self.attributes.iter().all(|a| match a {
                AttrMatch::Exists(name) => lookup.attribute(node, name).is_some(),
                AttrMatch::Equals(name, value) => {
                    lookup.attribute(node, name) == Some(value.as_str())
                }
            })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(c @ (':' | '+' | '~')) => SelectorError::Unsupported {
                found: c,
                offset: self.pos,
            },
            Some(c) => SelectorError::Unexpected {
                found: c,
                offset: self.pos,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(self.src[start..self.pos].into())
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let mut complex = Complex {
            compounds: alloc::vec![self.compound()?],
            combinators: Vec::new(),
        };
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            complex.combinators.push(combinator);
            complex.compounds.push(self.compound()?);
        }
        Ok(complex)
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.local_name = Some(self.ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
            any = true;
        }
        if any {
            Ok(compound)
        } else {
            Err(self.unexpected())
        }
    }

    fn attribute(&mut self) -> Result<AttrMatch, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(AttrMatch::Exists(name)),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let start = self.pos;
                        loop {
                            match self.bump() {
                                Some(c) if c == quote => break,
                                Some(_) => {}
                                None => return Err(SelectorError::UnexpectedEnd),
                            }
                        }
                        String::from(&self.src[start..self.pos - 1])
                    }
                    _ => self.ident()?,
                };
                self.skip_ws();
                match self.bump() {
                    Some(']') => Ok(AttrMatch::Equals(name, value)),
                    Some(c) => Err(SelectorError::Unexpected {
                        found: c,
                        offset: self.pos - c.len_utf8(),
                    }),
                    None => Err(SelectorError::UnexpectedEnd),
                }
            }
            Some(c) => Err(SelectorError::Unexpected {
                found: c,
                offset: self.pos - c.len_utf8(),
            }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use alloc::string::ToString;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    // <main id="app"><ul class="menu open" data-role="list"><li class="item"><span/></li></ul></main>
    fn fixture() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let main = doc.create_element("main");
        doc.set_id(main, "app");
        let ul = doc.create_element("ul");
        doc.add_class(ul, "menu");
        doc.add_class(ul, "open");
        doc.set_attribute(ul, "data-role", "list");
        let li = doc.create_element("li");
        doc.add_class(li, "item");
        let span = doc.create_element("span");
        doc.append_child(doc.root(), main);
        doc.append_child(main, ul);
        doc.append_child(ul, li);
        doc.append_child(li, span);
        (doc, main, ul, li, span)
    }

    #[test]
    fn compound_parts_must_all_match() {
        let (doc, main, ul, ..) = fixture();
        assert!(sel("ul.menu.open").matches(&doc, &ul));
        assert!(!sel("ul.menu.closed").matches(&doc, &ul));
        assert!(sel("#app").matches(&doc, &main));
        assert!(sel("main#app").matches(&doc, &main));
        assert!(!sel("div#app").matches(&doc, &main));
        assert!(sel("*").matches(&doc, &main));
        assert!(sel("UL").matches(&doc, &ul));
    }

    #[test]
    fn attribute_selectors() {
        let (doc, _, ul, li, _) = fixture();
        assert!(sel("[data-role]").matches(&doc, &ul));
        assert!(sel("[data-role=list]").matches(&doc, &ul));
        assert!(sel("[ data-role = \"list\" ]").matches(&doc, &ul));
        assert!(sel("[data-role='list']").matches(&doc, &ul));
        assert!(!sel("[data-role=grid]").matches(&doc, &ul));
        assert!(!sel("[data-role]").matches(&doc, &li));
    }

    #[test]
    fn combinators() {
        let (doc, _, _, li, span) = fixture();
        assert!(sel("main span").matches(&doc, &span));
        assert!(sel("#app .menu li > span").matches(&doc, &span));
        assert!(!sel("main > span").matches(&doc, &span));
        assert!(sel(".menu > .item").matches(&doc, &li));
        assert!(!sel(".item > .menu").matches(&doc, &li));
    }

    #[test]
    fn descendant_match_backtracks() {
        // `div > p span` must try the outer div after the inner ancestor fails.
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let p = doc.create_element("p");
        let section = doc.create_element("section");
        let span = doc.create_element("span");
        doc.append_child(doc.root(), div);
        doc.append_child(div, p);
        doc.append_child(p, section);
        doc.append_child(section, span);
        assert!(sel("div > p span").matches(&doc, &span));
        assert!(!sel("section > p span").matches(&doc, &span));
    }

    #[test]
    fn list_matches_any_alternative() {
        let (doc, main, ul, ..) = fixture();
        let s = sel(".nope, #app");
        assert!(s.matches(&doc, &main));
        assert!(!s.matches(&doc, &ul));
        assert_eq!(s.to_string(), ".nope, #app");
        assert_eq!(sel("  ul > li ").as_str(), "ul > li");
    }

    #[test]
    fn combinators_do_not_cross_shadow_roots() {
        let mut doc = Document::new();
        let host = doc.create_element("x-menu");
        doc.add_class(host, "menu");
        doc.append_child(doc.root(), host);
        let shadow = doc.attach_shadow(host).unwrap();
        let button = doc.create_element("button");
        doc.append_child(shadow, button);
        assert!(sel("button").matches(&doc, &button));
        assert!(!sel(".menu button").matches(&doc, &button));
    }

    #[test]
    fn non_elements_never_match() {
        let mut doc = Document::new();
        let t = doc.create_text();
        doc.append_child(doc.root(), t);
        assert!(!sel("*").matches(&doc, &t));
        assert!(!sel("*").matches(&doc, &doc.root()));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("div >"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(Selector::parse(".a,"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(Selector::parse("."), Err(SelectorError::UnexpectedEnd));
        assert_eq!(
            Selector::parse("a:hover"),
            Err(SelectorError::Unsupported {
                found: ':',
                offset: 1
            })
        );
        assert_eq!(
            Selector::parse("a ~ b"),
            Err(SelectorError::Unsupported {
                found: '~',
                offset: 2
            })
        );
        assert_eq!(
            Selector::parse("a(b)"),
            Err(SelectorError::Unexpected {
                found: '(',
                offset: 1
            })
        );
        assert_eq!(
            Selector::parse("[x=\"y"),
            Err(SelectorError::UnexpectedEnd)
        );
        assert_eq!(
            Selector::parse("[x y]"),
            Err(SelectorError::Unexpected {
                found: 'y',
                offset: 3
            })
        );
    }
}
