// CSS selector subset
//
// Supports type/universal selectors, #id, .class, [attr], [attr=value],
// :disabled, :enabled, :checked, :first-child, :last-child, descendant and
// child combinators, and comma-separated groups. Matching runs right to left
// against any `ElementTree`.

use crate::error::{Error, Result};

/// Read access to an element tree, as needed for selector matching.
pub trait ElementTree {
    /// Lower-case tag name of an element node
    fn tag_name(&self, node: usize) -> &str;
    /// Attribute value of an element node
    fn attribute(&self, node: usize, name: &str) -> Option<&str>;
    /// Nearest element ancestor
    fn parent_element(&self, node: usize) -> Option<usize>;
    /// Element children of the node's parent, in order (includes `node`)
    fn element_siblings(&self, node: usize) -> Vec<usize>;
    /// Live checkbox/radio state
    fn is_checked(&self, node: usize) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists(String),
    Eq(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PseudoClass {
    Disabled,
    Enabled,
    Checked,
    FirstChild,
    LastChild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
    pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    compound: Compound,
    // Relation to the part on the left.
    combinator: Option<Combinator>,
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Vec<Part>>,
}

impl Selector {
    /// Parses a selector list. Fails with `InvalidSelector`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        };
        let mut groups = Vec::new();
        loop {
            parser.skip_whitespace();
            groups.push(parser.parse_chain()?);
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(_) => return Err(parser.error()),
            }
        }
        Ok(Self {
            source: source.to_string(),
            groups,
        })
    }

    /// The selector text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any group of the list
    pub fn matches<T: ElementTree + ?Sized>(&self, tree: &T, node: usize) -> bool {
        self.groups
            .iter()
            .any(|chain| matches_chain(tree, chain, chain.len() - 1, node))
    }
}

fn matches_chain<T: ElementTree + ?Sized>(tree: &T, parts: &[Part], idx: usize, node: usize) -> bool {
    if !matches_compound(tree, &parts[idx].compound, node) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match parts[idx].combinator {
        Some(Combinator::Child) => tree
            .parent_element(node)
            .is_some_and(|parent| matches_chain(tree, parts, idx - 1, parent)),
        Some(Combinator::Descendant) | None => {
            let mut current = tree.parent_element(node);
            while let Some(ancestor) = current {
                if matches_chain(tree, parts, idx - 1, ancestor) {
                    return true;
                }
                current = tree.parent_element(ancestor);
            }
            false
        }
    }
}

fn matches_compound<T: ElementTree + ?Sized>(tree: &T, compound: &Compound, node: usize) -> bool {
    if let Some(tag) = &compound.tag
        && tree.tag_name(node) != tag
    {
        return false;
    }
    if let Some(id) = &compound.id
        && tree.attribute(node, "id") != Some(id.as_str())
    {
        return false;
    }
    if !compound.classes.is_empty() {
        let classes = tree.attribute(node, "class").unwrap_or("");
        if !compound
            .classes
            .iter()
            .all(|c| classes.split_whitespace().any(|have| have == c))
        {
            return false;
        }
    }
    let attrs_match = compound.attrs.iter().all(|cond| match cond {
        AttrCondition::Exists(key) => tree.attribute(node, key).is_some(),
        AttrCondition::Eq(key, value) => tree.attribute(node, key) == Some(value.as_str()),
    });
    if !attrs_match {
        return false;
    }
    compound.pseudo_classes.iter().all(|pseudo| match pseudo {
        PseudoClass::Disabled => is_form_control(tree.tag_name(node)) && tree.attribute(node, "disabled").is_some(),
        PseudoClass::Enabled => is_form_control(tree.tag_name(node)) && tree.attribute(node, "disabled").is_none(),
        PseudoClass::Checked => tree.is_checked(node),
        PseudoClass::FirstChild => tree.element_siblings(node).first() == Some(&node),
        PseudoClass::LastChild => tree.element_siblings(node).last() == Some(&node),
    })
}

pub(crate) fn is_form_control(tag: &str) -> bool {
    matches!(
        tag,
        "button" | "input" | "select" | "textarea" | "option" | "fieldset"
    )
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn error(&self) -> Error {
        Error::InvalidSelector(self.source.to_string())
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_chain(&mut self) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        let mut combinator = None;
        loop {
            let compound = self.parse_compound()?;
            parts.push(Part {
                compound,
                combinator,
            });
            let had_whitespace = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinator = Some(Combinator::Child);
                }
                Some(_) if had_whitespace => combinator = Some(Combinator::Descendant),
                Some(_) => return Err(self.error()),
            }
        }
        Ok(parts)
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut matched_any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                matched_any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                matched_any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attr_condition()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?.to_ascii_lowercase();
                    let pseudo = match name.as_str() {
                        "disabled" => PseudoClass::Disabled,
                        "enabled" => PseudoClass::Enabled,
                        "checked" => PseudoClass::Checked,
                        "first-child" => PseudoClass::FirstChild,
                        "last-child" => PseudoClass::LastChild,
                        _ => return Err(self.error()),
                    };
                    compound.pseudo_classes.push(pseudo);
                }
                _ => break,
            }
            matched_any = true;
        }

        if matched_any {
            Ok(compound)
        } else {
            Err(self.error())
        }
    }

    fn attr_condition(&mut self) -> Result<AttrCondition> {
        self.skip_whitespace();
        let key = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let condition = match self.peek() {
            Some(']') => AttrCondition::Exists(key),
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != quote) {
                            self.pos += 1;
                        }
                        if self.peek().is_none() {
                            return Err(self.error());
                        }
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                AttrCondition::Eq(key, value)
            }
            _ => return Err(self.error()),
        };
        if self.peek() != Some(']') {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(condition)
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
