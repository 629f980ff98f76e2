use super::*;

/// `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrMatcher {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

/// One compound selector such as `button.faq-question[aria-expanded]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrMatcher>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if self.tag.as_ref().is_some_and(|tag| element.tag_name != *tag) {
            return false;
        }
        if self
            .id
            .as_ref()
            .is_some_and(|id| element.attr("id") != Some(id.as_str()))
        {
            return false;
        }
        if !self.classes.is_empty() {
            let classes = element.classes();
            if !self.classes.iter().all(|name| classes.contains(name)) {
                return false;
            }
        }
        self.attrs
            .iter()
            .all(|matcher| match (element.attr(&matcher.name), &matcher.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

/// Compounds from left to right; `links[i]` joins `compounds[i]` to
/// `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ComplexSelector {
    pub(crate) compounds: Vec<Compound>,
    pub(crate) links: Vec<Combinator>,
}

impl ComplexSelector {
    fn matches(&self, dom: &Dom, node_id: NodeId) -> bool {
        self.compounds
            .len()
            .checked_sub(1)
            .is_some_and(|last| self.matches_at(dom, node_id, last))
    }

    // Right-to-left; a descendant link retries every ancestor before giving up.
    fn matches_at(&self, dom: &Dom, node_id: NodeId, index: usize) -> bool {
        let Some(element) = dom.element(node_id) else {
            return false;
        };
        if !self.compounds[index].matches(element) {
            return false;
        }
        let Some(previous) = index.checked_sub(1) else {
            return true;
        };

        match self.links[previous] {
            Combinator::Child => dom
                .parent(node_id)
                .is_some_and(|parent| self.matches_at(dom, parent, previous)),
            Combinator::Descendant => {
                std::iter::successors(dom.parent(node_id), |node| dom.parent(*node))
                    .any(|ancestor| self.matches_at(dom, ancestor, previous))
            }
        }
    }
}

/// Comma-separated selector groups. Supports type, `*`, `#id`, `.class`,
/// `[attr]`, `[attr=value]` and the descendant and `>` combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorList(pub(crate) Vec<ComplexSelector>);

impl SelectorList {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        SelectorParser {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
        .parse_list()
    }

    pub(crate) fn matches(&self, dom: &Dom, node_id: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(dom, node_id))
    }

    /// The id of a selector that is exactly `#id`, for index lookups.
    pub(crate) fn lone_id(&self) -> Option<&str> {
        let [complex] = self.0.as_slice() else {
            return None;
        };
        let [compound] = complex.compounds.as_slice() else {
            return None;
        };
        if compound.tag.is_some() || !compound.classes.is_empty() || !compound.attrs.is_empty() {
            return None;
        }
        compound.id.as_deref()
    }
}

struct SelectorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl SelectorParser<'_> {
    fn parse_list(mut self) -> Result<SelectorList> {
        let mut groups = vec![self.parse_complex()?];
        while self.eat(b',') {
            groups.push(self.parse_complex()?);
        }
        if self.pos < self.bytes.len() {
            return Err(self.error());
        }
        Ok(SelectorList(groups))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        self.skip_ws();
        let mut compounds = vec![self.parse_compound()?];
        let mut links = Vec::new();

        loop {
            let spaced = self.skip_ws();
            let link = match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                // Pseudo-classes and other unsupported syntax end up here.
                Some(_) => return Err(self.error()),
            };
            links.push(link);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector { compounds, links })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let start = self.pos;
        let mut compound = Compound::default();
        if !self.eat(b'*') {
            compound.tag = self.ident().map(|tag| tag.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some(b'#') => {
                    self.pos += 1;
                    let id = self.ident().ok_or_else(|| self.error())?;
                    if compound.id.replace(id).is_some() {
                        return Err(self.error());
                    }
                }
                Some(b'.') => {
                    self.pos += 1;
                    let class_name = self.ident().ok_or_else(|| self.error())?;
                    compound.classes.push(class_name);
                }
                Some(b'[') => {
                    self.pos += 1;
                    let matcher = self.parse_attr()?;
                    compound.attrs.push(matcher);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrMatcher> {
        self.skip_ws();
        let name = self
            .ident()
            .ok_or_else(|| self.error())?
            .to_ascii_lowercase();
        self.skip_ws();
        let value = if self.eat(b'=') {
            self.skip_ws();
            Some(self.attr_value()?)
        } else {
            None
        };
        self.skip_ws();
        if !self.eat(b']') {
            return Err(self.error());
        }
        Ok(AttrMatcher { name, value })
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.pos + 1;
                let len = self.bytes[start..]
                    .iter()
                    .position(|b| *b == quote)
                    .ok_or_else(|| self.error())?;
                self.pos = start + len + 1;
                Ok(self.source[start..start + len].to_string())
            }
            _ => self.ident().ok_or_else(|| self.error()),
        }
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.source[start..self.pos].to_string())
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self) -> Error {
        Error::UnsupportedSelector(self.source.to_string())
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Result<ComplexSelector> {
        let mut list = SelectorList::parse(source)?;
        assert_eq!(list.0.len(), 1);
        Ok(list.0.remove(0))
    }

    #[test]
    fn compound_collects_tag_classes_and_attrs() -> Result<()> {
        let complex = single(r#"BUTTON.faq-question.big[aria-expanded="true"][hidden]"#)?;
        let compound = &complex.compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("button"));
        assert_eq!(compound.classes, vec!["faq-question", "big"]);
        assert_eq!(
            compound.attrs,
            vec![
                AttrMatcher {
                    name: "aria-expanded".into(),
                    value: Some("true".into()),
                },
                AttrMatcher {
                    name: "hidden".into(),
                    value: None,
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn chain_records_child_and_descendant_links() -> Result<()> {
        let complex = single(".faq-item > .faq-answer p")?;
        assert_eq!(complex.compounds.len(), 3);
        assert_eq!(
            complex.links,
            vec![Combinator::Child, Combinator::Descendant]
        );
        let tight = single(".faq-item>.faq-answer")?;
        assert_eq!(tight.links, vec![Combinator::Child]);
        Ok(())
    }

    #[test]
    fn groups_split_on_top_level_commas() -> Result<()> {
        let list = SelectorList::parse(".a, [data-x=','] , #b")?;
        assert_eq!(list.0.len(), 3);
        assert_eq!(list.lone_id(), None);
        assert_eq!(SelectorList::parse(" #faqSearch ")?.lone_id(), Some("faqSearch"));
        assert_eq!(SelectorList::parse("input#faqSearch")?.lone_id(), None);
        Ok(())
    }

    #[test]
    fn malformed_selectors_are_rejected() {
        for source in [
            "", ".", "#", "> .a", ".a >", "a b]", "[x", ".a,,.b", "div:hover", "#a#b", "[=x]",
        ] {
            assert!(
                SelectorList::parse(source).is_err(),
                "expected {source:?} to be rejected"
            );
        }
    }
}
