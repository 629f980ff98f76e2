use super::*;

/// Parses page markup into a [`Dom`]. The parser is forgiving: unknown
/// references stay literal, stray end tags are dropped, and open elements are
/// closed at end of input. Only an unterminated comment or tag is an error.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let dom = Dom::new();
    let root = dom.root;
    HtmlParser {
        src: html,
        bytes: html.as_bytes(),
        pos: 0,
        dom,
        open: vec![root],
    }
    .run()
}

struct HtmlParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    dom: Dom,
    /// Open elements, document node first.
    open: Vec<NodeId>,
}

impl HtmlParser<'_> {
    fn run(mut self) -> Result<Dom> {
        while self.pos < self.bytes.len() {
            let rest = &self.bytes[self.pos..];
            if rest.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if rest.starts_with(b"</") {
                self.read_end_tag()?;
            } else if rest.starts_with(b"<!") {
                self.skip_past(b">", "unclosed declaration")?;
            } else if rest.len() > 1 && rest[0] == b'<' && rest[1].is_ascii_alphabetic() {
                self.read_start_tag()?;
            } else {
                self.read_text();
            }
        }
        Ok(self.dom)
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.dom.root)
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.pos += 4;
        self.skip_past(b"-->", "unclosed HTML comment")
    }

    fn skip_past(&mut self, needle: &[u8], message: &str) -> Result<()> {
        let end = find_bytes(self.bytes, self.pos, needle)
            .ok_or_else(|| Error::HtmlParse(message.into()))?;
        self.pos = end + needle.len();
        Ok(())
    }

    fn read_text(&mut self) {
        // A lone `<` that does not open a tag is ordinary text.
        let start = self.pos;
        let end = find_bytes(self.bytes, start + 1, b"<").unwrap_or(self.bytes.len());
        self.pos = end;
        let text = decode_entities(&self.src[start..end]).into_owned();
        let parent = self.current();
        self.dom.create_text(parent, text);
    }

    fn read_end_tag(&mut self) -> Result<()> {
        self.pos += 2;
        let name = self.read_name().to_ascii_lowercase();
        self.skip_past(b">", "unclosed end tag")?;
        let found = self
            .open
            .iter()
            .skip(1)
            .rposition(|node| self.dom.tag_name(*node) == Some(name.as_str()));
        if let Some(index) = found {
            self.open.truncate(index + 1);
        }
        Ok(())
    }

    fn read_start_tag(&mut self) -> Result<()> {
        self.pos += 1;
        let tag = self.read_name().to_ascii_lowercase();
        let mut attrs = HashMap::new();
        let mut self_closing = false;

        loop {
            self.skip_ws();
            match self.bytes.get(self.pos) {
                None => return Err(Error::HtmlParse(format!("unclosed <{tag}> tag"))),
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.bytes.get(self.pos) == Some(&b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let name = self.read_attr_name();
                    if name.is_empty() {
                        // Junk such as a stray quote.
                        self.pos += 1;
                        continue;
                    }
                    let value = self.read_attr_value()?;
                    attrs.entry(name.to_ascii_lowercase()).or_insert(value);
                }
            }
        }

        self.close_implied_paragraph(&tag);
        let parent = self.current();
        let node = self.dom.create_element(parent, tag.clone(), attrs);
        if self_closing || is_void_tag(&tag) {
            return Ok(());
        }
        if matches!(tag.as_str(), "script" | "style" | "textarea") {
            return self.read_raw_text(node, &tag);
        }
        self.open.push(node);
        Ok(())
    }

    fn read_raw_text(&mut self, node: NodeId, tag: &str) -> Result<()> {
        let start = self.pos;
        let end = find_end_tag_ignoring_case(self.bytes, start, tag.as_bytes())
            .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}> element")))?;
        self.pos = end;
        self.skip_past(b">", "unclosed end tag")?;

        let raw = &self.src[start..end];
        if tag == "textarea" {
            let text = decode_entities(raw).into_owned();
            self.dom.set_value(node, &text)?;
            if !text.is_empty() {
                self.dom.create_text(node, text);
            }
        } else if !raw.is_empty() {
            self.dom.create_text(node, raw.to_string());
        }
        Ok(())
    }

    fn close_implied_paragraph(&mut self, tag: &str) {
        if !closes_paragraph(tag) {
            return;
        }
        for index in (1..self.open.len()).rev() {
            match self.dom.tag_name(self.open[index]) {
                Some("p") => {
                    self.open.truncate(index);
                    return;
                }
                Some(open_tag) if is_phrasing_tag(open_tag) => continue,
                _ => return,
            }
        }
    }

    fn read_name(&mut self) -> &str {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'))
        {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn read_attr_name(&mut self) -> String {
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\''))
        {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    fn read_attr_value(&mut self) -> Result<String> {
        self.skip_ws();
        if self.bytes.get(self.pos) != Some(&b'=') {
            return Ok(String::new());
        }
        self.pos += 1;
        self.skip_ws();

        let (start, end) = match self.bytes.get(self.pos) {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.pos + 1;
                let end = find_bytes(self.bytes, start, &[*quote])
                    .ok_or_else(|| Error::HtmlParse("unclosed attribute value".into()))?;
                self.pos = end + 1;
                (start, end)
            }
            _ => {
                let start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'>')
                {
                    self.pos += 1;
                }
                (start, self.pos)
            }
        };
        Ok(decode_entities(&self.src[start..end]).into_owned())
    }

    fn skip_ws(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }
}

fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn is_phrasing_tag(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "code"
            | "em"
            | "i"
            | "kbd"
            | "mark"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "u"
    )
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn find_bytes(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

// Start of the `</tag` that ends a raw text element.
fn find_end_tag_ignoring_case(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut at = from;
    loop {
        let candidate = find_bytes(bytes, at, b"</")?;
        let name = bytes.get(candidate + 2..candidate + 2 + tag.len())?;
        let boundary = bytes
            .get(candidate + 2 + tag.len())
            .is_none_or(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'));
        if name.eq_ignore_ascii_case(tag) && boundary {
            return Some(candidate);
        }
        at = candidate + 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(dom: &Dom, id: &str) -> NodeId {
        match dom.by_id(id) {
            Some(node) => node,
            None => panic!("missing #{id}"),
        }
    }

    #[test]
    fn entities_decode_in_text_and_attributes() -> Result<()> {
        let dom = parse_html(r#"<p id="q" title="a &amp; b">Fish &amp; chips &#63; &#x21; &bogus;</p>"#)?;
        let p = node(&dom, "q");
        assert_eq!(dom.text_content(p), "Fish & chips ? ! &bogus;");
        assert_eq!(dom.attr(p, "title").as_deref(), Some("a & b"));
        Ok(())
    }

    #[test]
    fn script_bodies_stay_raw_text() -> Result<()> {
        let dom = parse_html("<div id=\"d\"><script>if (a < b) { x(); }</SCRIPT></div>")?;
        assert_eq!(dom.text_content(node(&dom, "d")), "if (a < b) { x(); }");
        Ok(())
    }

    #[test]
    fn textarea_body_seeds_value() -> Result<()> {
        let dom = parse_html(r#"<textarea id="t">a &lt;b&gt;</textarea>"#)?;
        assert_eq!(dom.value(node(&dom, "t")), Some("a <b>"));
        Ok(())
    }

    #[test]
    fn block_start_tag_closes_open_paragraph() -> Result<()> {
        let dom = parse_html(r#"<section id="s"><p>one <em>two<div id="d">three</div></section>"#)?;
        let div = node(&dom, "d");
        assert_eq!(dom.parent(div), Some(node(&dom, "s")));
        Ok(())
    }

    #[test]
    fn bare_attributes_have_empty_values() -> Result<()> {
        let dom = parse_html(r#"<div id="a" hidden><input id="i" value="x" disabled></div>"#)?;
        let a = node(&dom, "a");
        assert_eq!(dom.attr(a, "hidden").as_deref(), Some(""));
        let input = node(&dom, "i");
        assert_eq!(dom.value(input), Some("x"));
        assert_eq!(dom.parent(input), Some(a));
        Ok(())
    }

    #[test]
    fn first_duplicate_attribute_wins() -> Result<()> {
        let dom = parse_html(r#"<span id="s" class=a class="b" / >x</span>"#)?;
        assert_eq!(dom.attr(node(&dom, "s"), "class").as_deref(), Some("a"));
        Ok(())
    }

    #[test]
    fn stray_end_tags_are_ignored() -> Result<()> {
        let dom = parse_html(r#"<div id="a"></span><b id="b">x</b></div>"#)?;
        assert_eq!(dom.parent(node(&dom, "b")), Some(node(&dom, "a")));
        Ok(())
    }

    #[test]
    fn lone_angle_bracket_is_text() -> Result<()> {
        let dom = parse_html(r#"<p id="p">1 < 2 <3</p>"#)?;
        assert_eq!(dom.text_content(node(&dom, "p")), "1 < 2 <3");
        Ok(())
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        assert!(matches!(
            parse_html("<div><!-- never closed"),
            Err(Error::HtmlParse(_))
        ));
    }
}
