use std::borrow::Cow;

use super::*;

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '©'),
    ("reg", '®'),
    ("trade", '™'),
    ("euro", '€'),
    ("hellip", '…'),
    ("middot", '·'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("laquo", '«'),
    ("raquo", '»'),
];

/// Escapes text for serialized markup. Attribute values also escape `"`.
pub(crate) fn escape_markup(value: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decodes numeric references and a small set of named ones. Unknown
/// references are left as written.
pub(crate) fn decode_entities(src: &str) -> Cow<'_, str> {
    if !src.contains('&') {
        return Cow::Borrowed(src);
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        let name_len = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '#'))
            .unwrap_or(rest.len());
        match decode_entity(&rest[..name_len]) {
            Some(ch) => {
                out.push(ch);
                rest = &rest[name_len..];
                rest = rest.strip_prefix(';').unwrap_or(rest);
            }
            None => out.push('&'),
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, ch)| *ch)
}

/// Class tokens of one element, in attribute order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ClassList(Vec<String>);

impl ClassList {
    pub(crate) fn parse(attr: Option<&str>) -> Self {
        Self(
            attr.unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        )
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|token| token == name)
    }

    pub(crate) fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|token| token != name);
        before != self.0.len()
    }

    /// `None` when no tokens remain and the attribute should be dropped.
    pub(crate) fn to_attr(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| self.0.join(" "))
    }
}

/// Parsed `style` attribute. Property names are lowercased and a repeated
/// property keeps its first position with the last value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    pub(crate) fn parse(attr: Option<&str>) -> Self {
        let mut style = Self::default();
        for decl in attr.unwrap_or_default().split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if !name.is_empty() {
                style.set(&name.to_ascii_lowercase(), Some(value.trim()));
            }
        }
        style
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(decl, _)| decl == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets a property, or removes it when `value` is `None`.
    pub(crate) fn set(&mut self, name: &str, value: Option<&str>) {
        let slot = self.decls.iter().position(|(decl, _)| decl == name);
        match (slot, value) {
            (Some(index), Some(value)) => self.decls[index].1 = value.to_string(),
            (None, Some(value)) => self.decls.push((name.to_string(), value.to_string())),
            (Some(index), None) => {
                self.decls.remove(index);
            }
            (None, None) => {}
        }
    }

    pub(crate) fn to_attr(&self) -> Option<String> {
        if self.decls.is_empty() {
            return None;
        }
        let parts = self
            .decls
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>();
        Some(parts.join(" "))
    }
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
