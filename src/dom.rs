use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    /// Live value of form controls, seeded from the `value` attribute.
    pub(crate) value: String,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub(crate) fn classes(&self) -> ClassList {
        ClassList::parse(self.attr("class"))
    }
}

/// Arena-backed document tree. Nodes are never freed; a detached subtree
/// just stops being reachable from `root`.
#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
}

fn not_an_element(node_id: NodeId, expected: &str) -> Error {
    Error::TypeMismatch {
        selector: format!("node#{}", node_id.0),
        expected: expected.into(),
        actual: "non-element".into(),
    }
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn push_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let id_attr = attrs.get("id").cloned();
        let value = attrs.get("value").cloned().unwrap_or_default();
        let node_id = self.push_node(
            parent,
            NodeType::Element(Element {
                tag_name,
                attrs,
                value,
            }),
        );
        if let Some(id_attr) = id_attr {
            self.index_id(&id_attr, node_id);
        }
        node_id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(parent, NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).and_then(|nodes| nodes.first().copied())
    }

    fn index_id(&mut self, id: &str, node_id: NodeId) {
        if id.is_empty() {
            return;
        }
        let nodes = self.id_index.entry(id.to_string()).or_default();
        if !nodes.contains(&node_id) {
            nodes.push(node_id);
        }
    }

    fn unindex_id(&mut self, id: &str, node_id: NodeId) {
        if let Some(nodes) = self.id_index.get_mut(id) {
            nodes.retain(|candidate| *candidate != node_id);
            if nodes.is_empty() {
                self.id_index.remove(id);
            }
        }
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|element| element.attr(name))
            .map(str::to_string)
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| not_an_element(node_id, "element"))?;
        let previous = element.attrs.insert(name.clone(), value.to_string());
        if name == "id" {
            if let Some(previous) = previous {
                self.unindex_id(&previous, node_id);
            }
            self.index_id(value, node_id);
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| not_an_element(node_id, "element"))?;
        let removed = element.attrs.remove(name);
        if let (Some(removed), "id") = (removed, name) {
            self.unindex_id(&removed, node_id);
        }
        Ok(())
    }

    fn write_optional_attr(&mut self, node_id: NodeId, name: &str, value: Option<String>) -> Result<()> {
        match value {
            Some(value) => self.set_attr(node_id, name, &value),
            None => self.remove_attr(node_id, name),
        }
    }

    pub(crate) fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let mut classes = self
            .element(node_id)
            .ok_or_else(|| not_an_element(node_id, "element"))?
            .classes();
        if classes.insert(class_name) {
            self.write_optional_attr(node_id, "class", classes.to_attr())?;
        }
        Ok(())
    }

    pub(crate) fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let mut classes = self
            .element(node_id)
            .ok_or_else(|| not_an_element(node_id, "element"))?
            .classes();
        if classes.remove(class_name) {
            self.write_optional_attr(node_id, "class", classes.to_attr())?;
        }
        Ok(())
    }

    pub(crate) fn style_property(&self, node_id: NodeId, name: &str) -> Option<String> {
        let element = self.element(node_id)?;
        InlineStyle::parse(element.attr("style"))
            .get(name)
            .map(str::to_string)
    }

    /// Sets or clears one inline style property. The `style` attribute is
    /// dropped once no property is left.
    pub(crate) fn set_style_property(
        &mut self,
        node_id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<()> {
        let element = self
            .element(node_id)
            .ok_or_else(|| not_an_element(node_id, "element"))?;
        let mut style = InlineStyle::parse(element.attr("style"));
        style.set(name, value);
        self.write_optional_attr(node_id, "style", style.to_attr())
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|element| element.value.as_str())
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| not_an_element(node_id, "input or textarea"))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            match &node.node_type {
                NodeType::Text(text) => out.push_str(text),
                _ => stack.extend(node.children.iter().rev().copied()),
            }
        }
        out
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.clear_children(node_id)?;
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }

    /// Detaches every child and forgets the ids inside the detached subtrees.
    pub(crate) fn clear_children(&mut self, node_id: NodeId) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(not_an_element(node_id, "element"));
        }
        let detached = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in &detached {
            self.nodes[child.0].parent = None;
        }

        let mut stack = detached;
        while let Some(current) = stack.pop() {
            if let Some(id_attr) = self.attr(current, "id") {
                self.unindex_id(&id_attr, current);
            }
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
        Ok(())
    }

    pub(crate) fn append_element(&mut self, parent: NodeId, tag_name: &str) -> Result<NodeId> {
        if parent != self.root && self.element(parent).is_none() {
            return Err(not_an_element(parent, "element"));
        }
        Ok(self.create_element(parent, tag_name.to_ascii_lowercase(), HashMap::new()))
    }

    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        if self.element(parent).is_none() {
            return Err(not_an_element(parent, "element"));
        }
        Ok(self.create_text(parent, text.to_string()))
    }

    pub(crate) fn inner_html(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node_id.0].children {
            self.write_node(*child, &mut out);
        }
        out
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node_id, &mut out);
        out
    }

    // Attributes are written in name order so dumps are stable.
    fn write_node(&self, node_id: NodeId, out: &mut String) {
        let node = &self.nodes[node_id.0];
        match &node.node_type {
            NodeType::Text(text) => out.push_str(&escape_markup(text, false)),
            NodeType::Document => {
                for child in &node.children {
                    self.write_node(*child, out);
                }
            }
            NodeType::Element(element) => {
                let mut names = element.attrs.keys().collect::<Vec<_>>();
                names.sort();
                out.push('<');
                out.push_str(&element.tag_name);
                for name in names {
                    let value = escape_markup(&element.attrs[name], true);
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return;
                }
                for child in &node.children {
                    self.write_node(*child, out);
                }
                out.push_str(&format!("</{}>", element.tag_name));
            }
        }
    }

    /// Element descendants of `scope` in document order, `scope` excluded.
    pub(crate) fn descendant_elements(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.nodes[scope.0]
            .children
            .iter()
            .rev()
            .copied()
            .collect::<Vec<_>>();
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            if matches!(node.node_type, NodeType::Element(_)) {
                out.push(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.query_selector_from(self.root, selector)
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        if let Some(id) = list.lone_id() {
            return Ok(self.by_id(id).into_iter().collect());
        }
        Ok(self
            .descendant_elements(self.root)
            .into_iter()
            .filter(|node_id| list.matches(self, *node_id))
            .collect())
    }

    /// First element under `scope` matching `selector`.
    pub(crate) fn query_selector_from(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        if scope == self.root {
            if let Some(id) = list.lone_id() {
                return Ok(self.by_id(id));
            }
        }
        Ok(self
            .descendant_elements(scope)
            .into_iter()
            .find(|node_id| list.matches(self, *node_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(dom: &Dom, selector: &str) -> NodeId {
        match dom.query_selector(selector) {
            Ok(Some(node_id)) => node_id,
            other => panic!("{selector} did not match: {other:?}"),
        }
    }

    #[test]
    fn descendant_chain_backtracks_past_non_matching_ancestor() -> Result<()> {
        let dom = parse_html(
            r#"<div class="faq-answer"><section><p id="inner">a</p></section></div>
               <p id="outer">b</p>"#,
        )?;
        let matched = dom.query_selector_all(".faq-answer p")?;
        assert_eq!(matched.len(), 1);
        assert_eq!(dom.attr(matched[0], "id").as_deref(), Some("inner"));
        Ok(())
    }

    #[test]
    fn child_combinator_requires_direct_parent() -> Result<()> {
        let dom = parse_html(r#"<ul id="list"><li><span class="x">1</span></li></ul>"#)?;
        assert!(dom.query_selector("ul > .x")?.is_none());
        assert!(dom.query_selector("li > .x")?.is_some());
        Ok(())
    }

    #[test]
    fn scoped_query_only_sees_descendants() -> Result<()> {
        let dom = parse_html(
            r#"<div id="a"><b class="t">1</b></div><div id="b"><b class="t">2</b></div>"#,
        )?;
        let scope = first(&dom, "#b");
        let Some(found) = dom.query_selector_from(scope, ".t")? else {
            panic!("missing .t under #b");
        };
        assert_eq!(dom.text_content(found), "2");
        assert_eq!(dom.query_selector_from(scope, "#a")?, None);
        Ok(())
    }

    #[test]
    fn style_property_round_trips_through_attribute() -> Result<()> {
        let mut dom = parse_html(r#"<div id="item" style="color: red"></div>"#)?;
        let item = first(&dom, "#item");
        dom.set_style_property(item, "display", Some("none"))?;
        assert_eq!(
            dom.attr(item, "style").as_deref(),
            Some("color: red; display: none;")
        );
        assert_eq!(dom.style_property(item, "display").as_deref(), Some("none"));
        dom.set_style_property(item, "display", None)?;
        dom.set_style_property(item, "color", None)?;
        assert_eq!(dom.attr(item, "style"), None);
        Ok(())
    }

    #[test]
    fn clear_children_drops_ids_from_index() -> Result<()> {
        let mut dom = parse_html(r#"<div id="wrap"><span id="gone"><i id="deep">x</i></span></div>"#)?;
        let wrap = first(&dom, "#wrap");
        dom.clear_children(wrap)?;
        assert!(dom.by_id("gone").is_none());
        assert!(dom.by_id("deep").is_none());
        assert_eq!(dom.inner_html(wrap), "");
        Ok(())
    }

    #[test]
    fn class_helpers_keep_token_order() -> Result<()> {
        let mut dom = parse_html(r#"<div id="item" class="faq-item"></div>"#)?;
        let item = first(&dom, "#item");
        dom.class_add(item, "open")?;
        dom.class_add(item, "open")?;
        assert_eq!(dom.attr(item, "class").as_deref(), Some("faq-item open"));
        dom.class_remove(item, "open")?;
        dom.class_remove(item, "faq-item")?;
        assert_eq!(dom.attr(item, "class"), None);
        Ok(())
    }

    #[test]
    fn changing_id_moves_index_entry() -> Result<()> {
        let mut dom = parse_html(r#"<div id="old"></div>"#)?;
        let node = first(&dom, "#old");
        dom.set_attr(node, "ID", "new")?;
        assert_eq!(dom.by_id("old"), None);
        assert_eq!(dom.by_id("new"), Some(node));
        Ok(())
    }

    #[test]
    fn dump_sorts_attributes_and_escapes() -> Result<()> {
        let mut dom = Dom::new();
        let root = dom.root;
        let p = dom.append_element(root, "P")?;
        dom.set_attr(p, "title", "a \"b\"")?;
        dom.set_attr(p, "class", "note")?;
        dom.append_text(p, "1 < 2 & 3")?;
        let br = dom.append_element(p, "br")?;
        assert_eq!(
            dom.dump_node(p),
            r#"<p class="note" title="a &quot;b&quot;">1 &lt; 2 &amp; 3<br></p>"#
        );
        assert!(dom.append_text(dom.root, "x").is_err());
        assert!(dom.clear_children(br).is_ok());
        Ok(())
    }
}
