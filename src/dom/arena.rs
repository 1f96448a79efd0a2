//! Arena-based DOM for page markup.
//!
//! html5ever parses each exported page into this tree. Nodes live in one
//! contiguous vector and link to each other by index, which keeps the
//! document-order walks of the extractor cheap.

use html5ever::{LocalName, Namespace, QualName};

use crate::util::escape_html;

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "embed", "hr", "img", "input", "meta", "source", "wbr"];

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaNodeId(pub u32);

impl ArenaNodeId {
    /// Sentinel value for no node.
    pub const NONE: ArenaNodeId = ArenaNodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the arena DOM.
#[derive(Debug, Clone)]
pub enum ArenaNodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted classes for fast matching.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment (ignored but needed for TreeSink).
    Comment,
    /// Document type declaration.
    Doctype,
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena DOM.
#[derive(Debug)]
pub struct ArenaNode {
    pub data: ArenaNodeData,
    pub parent: ArenaNodeId,
    pub first_child: ArenaNodeId,
    pub last_child: ArenaNodeId,
    pub prev_sibling: ArenaNodeId,
    pub next_sibling: ArenaNodeId,
}

impl ArenaNode {
    fn new(data: ArenaNodeData) -> Self {
        Self {
            data,
            parent: ArenaNodeId::NONE,
            first_child: ArenaNodeId::NONE,
            last_child: ArenaNodeId::NONE,
            prev_sibling: ArenaNodeId::NONE,
            next_sibling: ArenaNodeId::NONE,
        }
    }
}

/// Arena-based DOM tree.
#[derive(Debug)]
pub struct ArenaDom {
    nodes: Vec<ArenaNode>,
    document: ArenaNodeId,
}

impl ArenaDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: ArenaNodeId::NONE,
        };
        dom.document = dom.alloc(ArenaNode::new(ArenaNodeData::Document));
        dom
    }

    fn alloc(&mut self, node: ArenaNode) -> ArenaNodeId {
        let id = ArenaNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn document(&self) -> ArenaNodeId {
        self.document
    }

    /// Get a node by ID.
    pub fn get(&self, id: ArenaNodeId) -> Option<&ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: ArenaNodeId) -> Option<&mut ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> ArenaNodeId {
        let classes = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "class")
            .map(|a| a.value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        self.alloc(ArenaNode::new(ArenaNodeData::Element {
            name,
            attrs,
            classes,
        }))
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Comment))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self) -> ArenaNodeId {
        self.alloc(ArenaNode::new(ArenaNodeData::Doctype))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: ArenaNodeId, child: ArenaNodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: ArenaNodeId, new_node: ArenaNodeId) {
        let (parent, prev) = self
            .get(sibling)
            .map(|n| (n.parent, n.prev_sibling))
            .unwrap_or((ArenaNodeId::NONE, ArenaNodeId::NONE));

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: ArenaNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(ArenaNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let ArenaNodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Get the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the DOM is empty (only has document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: ArenaNodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(ArenaNodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Element children of a node.
    pub fn element_children(&self, parent: ArenaNodeId) -> impl Iterator<Item = ArenaNodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// Iterate over all descendants of `root` in document order (pre-order),
    /// excluding `root` itself.
    pub fn descendants(&self, root: ArenaNodeId) -> Descendants<'_> {
        let mut stack: Vec<_> = self.children(root).collect();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Find the first node matching a predicate (document order).
    pub fn find<F>(&self, predicate: F) -> Option<ArenaNodeId>
    where
        F: Fn(&ArenaNode) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<ArenaNodeId> {
        self.find(|node| match &node.data {
            ArenaNodeData::Element { name, .. } => name.local.as_ref() == tag,
            _ => false,
        })
    }
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a ArenaDom,
    current: ArenaNodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(ArenaNodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    stack: Vec<ArenaNodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = ArenaNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let mut children: Vec<_> = self.dom.children(id).collect();
        children.reverse();
        self.stack.extend(children);
        Some(id)
    }
}

/// Convenience methods for element nodes.
impl ArenaDom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: ArenaNodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Get element's namespace.
    pub fn element_namespace(&self, id: ArenaNodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Check whether the node is an element with the given tag.
    pub fn has_tag(&self, id: ArenaNodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: ArenaNodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: ArenaNodeId) -> Option<&str> {
        self.get_attr(id, "id")
    }

    /// Get element's classes.
    pub fn element_classes(&self, id: ArenaNodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                ArenaNodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    /// Parent of a node, if any.
    pub fn parent(&self, id: ArenaNodeId) -> Option<ArenaNodeId> {
        self.get(id).map(|n| n.parent).filter(ArenaNodeId::is_some)
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: ArenaNodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, ArenaNodeData::Element { .. }))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: ArenaNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            ArenaNodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Text of the node's own text children, ignoring descendant elements.
    pub fn direct_text(&self, id: ArenaNodeId) -> String {
        self.children(id)
            .filter_map(|c| self.text_content(c))
            .collect()
    }

    /// Full text of a subtree. `<br>` elements become `\n`; line breaks in
    /// the source text are plain whitespace.
    pub fn collect_text(&self, id: ArenaNodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text_content(node) {
                out.extend(text.chars().map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c }));
            } else if self.has_tag(node, "br") {
                out.push('\n');
            }
        }
        out
    }

    /// Serialize the children of a node back to markup.
    pub fn inner_html(&self, id: ArenaNodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: ArenaNodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            ArenaNodeData::Text(text) => out.push_str(&escape_html(text)),
            ArenaNodeData::Element { name, attrs, .. } => {
                out.push('<');
                out.push_str(&name.local);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name.local);
                    out.push_str("=\"");
                    out.push_str(&escape_html(&attr.value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.local.as_ref()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&name.local);
                out.push('>');
            }
            _ => {}
        }
    }

    /// Every class name used anywhere in the document, in document order.
    pub fn used_classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.descendants(self.document)
            .flat_map(|id| self.element_classes(id).iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use html5ever::ns;

    use super::*;

    fn make_qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    fn class_attr(value: &str) -> Vec<Attribute> {
        vec![Attribute {
            name: make_qname("class"),
            value: value.to_string(),
        }]
    }

    #[test]
    fn test_create_elements() {
        let mut dom = ArenaDom::new();

        let div = dom.create_element(make_qname("div"), class_attr("Kader Kader-rood"));
        dom.append(dom.document(), div);

        assert_eq!(dom.element_name(div).unwrap().as_ref(), "div");
        assert_eq!(dom.element_classes(div), ["Kader", "Kader-rood"]);
    }

    #[test]
    fn test_append_children() {
        let mut dom = ArenaDom::new();

        let parent = dom.create_element(make_qname("div"), vec![]);
        let child1 = dom.create_element(make_qname("p"), vec![]);
        let child2 = dom.create_element(make_qname("p"), vec![]);

        dom.append(dom.document(), parent);
        dom.append(parent, child1);
        dom.append(parent, child2);

        let children: Vec<_> = dom.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(dom.parent(child2), Some(parent));
    }

    #[test]
    fn test_text_merging() {
        let mut dom = ArenaDom::new();

        let p = dom.create_element(make_qname("p"), vec![]);
        dom.append(dom.document(), p);

        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut dom = ArenaDom::new();
        let div = dom.create_element(make_qname("div"), vec![]);
        let p1 = dom.create_element(make_qname("p"), vec![]);
        let span = dom.create_element(make_qname("span"), vec![]);
        let p2 = dom.create_element(make_qname("p"), vec![]);
        dom.append(dom.document(), div);
        dom.append(div, p1);
        dom.append(p1, span);
        dom.append(div, p2);

        let order: Vec<_> = dom.descendants(dom.document()).collect();
        assert_eq!(order, vec![div, p1, span, p2]);
    }

    #[test]
    fn test_direct_and_collected_text() {
        let mut dom = ArenaDom::new();
        let p = dom.create_element(make_qname("p"), vec![]);
        let span = dom.create_element(make_qname("span"), vec![]);
        let br = dom.create_element(make_qname("br"), vec![]);
        dom.append(dom.document(), p);
        dom.append_text(p, "Eerste regel");
        dom.append(p, br);
        dom.append(p, span);
        dom.append_text(span, "tweede regel");

        assert_eq!(dom.direct_text(p), "Eerste regel");
        assert_eq!(dom.collect_text(p), "Eerste regel\ntweede regel");
    }

    #[test]
    fn test_source_newline_is_whitespace() {
        let mut dom = ArenaDom::new();
        let p = dom.create_element(make_qname("p"), vec![]);
        dom.append(dom.document(), p);
        dom.append_text(p, "Een zin die in de bron\r\nover twee regels loopt.");

        assert_eq!(dom.collect_text(p), "Een zin die in de bron  over twee regels loopt.");
    }

    #[test]
    fn test_inner_html() {
        let mut dom = ArenaDom::new();
        let p = dom.create_element(make_qname("p"), vec![]);
        let span = dom.create_element(make_qname("span"), class_attr("CharOverride-1"));
        let br = dom.create_element(make_qname("br"), vec![]);
        dom.append(dom.document(), p);
        dom.append_text(p, "A & B");
        dom.append(p, br);
        dom.append(p, span);
        dom.append_text(span, "cursief");

        assert_eq!(
            dom.inner_html(p),
            r#"A &amp; B<br><span class="CharOverride-1">cursief</span>"#
        );
    }
}
