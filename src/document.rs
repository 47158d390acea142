//! In-memory element tree built once from quick-xml events.
//!
//! Elements live in an arena in document order, so a node's descendants are the
//! contiguous id range `id + 1 .. end`.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use quick_xml::NsReader;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{Result, TcxError};
use crate::query;
use crate::value::Scalar;

pub type NodeId = usize;

/// quick-xml tracks depth in a `u16`; refuse documents nested deeper than this.
const MAX_DEPTH: usize = 4096;

#[derive(Debug)]
struct NodeData {
    local_name: String,
    namespace: Option<usize>,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// One past the last descendant.
    end: NodeId,
}

/// A parsed, immutable XML document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    namespaces: Vec<String>,
    top: [NodeId; 1],
}

impl Document {
    /// Parse a document held in memory.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let mut reader = NsReader::from_str(xml);
        let mut builder = Builder::default();

        loop {
            match reader.read_resolved_event() {
                Ok((ns, Event::Start(e))) => {
                    let ns = namespace_uri(&ns)?;
                    builder.open(&e, ns)?;
                }
                Ok((ns, Event::Empty(e))) => {
                    let ns = namespace_uri(&ns)?;
                    builder.open(&e, ns)?;
                    builder.close()?;
                }
                Ok((_, Event::End(_))) => builder.close()?,
                Ok((_, Event::Text(e))) => builder.text(utf8(e.as_ref())?)?,
                Ok((_, Event::CData(e))) => builder.text(utf8(e.as_ref())?)?,
                Ok((_, Event::GeneralRef(e))) => {
                    let ch = resolve_reference(&e)?;
                    builder.text(ch.encode_utf8(&mut [0; 4]))?;
                }
                Ok((_, Event::Eof)) => break,
                Err(e) => return Err(TcxError::XmlParse(e)),
                _ => {}
            }
        }

        let doc = builder.finish()?;
        tracing::debug!(elements = doc.nodes.len(), "parsed TCX document");
        Ok(doc)
    }

    /// Parse a document from a byte stream.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let xml = String::from_utf8(bytes)
            .map_err(|e| TcxError::IllFormed(format!("input is not UTF-8: {e}")))?;
        Self::parse_str(&xml)
    }

    /// Parse a document from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening TCX file");
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn root(&self) -> Node<'_> {
        self.node(0)
    }

    /// Evaluate a namespace-qualified path against the whole document.
    pub fn find_all<'d>(
        &'d self,
        path: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<Vec<Node<'d>>> {
        query::find_all(self, path, namespaces)
    }

    pub(crate) fn node(&self, id: NodeId) -> Node<'_> {
        Node { doc: self, id }
    }

    /// Children of `context`; `None` is the document node, whose only child is the root.
    pub(crate) fn child_ids(&self, context: Option<NodeId>) -> &[NodeId] {
        match context {
            Some(id) => &self.nodes[id].children,
            None => &self.top,
        }
    }

    pub(crate) fn descendant_ids(&self, context: Option<NodeId>) -> Range<NodeId> {
        match context {
            Some(id) => id + 1..self.nodes[id].end,
            None => 0..self.nodes.len(),
        }
    }

    pub(crate) fn is_named(&self, id: NodeId, namespace: Option<&str>, local_name: &str) -> bool {
        let data = &self.nodes[id];
        data.local_name == local_name && self.namespace_of(data) == namespace
    }

    fn namespace_of(&self, data: &NodeData) -> Option<&str> {
        data.namespace.map(|i| self.namespaces[i].as_str())
    }
}

impl FromStr for Document {
    type Err = TcxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

/// Borrowed handle to one element of a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> Node<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    fn data(&self) -> &'d NodeData {
        &self.doc.nodes[self.id]
    }

    pub fn local_name(&self) -> &'d str {
        &self.data().local_name
    }

    pub fn namespace(&self) -> Option<&'d str> {
        self.doc.namespace_of(self.data())
    }

    /// Raw character data directly inside this element.
    ///
    /// Text split by comments or child elements is joined, so `1<!--c-->20` reads `120`.
    pub fn text(&self) -> &'d str {
        &self.data().text
    }

    pub fn scalar(&self) -> Scalar {
        Scalar::coerce(self.text())
    }

    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.data()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self) -> Option<Node<'d>> {
        self.data().parent.map(|id| self.doc.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'d>> + use<'d> {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| doc.node(id))
    }

    pub fn children_named(
        &self,
        namespace: &'d str,
        local_name: &'d str,
    ) -> impl Iterator<Item = Node<'d>> + use<'d> {
        let doc = self.doc;
        self.data()
            .children
            .iter()
            .filter(move |&&id| doc.is_named(id, Some(namespace), local_name))
            .map(move |&id| doc.node(id))
    }

    /// First child with the given qualified name.
    pub fn child(&self, namespace: &'d str, local_name: &'d str) -> Option<Node<'d>> {
        self.children_named(namespace, local_name).next()
    }

    pub fn has_child(&self, namespace: &str, local_name: &str) -> bool {
        self.data()
            .children
            .iter()
            .any(|&id| self.doc.is_named(id, Some(namespace), local_name))
    }

    /// Evaluate a path with this element as the context node.
    pub fn find_all(&self, path: &str, namespaces: &[(&str, &str)]) -> Result<Vec<Node<'d>>> {
        query::find_all_from(self.doc, Some(self.id), path, namespaces)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.local_name())
            .field("namespace", &self.namespace())
            .finish()
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<NodeData>,
    namespaces: Vec<String>,
    stack: Vec<NodeId>,
}

impl Builder {
    fn open(&mut self, start: &BytesStart<'_>, namespace: Option<String>) -> Result<()> {
        if self.stack.is_empty() && !self.nodes.is_empty() {
            return Err(TcxError::IllFormed("more than one root element".into()));
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(TcxError::IllFormed("element nesting too deep".into()));
        }

        let mut attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result.map_err(|e| TcxError::XmlParse(e.into()))?;
            let key = utf8(attr.key.as_ref())?;
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let value = quick_xml::escape::unescape(utf8(&attr.value)?)
                .map_err(|e| TcxError::IllFormed(e.to_string()))?;
            attributes.push((key.to_string(), value.into_owned()));
        }

        let namespace = namespace.map(|uri| self.intern(uri));
        let id = self.nodes.len();
        let parent = self.stack.last().copied();
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        self.nodes.push(NodeData {
            local_name: utf8(start.local_name().as_ref())?.to_string(),
            namespace,
            attributes,
            text: String::new(),
            parent,
            children: Vec::new(),
            end: id + 1,
        });
        self.stack.push(id);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let id = self
            .stack
            .pop()
            .ok_or_else(|| TcxError::IllFormed("closing tag without an open element".into()))?;
        self.nodes[id].end = self.nodes.len();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last() {
            Some(&id) => self.nodes[id].text.push_str(text),
            None if text.trim().is_empty() => {}
            None => return Err(TcxError::IllFormed("text outside the root element".into())),
        }
        Ok(())
    }

    fn intern(&mut self, uri: String) -> usize {
        match self.namespaces.iter().position(|known| *known == uri) {
            Some(i) => i,
            None => {
                self.namespaces.push(uri);
                self.namespaces.len() - 1
            }
        }
    }

    fn finish(self) -> Result<Document> {
        if let Some(&open) = self.stack.last() {
            return Err(TcxError::IllFormed(format!(
                "unclosed element <{}>",
                self.nodes[open].local_name
            )));
        }
        if self.nodes.is_empty() {
            return Err(TcxError::IllFormed("no root element".into()));
        }
        Ok(Document {
            nodes: self.nodes,
            namespaces: self.namespaces,
            top: [0],
        })
    }
}

fn namespace_uri(resolved: &ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(utf8(uri)?.to_string())),
        ResolveResult::Unbound => Ok(None),
        _ => Err(TcxError::IllFormed("undeclared namespace prefix".into())),
    }
}

/// Character references and the five predefined XML entities.
fn resolve_reference(e: &BytesRef<'_>) -> Result<char> {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        return Ok(ch);
    }
    match utf8(e.as_ref())? {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        other => Err(TcxError::IllFormed(format!("undefined entity '&{other};'"))),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| TcxError::IllFormed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:test";

    #[test]
    fn test_tree_structure() {
        let xml = r#"<?xml version="1.0"?>
<a xmlns="urn:test" kind="outer">
  <b><c>1</c><c>2</c></b>
  <d/>
</a>"#;
        let doc = Document::parse_str(xml).unwrap();
        assert_eq!(doc.find_all("//*", &[]).unwrap().len(), 5);

        let root = doc.root();
        assert_eq!(root.local_name(), "a");
        assert_eq!(root.namespace(), Some(NS));
        assert_eq!(root.attribute("kind"), Some("outer"));
        assert_eq!(root.attribute("xmlns"), None);

        let names: Vec<&str> = root.children().map(|n| n.local_name()).collect();
        assert_eq!(names, vec!["b", "d"]);

        let b = root.child(NS, "b").unwrap();
        let cs: Vec<&str> = b.children_named(NS, "c").map(|n| n.text()).collect();
        assert_eq!(cs, vec!["1", "2"]);
        assert_eq!(b.parent(), Some(root));
        assert_eq!(doc.descendant_ids(Some(b.id())), 2..4);
    }

    #[test]
    fn test_has_child_respects_namespace() {
        let xml = r#"<a xmlns="urn:test" xmlns:o="urn:other"><o:Position/><b/></a>"#;
        let doc = Document::parse_str(xml).unwrap();
        let root = doc.root();
        assert!(root.has_child(NS, "b"));
        assert!(!root.has_child(NS, "Position"));
        assert!(root.has_child("urn:other", "Position"));
    }

    #[test]
    fn test_text_with_entities_and_cdata() {
        let xml = r#"<a>Caf&#233; &amp; <![CDATA[<Bar>]]></a>"#;
        let doc = Document::parse_str(xml).unwrap();
        assert_eq!(doc.root().text(), "Café & <Bar>");
        assert_eq!(doc.root().namespace(), None);
    }

    #[test]
    fn test_text_joined_across_comment() {
        let doc = Document::parse_str("<Value>1<!--c-->20</Value>").unwrap();
        assert_eq!(doc.root().text(), "120");
    }

    #[test]
    fn test_attribute_unescaped() {
        let doc = Document::parse_str(r#"<a Sport="Run &amp; Bike"/>"#).unwrap();
        assert_eq!(doc.root().attribute("Sport"), Some("Run & Bike"));
    }

    #[test]
    fn test_scalar_from_text() {
        let doc = Document::parse_str("<a><v> 61.5 </v><t>morning</t></a>").unwrap();
        let root = doc.root();
        let v = root.children().next().unwrap();
        assert_eq!(v.scalar(), Scalar::Float(61.5));
        assert_eq!(v.text(), " 61.5 ");
        let t = root.children().nth(1).unwrap();
        assert_eq!(t.scalar(), Scalar::Text("morning".into()));
    }

    #[test]
    fn test_mismatched_tag_is_error() {
        assert!(Document::parse_str("<a><b></a>").is_err());
    }

    #[test]
    fn test_unclosed_tag_is_error() {
        assert!(Document::parse_str("<a><b></b>").is_err());
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = Document::parse_str("  ").unwrap_err();
        assert!(matches!(err, TcxError::IllFormed(_)));
    }

    #[test]
    fn test_deep_nesting_is_error() {
        let depth = u16::MAX as usize + 1;
        let xml = "<a>".repeat(depth) + &"</a>".repeat(depth);
        let err = Document::parse_str(&xml).unwrap_err();
        assert!(matches!(err, TcxError::IllFormed(msg) if msg.contains("too deep")));
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let xml = "<a>".repeat(MAX_DEPTH) + &"</a>".repeat(MAX_DEPTH);
        let doc = Document::parse_str(&xml).unwrap();
        assert_eq!(doc.find_all("//a", &[]).unwrap().len(), MAX_DEPTH);
    }

    #[test]
    fn test_two_roots_is_error() {
        let err = Document::parse_str("<a/><b/>").unwrap_err();
        assert!(matches!(err, TcxError::IllFormed(_)));
    }

    #[test]
    fn test_from_reader() {
        let bytes: &[u8] = b"\xEF\xBB\xBF<a><b/></a>";
        let doc = Document::from_reader(bytes).unwrap();
        assert_eq!(doc.root().local_name(), "a");
    }

    #[test]
    fn test_open_missing_file() {
        let err = Document::open("does/not/exist.tcx").unwrap_err();
        assert!(matches!(err, TcxError::Io(_)));
    }
}
