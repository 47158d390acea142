//! Namespace-qualified path queries.
//!
//! Supports the XPath subset the extractor needs: `/` (child) and `//` (descendant)
//! steps, a leading `.` for node-relative paths, `prefix:Local` names bound through a
//! prefix map, unprefixed names in no namespace, and `*`. Results are elements in
//! document order without duplicates.

use crate::document::{Document, Node, NodeId};
use crate::error::{Result, TcxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Qualified {
        namespace: Option<String>,
        local_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Absolute paths start at the document node, relative ones at the context element.
    pub absolute: bool,
    pub steps: Vec<Step>,
}

impl Path {
    pub fn parse(expr: &str, namespaces: &[(&str, &str)]) -> Result<Self> {
        let invalid = |reason| TcxError::InvalidPath {
            path: expr.to_string(),
            reason,
        };

        let (absolute, mut rest) = match expr.strip_prefix('.') {
            Some(rest) if rest.starts_with('/') => (false, rest),
            Some(_) => return Err(invalid("'.' must be followed by '/'")),
            None if expr.starts_with('/') => (true, expr),
            None => (false, expr),
        };

        let mut steps = Vec::new();
        let mut axis = Axis::Child;
        loop {
            if let Some(after) = rest.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = after;
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
            } else if !steps.is_empty() {
                return Err(invalid("expected '/' between steps"));
            }

            let end = rest.find('/').unwrap_or(rest.len());
            let name = &rest[..end];
            if name.is_empty() {
                return Err(invalid("empty step"));
            }
            steps.push(Step {
                axis,
                test: parse_name(name, namespaces).map_err(|e| match e {
                    TcxError::InvalidPath { reason, .. } => invalid(reason),
                    other => other,
                })?,
            });

            rest = &rest[end..];
            axis = Axis::Child;
            if rest.is_empty() {
                break;
            }
        }

        Ok(Self { absolute, steps })
    }

    /// Evaluate with `context` as the context element (`None` = document node).
    pub fn evaluate<'d>(&self, doc: &'d Document, context: Option<NodeId>) -> Vec<Node<'d>> {
        let mut current: Vec<Option<NodeId>> = if self.absolute {
            vec![None]
        } else {
            vec![context.or(Some(0))]
        };

        for step in &self.steps {
            let mut next: Vec<NodeId> = Vec::new();
            for &ctx in &current {
                match step.axis {
                    Axis::Child => next.extend(
                        doc.child_ids(ctx)
                            .iter()
                            .copied()
                            .filter(|&id| step.matches(doc, id)),
                    ),
                    Axis::Descendant => {
                        next.extend(doc.descendant_ids(ctx).filter(|&id| step.matches(doc, id)))
                    }
                }
            }
            // Arena ids are in document order.
            next.sort_unstable();
            next.dedup();
            current = next.into_iter().map(Some).collect();
        }

        current.into_iter().flatten().map(|id| doc.node(id)).collect()
    }
}

impl Step {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match &self.test {
            NameTest::Any => true,
            NameTest::Qualified {
                namespace,
                local_name,
            } => doc.is_named(id, namespace.as_deref(), local_name),
        }
    }
}

fn parse_name(name: &str, namespaces: &[(&str, &str)]) -> Result<NameTest> {
    if name == "*" {
        return Ok(NameTest::Any);
    }
    if name.contains(['[', ']', '(', ')', '@', '=', ' ']) {
        return Err(TcxError::InvalidPath {
            path: name.to_string(),
            reason: "predicates, functions and attributes are not supported",
        });
    }

    let (namespace, local_name) = match name.split_once(':') {
        Some((prefix, local)) => {
            let uri = namespaces
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, uri)| uri.to_string())
                .ok_or_else(|| TcxError::UnboundPrefix(prefix.to_string()))?;
            (Some(uri), local)
        }
        None => (None, name),
    };
    if local_name.is_empty() || local_name.contains(':') {
        return Err(TcxError::InvalidPath {
            path: name.to_string(),
            reason: "malformed qualified name",
        });
    }

    Ok(NameTest::Qualified {
        namespace,
        local_name: local_name.to_string(),
    })
}

/// Evaluate `path` against the whole document; relative paths start at the root element.
pub fn find_all<'d>(
    doc: &'d Document,
    path: &str,
    namespaces: &[(&str, &str)],
) -> Result<Vec<Node<'d>>> {
    find_all_from(doc, None, path, namespaces)
}

pub(crate) fn find_all_from<'d>(
    doc: &'d Document,
    context: Option<NodeId>,
    path: &str,
    namespaces: &[(&str, &str)],
) -> Result<Vec<Node<'d>>> {
    let compiled = Path::parse(path, namespaces)?;
    let nodes = compiled.evaluate(doc, context);
    tracing::trace!(path, matches = nodes.len(), "path query");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "urn:a";
    const B: &str = "urn:b";
    const NS: &[(&str, &str)] = &[("a", A), ("b", B)];

    fn doc() -> Document {
        Document::parse_str(
            r#"<root xmlns="urn:a" xmlns:x="urn:b">
  <Item id="1"><Value>1</Value><Ext><x:Box><x:Speed>1.5</x:Speed></x:Box></Ext></Item>
  <Group>
    <Item id="2"><Value>2</Value></Item>
    <Item id="3"><Ext><Deep><x:Box><x:Speed>2.5</x:Speed></x:Box></Deep></Ext></Item>
  </Group>
  <x:Value>not core</x:Value>
</root>"#,
        )
        .unwrap()
    }

    fn texts(nodes: &[Node<'_>]) -> Vec<String> {
        nodes.iter().map(|n| n.text().to_string()).collect()
    }

    #[test]
    fn test_parse_steps() {
        let path = Path::parse("//a:Item/b:Speed", NS).unwrap();
        assert!(path.absolute);
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(path.steps[1].axis, Axis::Child);
        assert_eq!(
            path.steps[1].test,
            NameTest::Qualified {
                namespace: Some(B.to_string()),
                local_name: "Speed".to_string()
            }
        );
    }

    #[test]
    fn test_descendant_anywhere() {
        let doc = doc();
        let nodes = find_all(&doc, "//a:Item", NS).unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.attribute("id").unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_child_step_is_namespace_qualified() {
        let doc = doc();
        let nodes = find_all(&doc, "//a:Item/a:Value", NS).unwrap();
        assert_eq!(texts(&nodes), vec!["1", "2"]);
    }

    #[test]
    fn test_mixed_namespace_descendant_chain() {
        let doc = doc();
        let nodes = find_all(&doc, "//a:Item//a:Ext//b:Box//b:Speed", NS).unwrap();
        assert_eq!(texts(&nodes), vec!["1.5", "2.5"]);
    }

    #[test]
    fn test_absolute_child_path() {
        let doc = doc();
        let nodes = find_all(&doc, "/a:root/a:Group/a:Item", NS).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(find_all(&doc, "/a:Group", NS).unwrap().is_empty());
    }

    #[test]
    fn test_relative_to_root_element() {
        let doc = doc();
        let nodes = find_all(&doc, ".//a:Value", NS).unwrap();
        assert_eq!(texts(&nodes), vec!["1", "2"]);
        assert!(find_all(&doc, ".//a:root", NS).unwrap().is_empty());
    }

    #[test]
    fn test_relative_to_node() {
        let doc = doc();
        let group = doc.root().child(A, "Group").unwrap();
        let nodes = group.find_all("a:Item", NS).unwrap();
        assert_eq!(nodes.len(), 2);
        let speeds = group.find_all(".//b:Speed", NS).unwrap();
        assert_eq!(texts(&speeds), vec!["2.5"]);
    }

    #[test]
    fn test_results_deduplicated() {
        let doc = doc();
        // Both Ext and Deep contain the second Box.
        let nodes = find_all(&doc, "//a:Item//*//b:Box", NS).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_unprefixed_name_has_no_namespace() {
        let doc = doc();
        assert!(find_all(&doc, "//Item", NS).unwrap().is_empty());
    }

    #[test]
    fn test_unbound_prefix() {
        let doc = doc();
        let err = find_all(&doc, "//z:Item", NS).unwrap_err();
        assert!(matches!(err, TcxError::UnboundPrefix(p) if p == "z"));
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["", "//", "//a:Item/", "//a:Item[1]", "a:", "./", ".a:Item", "///a:Item"] {
            let err = Path::parse(bad, NS).unwrap_err();
            assert!(
                matches!(err, TcxError::InvalidPath { .. }),
                "expected InvalidPath for {bad:?}, got {err:?}"
            );
        }
    }
}
