use std::fmt;

use crate::span::Span;

/// Index of a node inside its `Ast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Program,
    /// (defun name (params...) body...) - `arity` parameters follow the name
    Defun { arity: usize },
    /// identifier or variable reference
    Identifier,
    /// number or boolean literal
    Constant,
    /// (if cond then [else])
    If,
    /// (quote datum) or 'datum
    Quote,
    /// (operator operands...)
    Application,
    /// literal list datum: (1 #t (2))
    List,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Program => "PROGRAM",
            Self::Defun { .. } => "DEFUN",
            Self::Identifier => "IDENTIFIER",
            Self::Constant => "CONSTANT",
            Self::If => "IF",
            Self::Quote => "QUOTE",
            Self::Application => "APPLICATION",
            Self::List => "LIST",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a leaf node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(true) => f.write_str("#t"),
            Self::Boolean(false) => f.write_str("#f"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: Option<Value>,
    pub children: Vec<NodeId>,
    /// Back-link for diagnostics only
    pub parent: Option<NodeId>,
    pub span: Span,
}

/// Parsed program. Nodes live in one arena; the first node is the root and
/// every other node is listed in exactly one parent's `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
}

/// A `DEFUN` node's children split by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defun<'a> {
    pub name: NodeId,
    pub params: &'a [NodeId],
    pub body: &'a [NodeId],
}

impl Ast {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Appends a node and links it as the last child of `parent`.
    pub(crate) fn push(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        value: Option<Value>,
        span: Span,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            value,
            children: Vec::new(),
            parent,
            span,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Walks the parent links from `id` (exclusive) up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&id| self.parent(id))
    }

    pub fn defun(&self, id: NodeId) -> Option<Defun<'_>> {
        let node = self.node(id);
        let NodeKind::Defun { arity } = node.kind else {
            return None;
        };
        let (&name, rest) = node.children.split_first()?;
        if rest.len() < arity {
            return None;
        }
        let (params, body) = rest.split_at(arity);
        Some(Defun { name, params, body })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// One-line rendering, e.g. `(PROGRAM (DEFUN f (x) (APPLICATION + 2 x)))`.
    pub fn to_sexp(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_sexp(id, &mut out);
        out
    }

    fn write_sexp(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if let Some(value) = &node.value {
            out.push_str(&value.to_string());
            return;
        }

        out.push('(');
        out.push_str(node.kind.as_str());
        match self.defun(id) {
            Some(defun) => {
                out.push(' ');
                self.write_sexp(defun.name, out);
                out.push_str(" (");
                for (i, &param) in defun.params.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_sexp(param, out);
                }
                out.push(')');
                for &expr in defun.body {
                    out.push(' ');
                    self.write_sexp(expr, out);
                }
            }
            None => {
                for &child in &node.children {
                    out.push(' ');
                    self.write_sexp(child, out);
                }
            }
        }
        out.push(')');
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = self.node(id);
        write!(f, "{:indent$}{}", "", node.kind, indent = depth * 2)?;
        if let NodeKind::Defun { arity } = node.kind {
            write!(f, " (arity {})", arity)?;
        }
        if let Some(value) = &node.value {
            write!(f, " {}", value)?;
        }
        writeln!(f, " @ {}", node.span)?;
        for &child in &node.children {
            self.write_outline(f, child, depth + 1)?;
        }
        Ok(())
    }
}

/// Indented outline, one node per line.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        self.write_outline(f, self.root(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Ast, NodeId, NodeId) {
        let mut ast = Ast::new();
        let span = Span::default();
        let root = ast.push(None, NodeKind::Program, None, span);
        let defun = ast.push(Some(root), NodeKind::Defun { arity: 0 }, None, span);
        ast.push(Some(defun), NodeKind::Identifier, Some(Value::Text("f".into())), span);
        ast.push(Some(defun), NodeKind::Identifier, Some(Value::Text("x".into())), span);
        ast.set_kind(defun, NodeKind::Defun { arity: 1 });
        let app = ast.push(Some(defun), NodeKind::Application, None, span);
        ast.push(Some(app), NodeKind::Identifier, Some(Value::Text("not".into())), span);
        let leaf = ast.push(Some(app), NodeKind::Constant, Some(Value::Boolean(true)), span);
        (ast, defun, leaf)
    }

    #[test]
    fn push_links_children_in_order() {
        let (ast, defun, _) = sample();
        assert_eq!(ast.len(), 7);
        assert_eq!(ast.children(ast.root()), &[defun]);
        assert_eq!(ast.children(defun).len(), 3);
        assert_eq!(ast.parent(defun), Some(ast.root()));
        assert_eq!(ast.parent(ast.root()), None);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (ast, defun, leaf) = sample();
        let kinds: Vec<_> = ast.ancestors(leaf).map(|id| ast.node(id).kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Application, NodeKind::Defun { arity: 1 }, NodeKind::Program]
        );
        assert_eq!(ast.ancestors(ast.root()).count(), 0);
        assert_eq!(ast.ancestors(defun).count(), 1);
    }

    #[test]
    fn defun_view_splits_children() {
        let (ast, defun, _) = sample();
        let view = ast.defun(defun).unwrap();
        assert_eq!(ast.node(view.name).value, Some(Value::Text("f".into())));
        assert_eq!(view.params.len(), 1);
        assert_eq!(view.body.len(), 1);
        assert_eq!(ast.defun(ast.root()), None);
    }

    #[test]
    fn sexp_rendering() {
        let (ast, _, _) = sample();
        assert_eq!(
            ast.to_sexp(ast.root()),
            "(PROGRAM (DEFUN f (x) (APPLICATION not #t)))"
        );
    }

    #[test]
    fn outline_rendering() {
        let (ast, _, _) = sample();
        let expected = "\
PROGRAM @ 1:1
  DEFUN (arity 1) @ 1:1
    IDENTIFIER f @ 1:1
    IDENTIFIER x @ 1:1
    APPLICATION @ 1:1
      IDENTIFIER not @ 1:1
      CONSTANT #t @ 1:1
";
        assert_eq!(ast.to_string(), expected);
    }
}
