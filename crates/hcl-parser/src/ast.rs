//! Abstract Syntax Tree for HCL documents.
//!
//! A document is an [`ObjectList`] wrapped in a root [`Node`]. Each
//! assignment or block becomes one [`ObjectItem`]; block labels are extra
//! keys on the item (`resource "aws_instance" "web" { }` has three keys).
//! Items with equal keys are kept side by side in source order.

use hcl_span::Pos;

/// A value node with the position of the token that started it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Pos,
}

impl Node {
    pub fn new(kind: NodeKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn as_object(&self) -> Option<&ObjectList> {
        match &self.kind {
            NodeKind::Object(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::List(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeKind {
    /// `{ key = value ... }`, or the document itself.
    Object(ObjectList),

    /// `[ value, value ]`
    List(Vec<Node>),

    /// A scalar value.
    Literal(Literal),
}

/// Scalar values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Literal {
    /// Quoted string, escapes decoded. `${...}` regions are kept verbatim.
    String(String),

    /// Heredoc body, one `\n` after every line.
    Heredoc(String),

    /// Integer: `42`, `0x2a`, `052`
    Number(i64),

    /// Float: `4.2`, `1e3`
    Float(f64),

    /// Boolean: `true`, `false`
    Bool(bool),

    /// JSON `null`. Native HCL syntax has no null literal.
    Null,
}

impl Literal {
    /// The string content of `String` and `Heredoc` literals.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) | Literal::Heredoc(s) => Some(s),
            _ => None,
        }
    }
}

/// The ordered items of an object body.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectList {
    pub items: Vec<ObjectItem>,
}

impl ObjectList {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// All items whose first key is `key`, in source order.
    pub fn filter<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ObjectItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.keys.first().is_some_and(|k| k.name == key))
    }

    /// Items with the given first key, with that key removed: the children
    /// of `resource "aws_instance" "web" {}` under `filter_prefix("resource")`
    /// have keys `["aws_instance", "web"]`.
    pub fn filter_prefix(&self, key: &str) -> Vec<ObjectItem> {
        self.filter(key)
            .filter(|item| item.keys.len() > 1)
            .map(|item| ObjectItem {
                keys: item.keys[1..].to_vec(),
                value: item.value.clone(),
                pos: item.keys[1].pos.clone(),
            })
            .collect()
    }
}

/// One assignment (`key = value`) or block (`key "label" { ... }`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectItem {
    pub keys: Vec<ObjectKey>,
    pub value: Node,
    /// Position of the first key.
    pub pos: Pos,
}

impl ObjectItem {
    pub fn key_names(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }
}

/// An item key: a bare identifier or a quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObjectKey {
    pub name: String,
    pub quoted: bool,
    pub pos: Pos,
}
