use crate::ast::{GroupOperator, Prefix};
use std::fmt;

/// Syntax tree node produced by the parser.
///
/// The tree is immutable once built; compilers only borrow it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Sequence of clauses combined with one operator
    ///
    /// # Examples
    /// ```text
    /// a OR b
    /// parent:(child:value other)
    /// ```
    Group(GroupNode),

    /// Single term or quoted phrase
    ///
    /// # Examples
    /// ```text
    /// status:active
    /// "hello world"
    /// ```
    Term(TermNode),

    /// Bounded or half-open range
    ///
    /// # Examples
    /// ```text
    /// age:[18 TO 65]
    /// price:{* TO 100}
    /// count:>=5
    /// ```
    TermRange(TermRangeNode),

    /// Field presence check (`_exists_:field`)
    Exists(ExistsNode),

    /// Field absence check (`_missing_:field`)
    Missing(MissingNode),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupNode {
    pub operator: GroupOperator,
    pub children: Vec<Node>,
    /// Field prefix scoping every descendant (`field:(...)`)
    pub field: Option<String>,
    pub has_parens: bool,
    pub negated: bool,
    pub prefix: Option<Prefix>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermNode {
    pub field: Option<String>,
    pub term: String,
    /// Written as a double-quoted phrase
    pub quoted: bool,
    pub negated: bool,
    pub prefix: Option<Prefix>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermRangeNode {
    pub field: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    /// `None` means inclusive
    pub min_inclusive: Option<bool>,
    /// `None` means inclusive
    pub max_inclusive: Option<bool>,
    pub negated: bool,
    pub prefix: Option<Prefix>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExistsNode {
    pub field: Option<String>,
    pub negated: bool,
    pub prefix: Option<Prefix>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissingNode {
    pub field: Option<String>,
    pub negated: bool,
    pub prefix: Option<Prefix>,
}

impl Node {
    /// The field written on the node itself, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Node::Group(n) => n.field.as_deref(),
            Node::Term(n) => n.field.as_deref(),
            Node::TermRange(n) => n.field.as_deref(),
            Node::Exists(n) => n.field.as_deref(),
            Node::Missing(n) => n.field.as_deref(),
        }
    }

    pub fn negated(&self) -> bool {
        match self {
            Node::Group(n) => n.negated,
            Node::Term(n) => n.negated,
            Node::TermRange(n) => n.negated,
            Node::Exists(n) => n.negated,
            Node::Missing(n) => n.negated,
        }
    }

    pub fn prefix(&self) -> Option<Prefix> {
        match self {
            Node::Group(n) => n.prefix,
            Node::Term(n) => n.prefix,
            Node::TermRange(n) => n.prefix,
            Node::Exists(n) => n.prefix,
            Node::Missing(n) => n.prefix,
        }
    }

    /// Applies a clause-level prefix and negation to an already built node.
    pub(crate) fn decorate(&mut self, prefix: Option<Prefix>, negated: bool) {
        let (slot, neg) = match self {
            Node::Group(n) => (&mut n.prefix, &mut n.negated),
            Node::Term(n) => (&mut n.prefix, &mut n.negated),
            Node::TermRange(n) => (&mut n.prefix, &mut n.negated),
            Node::Exists(n) => (&mut n.prefix, &mut n.negated),
            Node::Missing(n) => (&mut n.prefix, &mut n.negated),
        };
        if prefix.is_some() {
            *slot = prefix;
        }
        *neg |= negated;
    }
}

impl TermNode {
    pub fn new(field: Option<&str>, term: &str) -> Self {
        TermNode {
            field: field.map(str::to_string),
            term: term.to_string(),
            ..Default::default()
        }
    }
}

impl From<GroupNode> for Node {
    fn from(node: GroupNode) -> Self {
        Node::Group(node)
    }
}

impl From<TermNode> for Node {
    fn from(node: TermNode) -> Self {
        Node::Term(node)
    }
}

impl From<TermRangeNode> for Node {
    fn from(node: TermRangeNode) -> Self {
        Node::TermRange(node)
    }
}

impl From<ExistsNode> for Node {
    fn from(node: ExistsNode) -> Self {
        Node::Exists(node)
    }
}

impl From<MissingNode> for Node {
    fn from(node: MissingNode) -> Self {
        Node::Missing(node)
    }
}

fn write_clause_start(
    f: &mut fmt::Formatter<'_>,
    prefix: Option<Prefix>,
    negated: bool,
    field: Option<&str>,
) -> fmt::Result {
    if let Some(p) = prefix {
        write!(f, "{}", p)?;
    }
    if negated {
        write!(f, "NOT ")?;
    }
    if let Some(field) = field {
        write!(f, "{}:", field)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Group(n) => n.fmt(f),
            Node::Term(n) => n.fmt(f),
            Node::TermRange(n) => n.fmt(f),
            Node::Exists(n) => {
                write_clause_start(f, n.prefix, n.negated, None)?;
                write!(f, "_exists_:{}", n.field.as_deref().unwrap_or("*"))
            }
            Node::Missing(n) => {
                write_clause_start(f, n.prefix, n.negated, None)?;
                write!(f, "_missing_:{}", n.field.as_deref().unwrap_or("*"))
            }
        }
    }
}

impl fmt::Display for GroupNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clause_start(f, self.prefix, self.negated, self.field.as_deref())?;
        let parens = self.has_parens || self.field.is_some();
        if parens {
            write!(f, "(")?;
        }
        let separator = match self.operator {
            GroupOperator::Default => " ",
            GroupOperator::And => " AND ",
            GroupOperator::Or => " OR ",
        };
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", separator)?;
            }
            write!(f, "{}", child)?;
        }
        if parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for TermNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clause_start(f, self.prefix, self.negated, self.field.as_deref())?;
        if self.quoted {
            write!(f, "\"{}\"", self.term.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            write!(f, "{}", self.term)
        }
    }
}

impl fmt::Display for TermRangeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clause_start(f, self.prefix, self.negated, self.field.as_deref())?;
        let open = if self.min_inclusive == Some(false) { '{' } else { '[' };
        let close = if self.max_inclusive == Some(false) { '}' } else { ']' };
        write!(
            f,
            "{}{} TO {}{}",
            open,
            self.min.as_deref().unwrap_or("*"),
            self.max.as_deref().unwrap_or("*"),
            close
        )
    }
}
