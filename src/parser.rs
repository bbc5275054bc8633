use crate::{
    ast::{
        ExistsNode, GroupNode, GroupOperator, MissingNode, Node, Prefix, TermNode, TermRangeNode,
        Token,
    },
    config::DEFAULT_MAX_DEPTH,
    error::ParseError,
    lexer::{Lexer, Position},
};
use std::mem;

const EXISTS_FIELD: &str = "_exists_";
const MISSING_FIELD: &str = "_missing_";

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    position: Position,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let position = lexer.token_position();
        Ok(Parser {
            lexer,
            current_token,
            position,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Overrides the group nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_position();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&expected.to_string()));
        }
        self.advance()
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.current_token == Token::Eof {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current_token.to_string(),
                position: self.position,
            }
        }
    }

    /// Parse a complete query into its root group.
    ///
    /// The root is never parenthesized; an empty query yields a group with
    /// no children.
    pub fn parse(&mut self) -> Result<GroupNode, ParseError> {
        self.enter_group()?;
        let nodes = self.parse_sequence()?;
        self.depth -= 1;
        self.expect(Token::Eof)?;

        // Operator groups nest too, so recount the finished tree the way
        // the compiler walks it.
        let root = into_group(nodes, None, false);
        if group_depth(&root) > self.max_depth {
            return Err(ParseError::TooDeeplyNested {
                limit: self.max_depth,
            });
        }
        Ok(root)
    }

    fn enter_group(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeeplyNested {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Juxtaposed clauses up to `)` or end of input.
    fn parse_sequence(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = vec![];
        while !self.check(&Token::Eof) && !self.check(&Token::RParen) {
            nodes.push(self.parse_or()?);
        }
        Ok(nodes)
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut operands = vec![self.parse_and()?];

        while self.check(&Token::Or) {
            self.advance()?;
            operands.push(self.parse_and()?);
        }

        Ok(combine(operands, GroupOperator::Or))
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut operands = vec![self.parse_clause()?];

        while self.check(&Token::And) {
            self.advance()?;
            operands.push(self.parse_clause()?);
        }

        Ok(combine(operands, GroupOperator::And))
    }

    fn parse_prefix(&mut self) -> Result<(Option<Prefix>, bool), ParseError> {
        let mut prefix = None;
        let mut negated = false;

        loop {
            match self.current_token {
                Token::Plus => prefix = Some(Prefix::Required),
                Token::Minus => prefix = Some(Prefix::Prohibited),
                Token::Not => negated = true,
                _ => return Ok((prefix, negated)),
            }
            self.advance()?;
        }
    }

    fn parse_clause(&mut self) -> Result<Node, ParseError> {
        let (prefix, negated) = self.parse_prefix()?;

        let mut node = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::LParen => {
                self.current_token = Token::LParen;
                self.parse_group(None)?
            }
            Token::Term(term) => {
                self.advance()?;
                if self.check(&Token::Colon) {
                    self.advance()?;
                    self.parse_field_value(term)?
                } else {
                    TermNode {
                        term,
                        ..Default::default()
                    }
                    .into()
                }
            }
            token => {
                self.current_token = token;
                self.parse_value(None)?
            }
        };

        node.decorate(prefix, negated);
        Ok(node)
    }

    fn parse_field_value(&mut self, field: String) -> Result<Node, ParseError> {
        if field == EXISTS_FIELD || field == MISSING_FIELD {
            let target = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Term(name) | Token::Phrase(name) => name,
                token => {
                    self.current_token = token;
                    return Err(self.unexpected("field name"));
                }
            };
            self.advance()?;

            return Ok(if field == EXISTS_FIELD {
                ExistsNode {
                    field: Some(target),
                    ..Default::default()
                }
                .into()
            } else {
                MissingNode {
                    field: Some(target),
                    ..Default::default()
                }
                .into()
            });
        }

        let (inner_prefix, _) = match self.current_token {
            Token::Plus | Token::Minus => self.parse_prefix()?,
            _ => (None, false),
        };

        let mut node = if self.check(&Token::LParen) {
            self.parse_group(Some(field))?
        } else {
            self.parse_value(Some(field))?
        };

        node.decorate(inner_prefix, false);
        Ok(node)
    }

    fn parse_group(&mut self, field: Option<String>) -> Result<Node, ParseError> {
        self.expect(Token::LParen)?;
        self.enter_group()?;
        let nodes = self.parse_sequence()?;
        self.expect(Token::RParen)?;
        self.depth -= 1;

        Ok(into_group(nodes, field, true).into())
    }

    fn parse_value(&mut self, field: Option<String>) -> Result<Node, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Term(term) => {
                self.advance()?;
                Ok(TermNode {
                    field,
                    term,
                    ..Default::default()
                }
                .into())
            }
            Token::Phrase(term) => {
                self.advance()?;
                Ok(TermNode {
                    field,
                    term,
                    quoted: true,
                    ..Default::default()
                }
                .into())
            }
            Token::LBracket => {
                self.advance()?;
                self.parse_range(field, true)
            }
            Token::LBrace => {
                self.advance()?;
                self.parse_range(field, false)
            }
            token @ (Token::Gt | Token::GtEq | Token::Lt | Token::LtEq) => {
                self.advance()?;
                let bound = self.parse_bound()?;
                let mut range = TermRangeNode {
                    field,
                    ..Default::default()
                };
                match token {
                    Token::Gt => {
                        range.min = bound;
                        range.min_inclusive = Some(false);
                    }
                    Token::GtEq => {
                        range.min = bound;
                        range.min_inclusive = Some(true);
                    }
                    Token::Lt => {
                        range.max = bound;
                        range.max_inclusive = Some(false);
                    }
                    _ => {
                        range.max = bound;
                        range.max_inclusive = Some(true);
                    }
                }
                Ok(range.into())
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("term, phrase, range or group"))
            }
        }
    }

    /// Range body after the opening bracket.
    fn parse_range(&mut self, field: Option<String>, min_inclusive: bool) -> Result<Node, ParseError> {
        let min = self.parse_bound()?;
        self.expect(Token::To)?;
        let max = self.parse_bound()?;

        let max_inclusive = match self.current_token {
            Token::RBracket => true,
            Token::RBrace => false,
            _ => return Err(self.unexpected("']' or '}'")),
        };
        self.advance()?;

        Ok(TermRangeNode {
            field,
            min,
            max,
            min_inclusive: Some(min_inclusive),
            max_inclusive: Some(max_inclusive),
            ..Default::default()
        }
        .into())
    }

    /// A single range bound; `*` is unbounded. A leading sign is kept in
    /// the bound text.
    fn parse_bound(&mut self) -> Result<Option<String>, ParseError> {
        let sign = match self.current_token {
            Token::Minus => Some('-'),
            Token::Plus => Some('+'),
            _ => None,
        };
        if let Some(sign) = sign {
            self.advance()?;
            return match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Term(t) if t != "*" => {
                    self.advance()?;
                    Ok(Some(format!("{sign}{t}")))
                }
                token => {
                    self.current_token = token;
                    Err(self.unexpected("signed range bound"))
                }
            };
        }

        let bound = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Term(t) if t == "*" => None,
            Token::Term(t) | Token::Phrase(t) => Some(t),
            token => {
                self.current_token = token;
                return Err(self.unexpected("range bound"));
            }
        };
        self.advance()?;
        Ok(bound)
    }
}

/// Collapses a single operand, otherwise wraps the operands in an
/// unparenthesized group carrying `operator`.
fn combine(operands: Vec<Node>, operator: GroupOperator) -> Node {
    match <[Node; 1]>::try_from(operands) {
        Ok([single]) => single,
        Err(children) => GroupNode {
            operator,
            children,
            ..Default::default()
        }
        .into(),
    }
}

/// Builds a group from a clause sequence, lifting a lone bare operator group
/// so `(a OR b)` is one group rather than two.
fn into_group(nodes: Vec<Node>, field: Option<String>, has_parens: bool) -> GroupNode {
    let mut group = match <[Node; 1]>::try_from(nodes) {
        Ok([Node::Group(inner)])
            if !inner.has_parens
                && inner.field.is_none()
                && inner.prefix.is_none()
                && !inner.negated =>
        {
            inner
        }
        Ok([single]) => GroupNode {
            children: vec![single],
            ..Default::default()
        },
        Err(children) => GroupNode {
            children,
            ..Default::default()
        },
    };
    group.field = field;
    group.has_parens = has_parens;
    group
}

/// Nesting of `group`, counting itself and every operator group below it.
fn group_depth(group: &GroupNode) -> usize {
    let deepest = group
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Group(inner) => Some(group_depth(inner)),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    deepest + 1
}

/// Parse query text with the default nesting limit.
pub fn parse(input: &str) -> Result<GroupNode, ParseError> {
    Parser::new(Lexer::new(input))?.parse()
}
