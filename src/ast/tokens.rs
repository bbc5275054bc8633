use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Values
    /// Bare term, with backslash escapes already resolved
    ///
    /// # Examples
    /// ```text
    /// value1
    /// parent.child
    /// 2015-01-01
    /// 51.5,-0.12~75mi
    /// ```
    Term(String),

    /// Double-quoted phrase, quotes stripped
    ///
    /// # Examples
    /// ```text
    /// "hello world"
    /// "0001-01-01T00:00:00"
    /// ```
    Phrase(String),

    // Clause prefixes
    /// Required clause (`+`)
    Plus,

    /// Prohibited clause (`-`)
    Minus,

    /// Negation keyword (`NOT` or `!`)
    Not,

    // Boolean operators
    /// Conjunction (`AND` or `&&`)
    And,

    /// Disjunction (`OR` or `||`)
    Or,

    // Ranges
    /// Range separator keyword
    ///
    /// # Examples
    /// ```text
    /// [1 TO 10]
    /// ```
    To,

    /// `>` shorthand range
    Gt,

    /// `>=` shorthand range
    GtEq,

    /// `<` shorthand range
    Lt,

    /// `<=` shorthand range
    LtEq,

    // Delimiters
    /// Field separator
    Colon,

    /// Left parenthesis for groups
    LParen,

    /// Right parenthesis
    RParen,

    /// Inclusive range start
    LBracket,

    /// Inclusive range end
    RBracket,

    /// Exclusive range start
    LBrace,

    /// Exclusive range end
    RBrace,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(t) => write!(f, "{}", t),
            Token::Phrase(p) => write!(f, "\"{}\"", p),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Not => write!(f, "NOT"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::To => write!(f, "TO"),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
