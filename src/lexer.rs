use crate::{ast::Token, error::LexError};
use std::fmt;

/// Character offset into the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.offset)
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Start of the most recently returned token.
    pub fn token_position(&self) -> Position {
        Position {
            offset: self.token_start,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_term_boundary(ch: char) -> bool {
        ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | ':' | '"')
    }

    /// A sign glued to a `:` and followed by a digit belongs to the value,
    /// as in `lat:-33.86`.
    fn starts_signed_value(&self) -> bool {
        let after_colon = self
            .position
            .checked_sub(1)
            .and_then(|i| self.input.get(i))
            == Some(&':');
        after_colon && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
    }

    fn read_phrase(&mut self) -> Result<String, LexError> {
        let start = self.token_position();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some(escaped) => result.push(escaped),
                        None => return Err(LexError::UnterminatedPhrase(start)),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedPhrase(start))
    }

    /// Reads a bare term. Returns the text and whether any escape was used,
    /// since escaped words never become keywords.
    fn read_term(&mut self) -> Result<(String, bool), LexError> {
        let mut result = String::new();
        let mut escaped = false;

        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                self.advance();
                match self.current_char() {
                    Some(next) => result.push(next),
                    None => {
                        return Err(LexError::DanglingEscape(Position {
                            offset: self.position,
                        }));
                    }
                }
                escaped = true;
                self.advance();
            } else if Self::is_term_boundary(ch) {
                break;
            } else {
                result.push(ch);
                self.advance();
            }
        }

        Ok((result, escaped))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('[') => {
                self.advance();
                Token::LBracket
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('{') => {
                self.advance();
                Token::LBrace
            }
            Some('}') => {
                self.advance();
                Token::RBrace
            }
            Some(':') => {
                self.advance();
                Token::Colon
            }
            Some('"') => Token::Phrase(self.read_phrase()?),
            Some(sign @ ('+' | '-')) if self.starts_signed_value() => {
                self.advance();
                let (digits, _) = self.read_term()?;
                Token::Term(format!("{sign}{digits}"))
            }
            Some('+') => {
                self.advance();
                Token::Plus
            }
            Some('-') => {
                self.advance();
                Token::Minus
            }
            Some('!') => {
                self.advance();
                Token::Not
            }
            Some('&') if self.peek_char(1) == Some('&') => {
                self.advance();
                self.advance();
                Token::And
            }
            Some('|') if self.peek_char(1) == Some('|') => {
                self.advance();
                self.advance();
                Token::Or
            }
            Some('>') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            Some('<') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::LtEq
                } else {
                    Token::Lt
                }
            }
            Some(_) => {
                let (term, escaped) = self.read_term()?;
                if term.is_empty() {
                    let ch = self.current_char().unwrap_or(' ');
                    return Err(LexError::UnexpectedChar {
                        ch,
                        position: self.token_position(),
                    });
                }

                match term.as_str() {
                    "AND" if !escaped => Token::And,
                    "OR" if !escaped => Token::Or,
                    "NOT" if !escaped => Token::Not,
                    "TO" if !escaped => Token::To,
                    _ => Token::Term(term),
                }
            }
        };

        Ok(token)
    }

    /// Tokenizes the whole input, ending with `Token::Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("AND OR NOT TO and");
    assert_eq!(lexer.next_token().unwrap(), Token::And);
    assert_eq!(lexer.next_token().unwrap(), Token::Or);
    assert_eq!(lexer.next_token().unwrap(), Token::Not);
    assert_eq!(lexer.next_token().unwrap(), Token::To);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("and".to_string()));
}

#[test]
fn test_field_group() {
    let mut lexer = Lexer::new("parent:(child:value)");
    assert_eq!(lexer.next_token().unwrap(), Token::Term("parent".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Colon);
    assert_eq!(lexer.next_token().unwrap(), Token::LParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("child".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Colon);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("value".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_signed_value_after_colon() {
    let mut lexer = Lexer::new("lat:-33.86 -lat:+5 lat: -1");
    assert_eq!(lexer.next_token().unwrap(), Token::Term("lat".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Colon);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("-33.86".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Minus);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("lat".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Colon);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("+5".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Term("lat".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::Colon);
    assert_eq!(lexer.next_token().unwrap(), Token::Minus);
    assert_eq!(lexer.next_token().unwrap(), Token::Term("1".to_string()));
}
