// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tokenizer for the formula language
//!
//! Accepts both the Unicode operator set and its ASCII spellings.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Not,
    And,
    Or,
    Implies,
    Iff,
    Xor,
    Forall,
    Exists,
    Always,
    Eventually,
    /// `next` keyword (prefix form, no parentheses required)
    Next,
    /// `until` keyword
    Until,
    /// `since` keyword
    Since,
    Ident(String),
    LParen,
    RParen,
    Comma,
    Dot,
    Colon,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{}'", name),
            other => format!("{:?}", other),
        }
    }
}

/// Token with its byte offset in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "forall" => Some(Token::Forall),
        "exists" => Some(Token::Exists),
        "always" => Some(Token::Always),
        "eventually" => Some(Token::Eventually),
        "next" => Some(Token::Next),
        "until" => Some(Token::Until),
        "since" => Some(Token::Since),
        "xor" => Some(Token::Xor),
        _ => None,
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '¬' | '!' | '~' => Token::Not,
            '∧' => Token::And,
            '&' => {
                if matches!(chars.peek(), Some((_, '&'))) {
                    chars.next();
                }
                Token::And
            }
            '∨' => Token::Or,
            '|' => {
                if matches!(chars.peek(), Some((_, '|'))) {
                    chars.next();
                }
                Token::Or
            }
            '→' | '⇒' => Token::Implies,
            '↔' | '⇔' => Token::Iff,
            '⊕' | '^' => Token::Xor,
            '∀' => Token::Forall,
            '∃' => Token::Exists,
            '□' => Token::Always,
            '◊' | '◇' => Token::Eventually,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '.' => Token::Dot,
            ':' => Token::Colon,
            '-' | '=' => match chars.peek() {
                Some((_, '>')) => {
                    chars.next();
                    Token::Implies
                }
                _ => {
                    return Err(ParseError::UnknownOperator { symbol: ch.to_string(), position });
                }
            },
            '<' => {
                // <-> and <=>
                let mut lookahead = chars.clone();
                match (lookahead.next(), lookahead.next()) {
                    (Some((_, '-')), Some((_, '>'))) | (Some((_, '=')), Some((_, '>'))) => {
                        chars.next();
                        chars.next();
                        Token::Iff
                    }
                    _ => {
                        return Err(ParseError::UnknownOperator { symbol: "<".to_string(), position });
                    }
                }
            }
            c if is_ident_char(c) => {
                let mut word = String::new();
                word.push(c);
                while let Some(&(_, next)) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                keyword(&word).unwrap_or(Token::Ident(word))
            }
            other => {
                return Err(ParseError::UnknownOperator { symbol: other.to_string(), position });
            }
        };
        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}
