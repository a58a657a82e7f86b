// SPDX-FileCopyrightText: 2025 Noesis Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Formula parser
//!
//! Recursive descent over the token stream with an explicit precedence
//! ladder (tightest first): prefix operators, `U`/`S`, `∧`, `⊕`, `∨`,
//! `→` (right-associative), `↔`. Quantifier bodies extend as far right
//! as possible. A depth counter bounds recursion so adversarial input
//! fails with `MaxDepthExceeded` instead of overflowing the stack.

pub mod lexer;
pub mod serializer;

pub use serializer::serialize;

use crate::config::ParserConfig;
use crate::core::{BinaryTemporalOp, DeonticOp, Formula, Quantifier, TemporalOp, Term};
use crate::error::ParseError;
use lexer::{Spanned, Token};

/// Parse formula text with the default configuration
pub fn parse(text: &str) -> Result<Formula, ParseError> {
    FormulaParser::default().parse(text)
}

/// Reusable parser carrying its configuration
#[derive(Debug, Clone, Default)]
pub struct FormulaParser {
    config: ParserConfig,
}

impl FormulaParser {
    pub fn new(config: ParserConfig) -> Self {
        FormulaParser { config }
    }

    pub fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    pub fn parse(&self, text: &str) -> Result<Formula, ParseError> {
        let tokens = lexer::tokenize(text)?;
        let mut state = ParseState {
            tokens,
            pos: 0,
            end: text.len(),
            depth: 0,
            max_depth: self.config.max_depth,
            bound: Vec::new(),
        };

        if state.tokens.is_empty() {
            return Err(ParseError::syntax(0, "empty formula"));
        }

        let formula = state.parse_formula()?;
        if let Some(extra) = state.peek_spanned() {
            return Err(ParseError::syntax(
                extra.position,
                format!("unexpected {}", extra.token.describe()),
            ));
        }

        // A prefix operator over a full-depth parenthesized chain can still
        // land one level past the limit.
        if formula.depth() > self.config.max_depth {
            return Err(ParseError::MaxDepthExceeded { limit: self.config.max_depth, position: 0 });
        }

        Ok(formula)
    }

    /// Parse a list of formulas, stopping at the first failure
    pub fn parse_all<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Formula>, ParseError> {
        texts.iter().map(|t| self.parse(t.as_ref())).collect()
    }
}

struct ParseState {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
    max_depth: usize,
    /// Variables bound by enclosing quantifiers, innermost last
    bound: Vec<String>,
}

impl ParseState {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.position).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let position = self.position();
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParseError::syntax(
                position,
                format!("expected {}, found {}", expected.describe(), token.describe()),
            )),
            None => Err(ParseError::syntax(
                position,
                format!("expected {}, found end of input", expected.describe()),
            )),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn too_deep(&self) -> ParseError {
        ParseError::MaxDepthExceeded { limit: self.max_depth, position: self.position() }
    }

    /// Depth of a binary node over a left operand of `left_depth` and
    /// `right`. Left-nested chains grow in a loop rather than through
    /// recursion, so they are checked here before the node is built.
    fn chain_depth(&self, left_depth: usize, right: &Formula) -> Result<usize, ParseError> {
        let depth = 1 + left_depth.max(right.depth());
        if depth > self.max_depth {
            return Err(self.too_deep());
        }
        Ok(depth)
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }

    fn parse_formula(&mut self) -> Result<Formula, ParseError> {
        self.enter()?;
        let result = self.parse_iff();
        self.exit();
        result
    }

    fn parse_iff(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_implies()?;
        let mut depth = left.depth();
        while self.peek() == Some(&Token::Iff) {
            self.advance();
            let right = self.parse_implies()?;
            depth = self.chain_depth(depth, &right)?;
            left = Formula::iff(left, right);
        }
        Ok(left)
    }

    fn parse_implies(&mut self) -> Result<Formula, ParseError> {
        let left = self.parse_or()?;
        if self.peek() == Some(&Token::Implies) {
            self.advance();
            self.enter()?;
            let right = self.parse_implies();
            self.exit();
            return Ok(Formula::implies(left, right?));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_xor()?;
        let mut depth = left.depth();
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_xor()?;
            depth = self.chain_depth(depth, &right)?;
            left = Formula::or(left, right);
        }
        Ok(left)
    }

    fn parse_xor(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_and()?;
        let mut depth = left.depth();
        while self.peek() == Some(&Token::Xor) {
            self.advance();
            let right = self.parse_and()?;
            depth = self.chain_depth(depth, &right)?;
            left = Formula::xor(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Formula, ParseError> {
        let mut left = self.parse_binary_temporal()?;
        let mut depth = left.depth();
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_binary_temporal()?;
            depth = self.chain_depth(depth, &right)?;
            left = Formula::and(left, right);
        }
        Ok(left)
    }

    fn binary_temporal_op(&self) -> Option<BinaryTemporalOp> {
        match self.peek() {
            Some(Token::Until) => Some(BinaryTemporalOp::Until),
            Some(Token::Since) => Some(BinaryTemporalOp::Since),
            Some(Token::Ident(name)) if name == "U" => Some(BinaryTemporalOp::Until),
            Some(Token::Ident(name)) if name == "S" => Some(BinaryTemporalOp::Since),
            _ => None,
        }
    }

    fn parse_binary_temporal(&mut self) -> Result<Formula, ParseError> {
        let left = self.parse_unary()?;
        if let Some(op) = self.binary_temporal_op() {
            self.advance();
            self.enter()?;
            let right = self.parse_binary_temporal();
            self.exit();
            return Ok(Formula::binary_temporal(op, left, right?));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Formula, ParseError> {
        self.enter()?;
        let result = self.parse_unary_inner();
        self.exit();
        result
    }

    fn parse_unary_inner(&mut self) -> Result<Formula, ParseError> {
        let position = self.position();
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(ParseError::syntax(position, "unexpected end of input")),
        };

        match token {
            Token::Not => {
                self.advance();
                Ok(Formula::not(self.parse_unary()?))
            }
            Token::Always => {
                self.advance();
                Ok(Formula::always(self.parse_unary()?))
            }
            Token::Eventually => {
                self.advance();
                Ok(Formula::eventually(self.parse_unary()?))
            }
            Token::Next => {
                self.advance();
                Ok(Formula::next(self.parse_unary()?))
            }
            Token::Forall | Token::Exists => self.parse_quantifier(),
            Token::LParen => {
                self.advance();
                let inner = self.parse_formula()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                let followed_by_paren = self.peek_at(1) == Some(&Token::LParen);
                match (name.as_str(), followed_by_paren) {
                    ("O", true) => self.parse_deontic(DeonticOp::Obligatory),
                    ("P", true) => self.parse_deontic(DeonticOp::Permitted),
                    ("F", true) => self.parse_deontic(DeonticOp::Forbidden),
                    ("X", true) => {
                        self.advance();
                        let body = self.parse_parenthesized()?;
                        Ok(Formula::temporal(TemporalOp::Next, body))
                    }
                    _ => self.parse_predicate(),
                }
            }
            other => Err(ParseError::syntax(position, format!("unexpected {}", other.describe()))),
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Formula, ParseError> {
        self.expect(Token::LParen)?;
        let inner = self.parse_formula()?;
        self.expect(Token::RParen)?;
        Ok(inner)
    }

    fn parse_deontic(&mut self, op: DeonticOp) -> Result<Formula, ParseError> {
        self.advance();
        let body = self.parse_parenthesized()?;
        Ok(Formula::deontic(op, body))
    }

    fn parse_quantifier(&mut self) -> Result<Formula, ParseError> {
        let quantifier = match self.advance() {
            Some(Token::Forall) => Quantifier::Forall,
            _ => Quantifier::Exists,
        };

        let position = self.position();
        let variable = match self.advance() {
            Some(Token::Ident(name)) => name,
            Some(other) => {
                return Err(ParseError::syntax(
                    position,
                    format!("expected bound variable, found {}", other.describe()),
                ))
            }
            None => return Err(ParseError::syntax(position, "expected bound variable, found end of input")),
        };

        if matches!(self.peek(), Some(Token::Dot) | Some(Token::Colon)) {
            self.advance();
        }

        self.bound.push(variable.clone());
        let body = self.parse_formula();
        self.bound.pop();

        Ok(Formula::quantified(quantifier, variable, body?))
    }

    fn parse_predicate(&mut self) -> Result<Formula, ParseError> {
        let name = match self.advance() {
            Some(Token::Ident(name)) => name,
            _ => return Err(ParseError::syntax(self.position(), "expected predicate")),
        };
        let args = if self.peek() == Some(&Token::LParen) {
            self.parse_term_list()?
        } else {
            vec![]
        };
        Ok(Formula::Predicate { name, args })
    }

    fn parse_term_list(&mut self) -> Result<Vec<Term>, ParseError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_term()?);
            let position = self.position();
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(other) => {
                    return Err(ParseError::syntax(
                        position,
                        format!("expected ',' or ')' in argument list, found {}", other.describe()),
                    ))
                }
                None => return Err(ParseError::syntax(position, "unterminated argument list")),
            }
        }
        Ok(args)
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        self.enter()?;
        let result = self.parse_term_inner();
        self.exit();
        result
    }

    fn parse_term_inner(&mut self) -> Result<Term, ParseError> {
        let position = self.position();
        let name = match self.advance() {
            Some(Token::Ident(name)) => name,
            Some(other) => {
                return Err(ParseError::syntax(position, format!("expected term, found {}", other.describe())))
            }
            None => return Err(ParseError::syntax(position, "expected term, found end of input")),
        };

        if self.peek() == Some(&Token::LParen) {
            let args = self.parse_term_list()?;
            return Ok(Term::Function { name, args });
        }

        if self.bound.iter().any(|v| v == &name) {
            Ok(Term::Variable(name))
        } else {
            Ok(Term::Constant(name))
        }
    }
}
