//! Category predicates used by rules to match one posture of their window.
//!
//! ```text
//! expression := term { ('or'|'xor') term }
//! term       := unary { 'and' unary }
//! unary      := 'not' unary | '(' expression ')' | category-name
//! ```
//!
//! Category names are resolved to category codes when the predicate is compiled; an unknown name
//! is a data error.

use crate::error::{Error, Result};
use crate::model::Posture;
use alloc::{borrow::ToOwned, boxed::Box, format, string::String};

#[derive(Debug, Clone, PartialEq)]
pub enum BooleanNode {
    Category { name: String, code: u32 },
    Not(Box<BooleanNode>),
    And(Box<BooleanNode>, Box<BooleanNode>),
    Or(Box<BooleanNode>, Box<BooleanNode>),
    Xor(Box<BooleanNode>, Box<BooleanNode>),
}

impl BooleanNode {
    /// Compiles `expression`, resolving category names through `category_code`.
    pub fn parse<F>(expression: &str, category_code: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<u32>,
    {
        let mut parser = BooleanParser {
            input: expression,
            pos: 0,
            token: "",
            category_code,
        };
        parser.next_token();
        if parser.token.is_empty() {
            return Err(parser.error("Empty string"));
        }
        let root = parser.parse_expression()?;
        if !parser.token.is_empty() {
            return Err(parser.error(format!("Unexpected symbol: {}", parser.token)));
        }
        Ok(root)
    }

    pub fn eval(&self, posture: &Posture) -> bool {
        match self {
            Self::Category { code, .. } => posture.is_member_of_category(*code),
            Self::Not(child) => !child.eval(posture),
            Self::And(lhs, rhs) => lhs.eval(posture) && rhs.eval(posture),
            Self::Or(lhs, rhs) => lhs.eval(posture) || rhs.eval(posture),
            Self::Xor(lhs, rhs) => lhs.eval(posture) != rhs.eval(posture),
        }
    }
}

struct BooleanParser<'a, F> {
    input: &'a str,
    pos: usize,
    /// current token, empty at end of input
    token: &'a str,
    category_code: F,
}

impl<'a, F> BooleanParser<'a, F>
where
    F: Fn(&str) -> Option<u32>,
{
    fn error(&self, description: impl Into<String>) -> Error {
        Error::BooleanParse {
            description: description.into(),
            position: self.pos,
            input: self.input.to_owned(),
        }
    }

    fn next_token(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        match bytes.get(self.pos) {
            None => {}
            Some(b'(' | b')') => self.pos += 1,
            Some(_) => {
                while self.pos < bytes.len()
                    && !matches!(bytes[self.pos], b'(' | b')')
                    && !bytes[self.pos].is_ascii_whitespace()
                {
                    self.pos += 1;
                }
            }
        }
        self.token = &self.input[start..self.pos];
    }

    fn parse_unary(&mut self) -> Result<BooleanNode> {
        match self.token {
            "" => Err(self.error("Unexpected end of expression")),
            "not" => {
                self.next_token();
                Ok(BooleanNode::Not(Box::new(self.parse_unary()?)))
            }
            "(" => {
                self.next_token();
                let inner = self.parse_expression()?;
                if self.token != ")" {
                    return Err(self.error("Right parenthesis not found"));
                }
                self.next_token();
                Ok(inner)
            }
            ")" | "and" | "or" | "xor" => {
                Err(self.error(format!("Unexpected symbol: {}", self.token)))
            }
            name => {
                let code = (self.category_code)(name)
                    .ok_or_else(|| Error::UnknownCategory(name.to_owned()))?;
                self.next_token();
                Ok(BooleanNode::Category {
                    name: name.to_owned(),
                    code,
                })
            }
        }
    }

    fn parse_term(&mut self) -> Result<BooleanNode> {
        let mut term = self.parse_unary()?;
        while self.token == "and" {
            self.next_token();
            term = BooleanNode::And(Box::new(term), Box::new(self.parse_unary()?));
        }
        Ok(term)
    }

    fn parse_expression(&mut self) -> Result<BooleanNode> {
        let mut expression = self.parse_term()?;
        loop {
            let xor = match self.token {
                "or" => false,
                "xor" => true,
                _ => return Ok(expression),
            };
            self.next_token();
            let rhs = Box::new(self.parse_term()?);
            expression = if xor {
                BooleanNode::Xor(Box::new(expression), rhs)
            } else {
                BooleanNode::Or(Box::new(expression), rhs)
            };
        }
    }
}
