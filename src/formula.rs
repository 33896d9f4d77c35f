//! Arithmetic formulas over the rule symbol table.
//!
//! A formula is compiled once into a [`FormulaNode`] tree and then evaluated many times against
//! different [`FormulaSymbolList`]s. Grammar, standard precedence, left to right on ties:
//!
//! ```text
//! expression := term { ('+'|'-') term }
//! term       := factor { ('*'|'/') factor }
//! factor     := '(' expression ')' | ('+'|'-') factor | symbol-or-constant
//! ```
//!
//! A bare token is looked up in the [`SymbolTable`]; when it is not a symbol it is read as an
//! `f32` constant. Evaluation follows native floating point semantics, so dividing by zero yields
//! an infinity or NaN instead of an error.

use crate::error::{Error, Result};
use alloc::{borrow::ToOwned, boxed::Box, collections::BTreeMap, format, string::String};
use core::fmt;
use core::ops::{Index, IndexMut};

/// Symbols a rule formula can reference.
///
/// The numbered symbols refer to the posture at that position in the rule window (1 based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormulaSymbol {
    Duration1,
    Duration2,
    Duration3,
    Duration4,
    Transition1,
    Transition2,
    Transition3,
    Transition4,
    Qssa1,
    Qssa2,
    Qssa3,
    Qssa4,
    Qssb1,
    Qssb2,
    Qssb3,
    Qssb4,
    Tempo1,
    Tempo2,
    Tempo3,
    Tempo4,
    /// rule duration
    Rd,
    Beat,
    Mark1,
    Mark2,
}

impl FormulaSymbol {
    pub const COUNT: usize = 24;

    pub const ALL: [FormulaSymbol; Self::COUNT] = [
        Self::Duration1,
        Self::Duration2,
        Self::Duration3,
        Self::Duration4,
        Self::Transition1,
        Self::Transition2,
        Self::Transition3,
        Self::Transition4,
        Self::Qssa1,
        Self::Qssa2,
        Self::Qssa3,
        Self::Qssa4,
        Self::Qssb1,
        Self::Qssb2,
        Self::Qssb3,
        Self::Qssb4,
        Self::Tempo1,
        Self::Tempo2,
        Self::Tempo3,
        Self::Tempo4,
        Self::Rd,
        Self::Beat,
        Self::Mark1,
        Self::Mark2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Duration1 => "duration1",
            Self::Duration2 => "duration2",
            Self::Duration3 => "duration3",
            Self::Duration4 => "duration4",
            Self::Transition1 => "transition1",
            Self::Transition2 => "transition2",
            Self::Transition3 => "transition3",
            Self::Transition4 => "transition4",
            Self::Qssa1 => "qssa1",
            Self::Qssa2 => "qssa2",
            Self::Qssa3 => "qssa3",
            Self::Qssa4 => "qssa4",
            Self::Qssb1 => "qssb1",
            Self::Qssb2 => "qssb2",
            Self::Qssb3 => "qssb3",
            Self::Qssb4 => "qssb4",
            Self::Tempo1 => "tempo1",
            Self::Tempo2 => "tempo2",
            Self::Tempo3 => "tempo3",
            Self::Tempo4 => "tempo4",
            Self::Rd => "rd",
            Self::Beat => "beat",
            Self::Mark1 => "mark1",
            Self::Mark2 => "mark2",
        }
    }

    /// Context symbols of the posture at `position` (0 based) in a rule window:
    /// `(duration, transition, qssa, qssb, tempo)`.
    pub(crate) fn context(position: usize) -> (Self, Self, Self, Self, Self) {
        let at = |first: usize| Self::ALL[first + position];
        (at(0), at(4), at(8), at(12), at(16))
    }
}

impl fmt::Display for FormulaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps formula tokens to symbols.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    codes: BTreeMap<String, FormulaSymbol>,
}

impl SymbolTable {
    pub fn empty() -> Self {
        SymbolTable {
            codes: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, symbol: FormulaSymbol) {
        self.codes.insert(name.to_owned(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<FormulaSymbol> {
        self.codes.get(name).copied()
    }
}

impl Default for SymbolTable {
    /// The table of rule symbols, each under its own name.
    fn default() -> Self {
        let mut table = SymbolTable::empty();
        for symbol in FormulaSymbol::ALL {
            table.insert(symbol.name(), symbol);
        }
        table
    }
}

/// Values for every [`FormulaSymbol`], all zero by default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormulaSymbolList([f32; FormulaSymbol::COUNT]);

impl Index<FormulaSymbol> for FormulaSymbolList {
    type Output = f32;
    fn index(&self, symbol: FormulaSymbol) -> &f32 {
        &self.0[symbol as usize]
    }
}

impl IndexMut<FormulaSymbol> for FormulaSymbolList {
    fn index_mut(&mut self, symbol: FormulaSymbol) -> &mut f32 {
        &mut self.0[symbol as usize]
    }
}

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaNode {
    Constant(f32),
    Symbol(FormulaSymbol),
    Minus(Box<FormulaNode>),
    Add(Box<FormulaNode>, Box<FormulaNode>),
    Sub(Box<FormulaNode>, Box<FormulaNode>),
    Mult(Box<FormulaNode>, Box<FormulaNode>),
    Div(Box<FormulaNode>, Box<FormulaNode>),
}

impl FormulaNode {
    /// Compiles `formula` against `table`.
    ///
    /// Fails on an empty formula, a missing right parenthesis, an operator where an operand is
    /// expected, input left over after a complete expression, or a token that is neither a
    /// symbol nor a number.
    pub fn parse(formula: &str, table: &SymbolTable) -> Result<Self> {
        let mut parser = FormulaParser::new(formula, table)?;
        let root = parser.parse_expression()?;
        if parser.token != Token::End {
            return Err(parser.error(format!("Unexpected symbol: {}", parser.token_text())));
        }
        Ok(root)
    }

    pub fn eval(&self, symbols: &FormulaSymbolList) -> f32 {
        match self {
            Self::Constant(value) => *value,
            Self::Symbol(symbol) => symbols[*symbol],
            Self::Minus(child) => -child.eval(symbols),
            Self::Add(lhs, rhs) => lhs.eval(symbols) + rhs.eval(symbols),
            Self::Sub(lhs, rhs) => lhs.eval(symbols) - rhs.eval(symbols),
            Self::Mult(lhs, rhs) => lhs.eval(symbols) * rhs.eval(symbols),
            Self::Div(lhs, rhs) => lhs.eval(symbols) / rhs.eval(symbols),
        }
    }

    fn print(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let prefix = level * 8;
        let (op, lhs, rhs) = match self {
            Self::Constant(value) => return writeln!(f, "{:prefix$}const={value}", ""),
            Self::Symbol(symbol) => return writeln!(f, "{:prefix$}symbol={symbol}", ""),
            Self::Minus(child) => {
                writeln!(f, "{:prefix$}- [", "")?;
                child.print(f, level + 1)?;
                return writeln!(f, "{:prefix$}]", "");
            }
            Self::Add(lhs, rhs) => ('+', lhs, rhs),
            Self::Sub(lhs, rhs) => ('-', lhs, rhs),
            Self::Mult(lhs, rhs) => ('*', lhs, rhs),
            Self::Div(lhs, rhs) => ('/', lhs, rhs),
        };
        writeln!(f, "{:prefix$}{op} [", "")?;
        lhs.print(f, level + 1)?;
        rhs.print(f, level + 1)?;
        writeln!(f, "{:prefix$}]", "")
    }
}

impl fmt::Display for FormulaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    End,
    Add,
    Sub,
    Mult,
    Div,
    RightParen,
    LeftParen,
    Str,
}

struct FormulaParser<'a> {
    table: &'a SymbolTable,
    input: &'a str,
    pos: usize,
    token: Token,
    symbol: &'a str,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, table: &'a SymbolTable) -> Result<Self> {
        let mut parser = FormulaParser {
            table,
            input,
            pos: 0,
            token: Token::End,
            symbol: "",
        };
        if input.is_empty() {
            return Err(parser.error("Empty string"));
        }
        parser.next_symbol();
        Ok(parser)
    }

    fn error(&self, description: impl Into<String>) -> Error {
        Error::FormulaParse {
            description: description.into(),
            position: self.pos,
            input: self.input.to_owned(),
        }
    }

    fn is_separator(c: u8) -> bool {
        matches!(c, b'(' | b')' | b'+' | b'-' | b'*' | b'/') || c.is_ascii_whitespace()
    }

    fn token_text(&self) -> &'a str {
        match self.token {
            Token::End => "end of input",
            Token::Add => "+",
            Token::Sub => "-",
            Token::Mult => "*",
            Token::Div => "/",
            Token::RightParen => ")",
            Token::LeftParen => "(",
            Token::Str => self.symbol,
        }
    }

    fn next_symbol(&mut self) {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        self.symbol = "";
        let Some(&c) = bytes.get(self.pos) else {
            self.token = Token::End;
            return;
        };
        self.pos += 1;
        self.token = match c {
            b'+' => Token::Add,
            b'-' => Token::Sub,
            b'*' => Token::Mult,
            b'/' => Token::Div,
            b')' => Token::RightParen,
            b'(' => Token::LeftParen,
            _ => {
                let start = self.pos - 1;
                while self.pos < bytes.len() && !Self::is_separator(bytes[self.pos]) {
                    self.pos += 1;
                }
                self.symbol = &self.input[start..self.pos];
                Token::Str
            }
        };
    }

    fn parse_factor(&mut self) -> Result<FormulaNode> {
        match self.token {
            Token::LeftParen => {
                self.next_symbol();
                let inner = self.parse_expression()?;
                if self.token != Token::RightParen {
                    return Err(self.error("Right parenthesis not found"));
                }
                self.next_symbol();
                Ok(inner)
            }
            Token::Add => {
                self.next_symbol();
                self.parse_factor()
            }
            Token::Sub => {
                self.next_symbol();
                Ok(FormulaNode::Minus(Box::new(self.parse_factor()?)))
            }
            Token::Str => {
                let symbol = self.symbol;
                self.next_symbol();
                if let Some(code) = self.table.get(symbol) {
                    return Ok(FormulaNode::Symbol(code));
                }
                symbol
                    .parse::<f32>()
                    .map(FormulaNode::Constant)
                    .map_err(|_| self.error(format!("Invalid constant: {symbol}")))
            }
            Token::RightParen | Token::Mult | Token::Div => {
                Err(self.error(format!("Unexpected symbol: {}", self.token_text())))
            }
            Token::End => Err(self.error("Invalid symbol")),
        }
    }

    fn parse_term(&mut self) -> Result<FormulaNode> {
        let mut term = self.parse_factor()?;
        while matches!(self.token, Token::Mult | Token::Div) {
            let op = self.token;
            self.next_symbol();
            let rhs = Box::new(self.parse_factor()?);
            term = if op == Token::Mult {
                FormulaNode::Mult(Box::new(term), rhs)
            } else {
                FormulaNode::Div(Box::new(term), rhs)
            };
        }
        Ok(term)
    }

    fn parse_expression(&mut self) -> Result<FormulaNode> {
        let mut expression = self.parse_term()?;
        while matches!(self.token, Token::Add | Token::Sub) {
            let op = self.token;
            self.next_symbol();
            let rhs = Box::new(self.parse_term()?);
            expression = if op == Token::Add {
                FormulaNode::Add(Box::new(expression), rhs)
            } else {
                FormulaNode::Sub(Box::new(expression), rhs)
            };
        }
        Ok(expression)
    }
}

/// A named formula, compiled when the model is prepared.
#[derive(Debug, Clone)]
pub struct Equation {
    pub name: String,
    pub group: String,
    pub formula: String,
    root: Option<FormulaNode>,
}

impl Equation {
    pub fn new(name: &str, group: &str, formula: &str) -> Self {
        Equation {
            name: name.to_owned(),
            group: group.to_owned(),
            formula: formula.to_owned(),
            root: None,
        }
    }

    /// Builds the formula tree. An empty formula leaves the equation without a tree.
    pub fn parse_formula(&mut self, table: &SymbolTable) -> Result<()> {
        self.root = if self.formula.is_empty() {
            None
        } else {
            Some(FormulaNode::parse(&self.formula, table)?)
        };
        Ok(())
    }

    pub fn formula_root(&self) -> Option<&FormulaNode> {
        self.root.as_ref()
    }

    pub fn eval_formula(&self, symbols: &FormulaSymbolList) -> Result<f32> {
        self.root
            .as_ref()
            .map(|root| root.eval(symbols))
            .ok_or_else(|| Error::MissingFormula(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn eval(formula: &str) -> f32 {
        FormulaNode::parse(formula, &SymbolTable::default())
            .unwrap()
            .eval(&FormulaSymbolList::default())
    }

    #[test]
    fn precedence_is_standard() {
        assert_eq!(eval("2+3*4"), 14.0);
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2+3)*4"), 20.0);
        assert_eq!(eval("10-4-3"), 3.0);
        assert_eq!(eval("24/4/2"), 3.0);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("-(2+3)"), -5.0);
        assert_eq!(eval("+7"), 7.0);
        assert_eq!(eval("--3"), 3.0);
        assert_eq!(eval("2*-3"), -6.0);
    }

    #[test]
    fn symbols_are_looked_up() {
        let table = SymbolTable::default();
        let tree = FormulaNode::parse("rd - transition2 / 2", &table).unwrap();
        let mut symbols = FormulaSymbolList::default();
        symbols[FormulaSymbol::Rd] = 100.0;
        symbols[FormulaSymbol::Transition2] = 30.0;
        assert_eq!(tree.eval(&symbols), 85.0);
        symbols[FormulaSymbol::Rd] = 50.0;
        assert_eq!(tree.eval(&symbols), 35.0);
    }

    #[test]
    fn unknown_token_falls_back_to_constant() {
        let tree = FormulaNode::parse("33.5", &SymbolTable::empty()).unwrap();
        assert_eq!(tree, FormulaNode::Constant(33.5));
        let tree = FormulaNode::parse("rd", &SymbolTable::empty());
        assert!(matches!(tree, Err(Error::FormulaParse { .. })));
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        assert!(eval("1/0").is_infinite());
        assert!(eval("0/0").is_nan());
    }

    #[test]
    fn empty_formula_fails() {
        let err = FormulaNode::parse("", &SymbolTable::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Formula expression parser error: Empty string at position 0 of string []."
        );
    }

    #[test]
    fn unmatched_parenthesis_fails() {
        let table = SymbolTable::default();
        let err = FormulaNode::parse("(2+3", &table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Formula expression parser error: Right parenthesis not found at position 4 of string [(2+3]."
        );
        assert!(FormulaNode::parse("2+3)", &table).is_err());
    }

    #[test]
    fn unexpected_operator_fails() {
        let table = SymbolTable::default();
        let err = FormulaNode::parse("2+*3", &table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Formula expression parser error: Unexpected symbol: * at position 3 of string [2+*3]."
        );
        assert!(FormulaNode::parse("/3", &table).is_err());
        assert!(FormulaNode::parse("2+", &table).is_err());
    }

    #[test]
    fn tree_prints_nested() {
        let tree = FormulaNode::parse("-(rd*2)", &SymbolTable::default()).unwrap();
        assert_eq!(
            tree.to_string(),
            "- [\n        * [\n                symbol=rd\n                const=2\n        ]\n]\n"
        );
    }

    #[test]
    fn equation_without_tree_fails_to_evaluate() {
        let mut equation = Equation::new("empty", "test", "");
        equation.parse_formula(&SymbolTable::default()).unwrap();
        assert!(equation.formula_root().is_none());
        assert!(matches!(
            equation.eval_formula(&FormulaSymbolList::default()),
            Err(Error::MissingFormula(name)) if name == "empty"
        ));

        let mut equation = Equation::new("beat", "test", "rd / 2");
        equation.parse_formula(&SymbolTable::default()).unwrap();
        let mut symbols = FormulaSymbolList::default();
        symbols[FormulaSymbol::Rd] = 64.0;
        assert_eq!(equation.eval_formula(&symbols).unwrap(), 32.0);
    }

    #[test]
    fn context_symbols_follow_position() {
        let (duration, transition, qssa, qssb, tempo) = FormulaSymbol::context(2);
        assert_eq!(duration, FormulaSymbol::Duration3);
        assert_eq!(transition, FormulaSymbol::Transition3);
        assert_eq!(qssa, FormulaSymbol::Qssa3);
        assert_eq!(qssb, FormulaSymbol::Qssb3);
        assert_eq!(tempo, FormulaSymbol::Tempo3);
    }
}
