//! Textual property predicates.
//!
//! ## Grammar
//!
//! ```text
//! expr       := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!" unary | "(" expr ")" | comparison
//! comparison := NAME op VALUE
//! op         := "=" | "==" | "!=" | "<" | "<=" | ">" | ">="
//! ```
//!
//! Names and values are bare words or double-quoted strings (`\"` and `\\`
//! escapes inside quotes). A missing property compares as the empty
//! string. When both sides parse as integers the comparison is numeric,
//! otherwise it is a string comparison.
//!
//! An empty expression matches every piece. `!` and parentheses may nest
//! at most [`MAX_NESTING`] deep.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::{PieceFilter, PropertySource};

/// Deepest nesting of `!` and parentheses a parsed expression may have.
pub const MAX_NESTING: usize = 64;

/// Errors from parsing a property expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected `{0}`")]
    UnexpectedToken(String),

    #[error("unterminated quoted string")]
    UnterminatedQuote,

    #[error("expected comparison operator after `{0}`")]
    MissingOperator(String),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Op(CompareOp),
    Word(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Not => "!".into(),
            Token::And => "&&".into(),
            Token::Or => "||".into(),
            Token::Op(op) => format!("{:?}", op),
            Token::Word(w) => w.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Expr {
    Compare {
        name: String,
        op: CompareOp,
        value: String,
    },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn eval<P: PropertySource + ?Sized>(&self, piece: &P) -> bool {
        match self {
            Expr::Compare { name, op, value } => {
                let actual = piece
                    .property(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                op.holds(compare(&actual, value))
            }
            Expr::Not(inner) => !inner.eval(piece),
            Expr::And(parts) => parts.iter().all(|e| e.eval(piece)),
            Expr::Or(parts) => parts.iter().any(|e| e.eval(piece)),
        }
    }
}

fn compare(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<i64>(), expected.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => actual.cmp(expected),
    }
}

/// A parsed property predicate.
///
/// ```
/// use rust_tabletop::filter::PropertyExpression;
///
/// let expr = PropertyExpression::parse("Type = Tank && (Level > 2 || Elite = true)").unwrap();
/// assert_eq!(expr.source(), "Type = Tank && (Level > 2 || Elite = true)");
/// assert!(PropertyExpression::parse("Type =").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PropertyExpression {
    source: String,
    root: Option<Expr>,
}

impl PropertyExpression {
    /// The always-true expression.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse `source`.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        let root = if tokens.is_empty() {
            None
        } else {
            let mut parser = Parser { tokens, pos: 0, depth: 0 };
            let expr = parser.or()?;
            if let Some(extra) = parser.tokens.get(parser.pos) {
                return Err(ExpressionError::UnexpectedToken(extra.describe()));
            }
            Some(expr)
        };
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The original text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Does this expression accept everything?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Evaluate against a piece.
    pub fn matches<P: PropertySource + ?Sized>(&self, piece: &P) -> bool {
        self.root.as_ref().map_or(true, |e| e.eval(piece))
    }
}

impl<P: PropertySource + ?Sized> PieceFilter<P> for PropertyExpression {
    fn accept(&self, piece: &P) -> bool {
        self.matches(piece)
    }
}

impl std::fmt::Display for PropertyExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '!' | '=' | '<' | '>' | '&' | '|' | '"')
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Op(CompareOp::Ne));
                } else {
                    tokens.push(Token::Not);
                }
            }
            '=' => {
                chars.next();
                chars.next_if_eq(&'=');
                tokens.push(Token::Op(CompareOp::Eq));
            }
            '<' | '>' => {
                chars.next();
                let or_equal = chars.next_if_eq(&'=').is_some();
                tokens.push(Token::Op(match (c, or_equal) {
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    (_, false) => CompareOp::Gt,
                    (_, true) => CompareOp::Ge,
                }));
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(ExpressionError::UnexpectedToken(c.to_string()));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            '"' => {
                chars.next();
                tokens.push(Token::Word(quoted(&mut chars)?));
            }
            _ => {
                let mut word = String::new();
                while let Some(ch) = chars.next_if(|ch| is_word_char(*ch)) {
                    word.push(ch);
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    Ok(tokens)
}

fn quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, ExpressionError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err(ExpressionError::UnterminatedQuote),
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(ExpressionError::UnterminatedQuote),
            },
            Some(c) => out.push(c),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ExpressionError::TooDeep(MAX_NESTING));
        }
        Ok(())
    }

    fn or(&mut self) -> Result<Expr, ExpressionError> {
        let mut parts = vec![self.and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            parts.push(self.and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Or(parts)
        })
    }

    fn and(&mut self) -> Result<Expr, ExpressionError> {
        let mut parts = vec![self.unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            parts.push(self.unary()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::And(parts)
        })
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.bump() {
            None => Err(ExpressionError::UnexpectedEnd),
            Some(Token::Not) => {
                self.descend()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Not(Box::new(inner)))
            }
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.or()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(Token::Word(name)) => {
                let op = match self.bump() {
                    Some(Token::Op(op)) => op,
                    _ => return Err(ExpressionError::MissingOperator(name)),
                };
                match self.bump() {
                    Some(Token::Word(value)) => Ok(Expr::Compare { name, op, value }),
                    Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(other) => Err(ExpressionError::UnexpectedToken(other.describe())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, PropertyValue};
    use rustc_hash::FxHashMap;

    struct Props(FxHashMap<&'static str, PropertyValue>);

    impl Props {
        fn of(pairs: &[(&'static str, PropertyValue)]) -> Self {
            Self(pairs.iter().cloned().collect())
        }
    }

    impl PropertySource for Props {
        fn property(&self, name: &str) -> Option<PropertyValue> {
            self.0.get(name).cloned()
        }

        fn property_as(&self, name: &str, _observer: PlayerId) -> Option<PropertyValue> {
            self.property(name)
        }
    }

    fn tank() -> Props {
        Props::of(&[
            ("Type", "Tank".into()),
            ("Level", 3i64.into()),
            ("Elite", false.into()),
            ("Name", "Big Tank".into()),
        ])
    }

    fn eval(source: &str, props: &Props) -> bool {
        PropertyExpression::parse(source).unwrap().matches(props)
    }

    #[test]
    fn test_simple_comparisons() {
        let p = tank();
        assert!(eval("Type = Tank", &p));
        assert!(eval("Type == Tank", &p));
        assert!(!eval("Type != Tank", &p));
        assert!(eval("Level > 2", &p));
        assert!(eval("Level >= 3", &p));
        assert!(!eval("Level < 3", &p));
        assert!(eval("Level <= 3", &p));
        assert!(eval("Elite = false", &p));
    }

    #[test]
    fn test_numeric_vs_string_compare() {
        let p = Props::of(&[("Level", 10i64.into())]);
        // Numeric: 10 > 9, whereas "10" < "9" as strings.
        assert!(eval("Level > 9", &p));
    }

    #[test]
    fn test_boolean_connectives() {
        let p = tank();
        assert!(eval("Type = Tank && Level > 2", &p));
        assert!(!eval("Type = Tank && Level > 5", &p));
        assert!(eval("Type = Ship || Level > 2", &p));
        assert!(eval("!(Type = Ship)", &p));
        assert!(eval("Type = Ship || (Type = Tank && !Elite = true)", &p));
    }

    #[test]
    fn test_quoted_values() {
        let p = tank();
        assert!(eval("Name = \"Big Tank\"", &p));
        assert!(!eval("Name = \"Big \\\"Tank\\\"\"", &p));
    }

    #[test]
    fn test_missing_property_is_empty() {
        let p = tank();
        assert!(eval("Missing = \"\"", &p));
        assert!(!eval("Missing = x", &p));
    }

    #[test]
    fn test_empty_matches_everything() {
        let expr = PropertyExpression::parse("   ").unwrap();
        assert!(expr.is_empty());
        assert!(expr.matches(&tank()));
        assert!(PropertyExpression::empty().matches(&tank()));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let nested = |depth: usize| format!("{}Type = Tank{}", "(".repeat(depth), ")".repeat(depth));
        assert!(eval(&nested(MAX_NESTING), &tank()));
        assert_eq!(
            PropertyExpression::parse(&nested(MAX_NESTING + 1)),
            Err(ExpressionError::TooDeep(MAX_NESTING))
        );

        let negated = format!("{}Type = Tank", "!".repeat(100_000));
        assert_eq!(PropertyExpression::parse(&negated), Err(ExpressionError::TooDeep(MAX_NESTING)));

        // Depth is nesting, not a count of groups.
        let siblings = vec!["(Level > 1)"; 200].join(" && ");
        assert!(eval(&siblings, &tank()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            PropertyExpression::parse("Type"),
            Err(ExpressionError::MissingOperator("Type".into()))
        );
        assert_eq!(PropertyExpression::parse("Type ="), Err(ExpressionError::UnexpectedEnd));
        assert_eq!(PropertyExpression::parse("(Type = A"), Err(ExpressionError::UnexpectedEnd));
        assert_eq!(
            PropertyExpression::parse("Type = \"open"),
            Err(ExpressionError::UnterminatedQuote)
        );
        assert!(matches!(
            PropertyExpression::parse("Type = A )"),
            Err(ExpressionError::UnexpectedToken(_))
        ));
        assert!(matches!(
            PropertyExpression::parse("A = 1 & B = 2"),
            Err(ExpressionError::UnexpectedToken(_))
        ));
    }
}
