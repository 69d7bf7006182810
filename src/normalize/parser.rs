//! Infix expression parser producing [`ExprLang`] e-graph expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary | implicit power)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?            // right-associative, `**` == `^`
//! primary := integer | decimal | ident | ident '(' sum ')' | '(' sum ')'
//! ```
//!
//! Implicit multiplication applies after a number or a closing parenthesis
//! when the next token is an identifier or an opening parenthesis (`2x`,
//! `2(x + 1)`, `(a)(b)`). Two identifiers in a row are rejected: that is
//! prose, not algebra.

use std::fmt;

use egg::{Id, RecExpr};

use super::{ExprLang, NormalizeError, NormalizeResult};

/// Longest fractional part accepted in a decimal literal.
const MAX_DECIMAL_SCALE: usize = 18;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Decimal { mantissa: i64, scale: u32 },
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{n}"),
            Token::Decimal { mantissa, scale } => write!(f, "{mantissa}e-{scale}"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn number_token(literal: &str) -> NormalizeResult<Token> {
    let invalid = || NormalizeError::InvalidLiteral {
        literal: literal.to_string(),
    };
    match literal.split_once('.') {
        None => literal.parse().map(Token::Int).map_err(|_| invalid()),
        Some((int_part, frac_part)) => {
            if frac_part.is_empty()
                || frac_part.contains('.')
                || frac_part.len() > MAX_DECIMAL_SCALE
            {
                return Err(invalid());
            }
            let mantissa = format!("{int_part}{frac_part}")
                .parse()
                .map_err(|_| invalid())?;
            Ok(Token::Decimal {
                mantissa,
                scale: frac_part.len() as u32,
            })
        }
    }
}

fn tokenize(input: &str) -> NormalizeResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() {
            let mut literal = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    literal.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Spanned {
                token: number_token(&literal)?,
                offset,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut ident = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Spanned {
                token: Token::Ident(ident),
                offset,
            });
            continue;
        }

        chars.next();
        let token = match ch {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => {
                if matches!(chars.peek(), Some(&(_, '*'))) {
                    chars.next();
                    Token::Caret
                } else {
                    Token::Star
                }
            }
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => return Err(NormalizeError::UnexpectedChar { ch: other, offset }),
        };
        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    expr: RecExpr<ExprLang>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn previous(&self) -> Option<&Token> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| &s.token)
    }

    fn bump(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn unexpected(&self) -> NormalizeError {
        match self.tokens.get(self.pos) {
            Some(s) => NormalizeError::UnexpectedToken {
                token: s.token.to_string(),
                offset: s.offset,
            },
            None => NormalizeError::UnexpectedEnd,
        }
    }

    fn expect_rparen(&mut self) -> NormalizeResult<()> {
        match self.peek() {
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn implicit_product_follows(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_) | Token::LParen))
            && matches!(
                self.previous(),
                Some(Token::Int(_) | Token::Decimal { .. } | Token::RParen)
            )
    }

    fn parse_sum(&mut self) -> NormalizeResult<Id> {
        let mut lhs = self.parse_product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.parse_product()?;
                    lhs = self.expr.add(ExprLang::Add([lhs, rhs]));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.parse_product()?;
                    lhs = self.expr.add(ExprLang::Sub([lhs, rhs]));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_product(&mut self) -> NormalizeResult<Id> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = self.expr.add(ExprLang::Mul([lhs, rhs]));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    lhs = self.expr.add(ExprLang::Div([lhs, rhs]));
                }
                _ if self.implicit_product_follows() => {
                    let rhs = self.parse_power()?;
                    lhs = self.expr.add(ExprLang::Mul([lhs, rhs]));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_unary(&mut self) -> NormalizeResult<Id> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let inner = self.parse_unary()?;
                Ok(self.expr.add(ExprLang::Neg([inner])))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> NormalizeResult<Id> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(self.expr.add(ExprLang::Pow([base, exponent])));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> NormalizeResult<Id> {
        let Some(Spanned { token, offset }) = self.bump() else {
            return Err(NormalizeError::UnexpectedEnd);
        };
        match token {
            Token::Int(n) => Ok(self.expr.add(ExprLang::Num(n))),
            Token::Decimal { mantissa, scale } => {
                let den = 10_i64.checked_pow(scale).ok_or(NormalizeError::Overflow)?;
                let num = self.expr.add(ExprLang::Num(mantissa));
                let den = self.expr.add(ExprLang::Num(den));
                Ok(self.expr.add(ExprLang::Div([num, den])))
            }
            Token::Ident(name) => {
                let symbol = self.expr.add(ExprLang::Symbol(name.as_str().into()));
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    let arg = self.parse_sum()?;
                    self.expect_rparen()?;
                    return Ok(self.expr.add(ExprLang::Call([symbol, arg])));
                }
                Ok(symbol)
            }
            Token::LParen => {
                let inner = self.parse_sum()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            other => Err(NormalizeError::UnexpectedToken {
                token: other.to_string(),
                offset,
            }),
        }
    }
}

/// Parse an infix expression into an e-graph expression.
pub fn parse(input: &str) -> NormalizeResult<RecExpr<ExprLang>> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        expr: RecExpr::default(),
    };
    parser.parse_sum()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected());
    }
    Ok(parser.expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sexpr(input: &str) -> String {
        parse(input).unwrap().to_string()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(sexpr("1 + 2 * x"), "(+ 1 (* 2 x))");
        assert_eq!(sexpr("a - b - c"), "(- (- a b) c)");
        assert_eq!(sexpr("x ^ 2 ^ 3"), "(^ x (^ 2 3))");
        assert_eq!(sexpr("-x^2"), "(neg (^ x 2))");
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(sexpr("x**2"), "(^ x 2)");
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(sexpr("2x"), "(* 2 x)");
        assert_eq!(sexpr("2(x + 1)"), "(* 2 (+ x 1))");
        assert_eq!(sexpr("(a)(b)"), "(* a b)");
        assert_eq!(sexpr("3x^2"), "(* 3 (^ x 2))");
    }

    #[test]
    fn function_call() {
        assert_eq!(sexpr("f(x + 1)"), "(call f (+ x 1))");
    }

    #[test]
    fn decimal_becomes_fraction() {
        assert_eq!(sexpr("2.5"), "(/ 25 10)");
    }

    #[test]
    fn prose_is_rejected() {
        assert!(matches!(
            parse("the answer"),
            Err(NormalizeError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn empty_and_whitespace_rejected() {
        assert!(matches!(parse(""), Err(NormalizeError::Empty)));
        assert!(matches!(parse("   \n"), Err(NormalizeError::Empty)));
    }

    #[test]
    fn dangling_operator_rejected() {
        assert!(matches!(parse("x +"), Err(NormalizeError::UnexpectedEnd)));
        assert!(matches!(parse("(x"), Err(NormalizeError::UnexpectedEnd)));
    }

    #[test]
    fn unknown_character_rejected() {
        assert!(matches!(
            parse("x % 2"),
            Err(NormalizeError::UnexpectedChar { ch: '%', .. })
        ));
    }

    #[test]
    fn oversized_literal_rejected() {
        assert!(matches!(
            parse("99999999999999999999999"),
            Err(NormalizeError::InvalidLiteral { .. })
        ));
    }
}
