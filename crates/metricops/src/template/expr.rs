//! Evaluator for the expressions inside `{{ }}` placeholders.
//!
//! Supported: identifiers bound by the permutation, dotted property access,
//! string and number literals, `+ - * / %` and parentheses. `+` concatenates
//! when either operand is a string. Nothing outside the permutation is
//! reachable.

use serde_json::{Number, Value};

use super::{display_value, Permutation, TemplateError};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

pub(super) fn evaluate(source: &str, permutation: &Permutation) -> Result<Value, TemplateError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens: &tokens,
        pos: 0,
        permutation,
    };

    let value = parser.expression()?;
    if parser.pos != tokens.len() {
        return Err(parser.syntax("unexpected trailing input"));
    }
    Ok(value)
}

fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let syntax = |message: &str| TemplateError::Syntax {
        expression: source.trim().to_string(),
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => literal.push(escaped),
                            None => return Err(syntax("unterminated string literal")),
                        },
                        Some(ch) if ch == quote => break,
                        Some(ch) => literal.push(ch),
                        None => return Err(syntax("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = digits
                    .parse::<f64>()
                    .map_err(|_| syntax("invalid number literal"))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(syntax(&format!("unexpected character '{}'", other))),
        }
    }

    if tokens.is_empty() {
        return Err(syntax("empty expression"));
    }
    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    permutation: &'a Permutation,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn syntax(&self, message: &str) -> TemplateError {
        TemplateError::Syntax {
            expression: self.source.trim().to_string(),
            message: message.to_string(),
        }
    }

    fn evaluation(&self, message: String) -> TemplateError {
        TemplateError::Evaluation {
            expression: self.source.trim().to_string(),
            message,
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Value, TemplateError> {
        let mut left = self.term()?;
        while let Some(op) = self.peek() {
            let op = match op {
                Token::Plus | Token::Minus => op.clone(),
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = if op == Token::Plus {
                self.add(left, right)?
            } else {
                self.arithmetic(&op, left, right)?
            };
        }
        Ok(left)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Value, TemplateError> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek() {
            let op = match op {
                Token::Star | Token::Slash | Token::Percent => op.clone(),
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = self.arithmetic(&op, left, right)?;
        }
        Ok(left)
    }

    // unary := '-' unary | postfix
    fn unary(&mut self) -> Result<Value, TemplateError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            let operand = self.unary()?;
            let n = self.number(&operand)?;
            return self.make_number(-n);
        }
        self.postfix()
    }

    // postfix := primary ('.' identifier)*
    fn postfix(&mut self) -> Result<Value, TemplateError> {
        let mut value = self.primary()?;
        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            let Some(Token::Ident(property)) = self.advance() else {
                return Err(self.syntax("expected property name after '.'"));
            };
            value = match value {
                Value::Object(mut fields) => fields.remove(&property).unwrap_or(Value::Null),
                Value::Null => {
                    return Err(
                        self.evaluation(format!("cannot read property '{}' of null", property))
                    )
                }
                _ => Value::Null,
            };
        }
        Ok(value)
    }

    // primary := identifier | number | string | '(' expression ')'
    fn primary(&mut self) -> Result<Value, TemplateError> {
        match self.advance() {
            Some(Token::Ident(name)) => self
                .permutation
                .get(&name)
                .cloned()
                .ok_or(TemplateError::UnknownVariable { name }),
            Some(Token::Number(n)) => self.make_number(n),
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                if self.advance() != Some(Token::RParen) {
                    return Err(self.syntax("expected ')'"));
                }
                Ok(inner)
            }
            Some(_) => Err(self.syntax("unexpected operator")),
            None => Err(self.syntax("unexpected end of expression")),
        }
    }

    fn add(&self, left: Value, right: Value) -> Result<Value, TemplateError> {
        if left.is_string() || right.is_string() {
            return Ok(Value::String(format!(
                "{}{}",
                display_value(&left),
                display_value(&right)
            )));
        }
        self.arithmetic(&Token::Plus, left, right)
    }

    fn arithmetic(&self, op: &Token, left: Value, right: Value) -> Result<Value, TemplateError> {
        let a = self.number(&left)?;
        let b = self.number(&right)?;
        let result = match op {
            Token::Plus => a + b,
            Token::Minus => a - b,
            Token::Star => a * b,
            Token::Slash | Token::Percent if b == 0.0 => {
                return Err(self.evaluation("division by zero".to_string()))
            }
            Token::Slash => a / b,
            Token::Percent => a % b,
            _ => return Err(self.syntax("unexpected operator")),
        };
        self.make_number(result)
    }

    fn number(&self, value: &Value) -> Result<f64, TemplateError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| self.evaluation(format!("number {} out of range", n))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.evaluation(format!("'{}' is not a number", s))),
            other => Err(self.evaluation(format!("{} is not a number", other))),
        }
    }

    fn make_number(&self, n: f64) -> Result<Value, TemplateError> {
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            return Ok(Value::from(n as i64));
        }
        Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| self.evaluation(format!("result {} is not a finite number", n)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings() -> Permutation {
        let mut permutation = Permutation::default();
        permutation.bind("host", json!("web-1"));
        permutation.bind("shard", json!(3));
        permutation.bind("region", json!({"name": "eu", "zone": {"id": "b"}}));
        permutation
    }

    fn eval(source: &str) -> Result<Value, TemplateError> {
        evaluate(source, &bindings())
    }

    #[test]
    fn test_bare_identifier() {
        assert_eq!(eval(" host ").unwrap(), json!("web-1"));
        assert_eq!(eval("shard").unwrap(), json!(3));
    }

    #[test]
    fn test_property_access() {
        assert_eq!(eval("region.name").unwrap(), json!("eu"));
        assert_eq!(eval("region.zone.id").unwrap(), json!("b"));
        assert_eq!(eval("region.missing").unwrap(), Value::Null);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("shard + 1").unwrap(), json!(4));
        assert_eq!(eval("shard * (2 + 1)").unwrap(), json!(9));
        assert_eq!(eval("shard / 2").unwrap(), json!(1.5));
        assert_eq!(eval("-shard % 2").unwrap(), json!(-1));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval("host + '.' + shard").unwrap(), json!("web-1.3"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            eval("nope"),
            Err(TemplateError::UnknownVariable { .. })
        ));
        assert!(matches!(eval("shard +"), Err(TemplateError::Syntax { .. })));
        assert!(matches!(eval("(shard"), Err(TemplateError::Syntax { .. })));
        assert!(matches!(eval(""), Err(TemplateError::Syntax { .. })));
        assert!(matches!(
            eval("shard / 0"),
            Err(TemplateError::Evaluation { .. })
        ));
        assert!(matches!(
            eval("host * 2"),
            Err(TemplateError::Evaluation { .. })
        ));
    }

    #[test]
    fn test_no_ambient_scope() {
        assert!(matches!(
            eval("process.env"),
            Err(TemplateError::UnknownVariable { .. })
        ));
    }
}
