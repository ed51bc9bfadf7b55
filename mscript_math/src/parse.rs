use std::{iter::Peekable, str::CharIndices};

use mscript_object::is_name_char;

use crate::{
    BinaryOp, MathError,
    MathError::{ArgumentCount, ParseError},
    MathFunction, MathNode,
};

/// Parse a math expression into a tree.
///
/// Operators are `+ - * / ^`, unary minus and the postfix transpose `'`, with the usual
/// precedence and `^` binding tighter than unary minus. A name followed by `(` is a call if it
/// names a [MathFunction], and otherwise an array element leaf whose text is kept whole, e.g.
/// `A(i, 2)`.
pub fn parse_expression(text: &str) -> Result<MathNode, MathError> {
    ExpressionParser::new(text).parse()
}

/// Return true if `text` should be evaluated as an equation.
///
/// A lone number or identifier counts only if `allow_single_element` is set. Text that does
/// not parse, and a lone string literal, are never equations.
pub fn is_equation(text: &str, allow_single_element: bool) -> bool {
    match parse_expression(text) {
        Ok(MathNode::Number(_)) | Ok(MathNode::Element(_)) => allow_single_element,
        Ok(MathNode::String(_)) | Err(_) => false,
        Ok(_) => true,
    }
}

struct ExpressionParser<'s> {
    source: &'s str,
    chars: Peekable<CharIndices<'s>>,
}

impl<'s> ExpressionParser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<MathNode, MathError> {
        let node = self.expression()?;
        if self.peek().is_some() {
            return Err(self.expected("an operator"));
        }
        Ok(node)
    }

    fn expression(&mut self) -> Result<MathNode, MathError> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Subtract,
                _ => break,
            };
            self.chars.next();
            let right = self.term()?;
            node = MathNode::binary(op, node, right);
        }
        Ok(node)
    }

    fn term(&mut self) -> Result<MathNode, MathError> {
        let mut node = self.unary()?;
        loop {
            let op = match self.peek() {
                Some('*') => BinaryOp::Multiply,
                Some('/') => BinaryOp::Divide,
                _ => break,
            };
            self.chars.next();
            let right = self.unary()?;
            node = MathNode::binary(op, node, right);
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<MathNode, MathError> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(match self.unary()? {
                    MathNode::Number(value) => MathNode::Number(-value),
                    node => MathNode::Negate(Box::new(node)),
                })
            }
            Some('+') => {
                self.chars.next();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<MathNode, MathError> {
        let base = self.postfix()?;
        if self.peek() == Some('^') {
            self.chars.next();
            let exponent = self.unary()?;
            return Ok(MathNode::binary(BinaryOp::Power, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<MathNode, MathError> {
        let mut node = self.primary()?;
        while self.peek() == Some('\'') {
            self.chars.next();
            node = MathNode::Function {
                function: MathFunction::Transpose,
                args: vec![node],
            };
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<MathNode, MathError> {
        match self.peek() {
            Some('(') => {
                self.chars.next();
                let node = self.expression()?;
                self.char(')')?;
                Ok(node)
            }
            Some('\'') => self.string(),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.name(),
            _ => Err(self.expected("a number, name or `(`")),
        }
    }

    fn string(&mut self) -> Result<MathNode, MathError> {
        self.chars.next();
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => return Ok(MathNode::String(text)),
                Some((_, c)) => text.push(c),
                None => return Err(self.expected("`'`")),
            }
        }
    }

    fn number(&mut self) -> Result<MathNode, MathError> {
        let start = self.offset();
        while self
            .chars
            .next_if(|&(_, c)| c.is_ascii_digit() || c == '.')
            .is_some()
        {}
        if self.chars.next_if(|&(_, c)| c == 'e' || c == 'E').is_some() {
            self.chars.next_if(|&(_, c)| c == '+' || c == '-');
            while self.chars.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {}
        }
        let (source, end) = (self.source, self.offset());
        let text = &source[start..end];
        text.parse::<f64>()
            .map(MathNode::Number)
            .map_err(|_| ParseError(format!("invalid number `{}` in \"{}\"", text, source)))
    }

    fn name(&mut self) -> Result<MathNode, MathError> {
        let start = self.offset();
        while self
            .chars
            .next_if(|&(_, c)| is_name_char(c) || c == '.')
            .is_some()
        {}
        let (source, end) = (self.source, self.offset());
        let name = &source[start..end];
        if name.ends_with('.') {
            return Err(ParseError(format!(
                "incomplete name `{}` in \"{}\"",
                name, source
            )));
        }
        if self.chars.peek().map(|&(_, c)| c) != Some('(') {
            return Ok(MathNode::Element(name.to_string()));
        }
        match MathFunction::from_name(name) {
            Some(function) => self.call(function),
            None => self.array_element(start),
        }
    }

    fn call(&mut self, function: MathFunction) -> Result<MathNode, MathError> {
        self.char('(')?;
        let mut args = vec![self.expression()?];
        while self.peek() == Some(',') {
            self.chars.next();
            args.push(self.expression()?);
        }
        self.char(')')?;
        if args.len() != function.arity() {
            return Err(ArgumentCount {
                function: function.name(),
                expected: function.arity(),
                actual: args.len(),
            });
        }
        Ok(MathNode::Function { function, args })
    }

    /// `name(...)` up to the matching `)`, kept as a single leaf.
    fn array_element(&mut self, start: usize) -> Result<MathNode, MathError> {
        let mut depth = 0_usize;
        while let Some((_, c)) = self.chars.next() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = self.offset();
                        return Ok(MathNode::Element(self.source[start..end].to_string()));
                    }
                }
                _ => {}
            }
        }
        Err(self.expected("`)`"))
    }

    fn char(&mut self, c: char) -> Result<(), MathError> {
        if self.peek() == Some(c) {
            self.chars.next();
            Ok(())
        } else {
            Err(self.expected(format!("`{}`", c)))
        }
    }

    /// The next non-whitespace character.
    fn peek(&mut self) -> Option<char> {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |&(i, _)| i)
    }

    fn expected(&mut self, expected: impl Into<String>) -> MathError {
        match self.chars.peek() {
            Some((_, c)) => ParseError(format!(
                "expected {} in \"{}\", found `{}`",
                expected.into(),
                self.source,
                c
            )),
            None => ParseError(format!(
                "expected {} in \"{}\", reached end of string",
                expected.into(),
                self.source
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MathValue, WrapperMap};

    fn eval(text: &str) -> f64 {
        match parse_expression(text)
            .unwrap()
            .evaluate(&WrapperMap::new())
            .unwrap()
        {
            MathValue::Real(value) => value,
            value => panic!("expected a real, found {:?}", value),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3 ^ 2"), 19.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("2^-1"), 0.5);
        assert_eq!(eval("8 / 4 / 2"), 1.0);
        assert_eq!(eval("1 - -1"), 2.0);
        assert_eq!(eval("2.5e1"), 25.0);
    }

    #[test]
    fn test_functions() {
        assert!((eval("atan2(1, 1)") - std::f64::consts::FRAC_PI_4).abs() < 1e-15);
        assert_eq!(eval("sqrt(16) + abs(-2)"), 6.0);
        assert_eq!(eval("RadToDeg(DegToRad(90))"), 90.0);
        assert!(matches!(
            parse_expression("sin(1, 2)"),
            Err(ArgumentCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_leaves() {
        let node = parse_expression("A(i, B(1,2)) + sat1.Earth.SMA * x'").unwrap();
        assert_eq!(node.element_names(), ["A(i, B(1,2))", "sat1.Earth.SMA", "x"]);

        let node = parse_expression("'a b' ").unwrap();
        assert_eq!(node, MathNode::String("a b".into()));
    }

    #[test]
    fn test_syntax_errors() {
        for text in ["1 +", "(1 + 2", "'abc", "sat1.", "1 2", "A(1,2", "{a, b}"] {
            assert!(
                matches!(parse_expression(text), Err(ParseError(_))),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_is_equation() {
        assert!(is_equation("x + 1", false));
        assert!(is_equation("sin(x)", false));
        assert!(is_equation("x'", false));
        assert!(!is_equation("x", false));
        assert!(is_equation("x", true));
        assert!(!is_equation("-5", false));
        assert!(!is_equation("A(1, 2)", false));
        assert!(!is_equation("'x + 1'", true));
        assert!(!is_equation("{Earth, Luna}", true));
        assert!(!is_equation("01 Jan 2000", true));
    }
}
