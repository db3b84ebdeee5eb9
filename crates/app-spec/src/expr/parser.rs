use crate::expr::lexer::{Spanned, Token, tokenize};
use crate::expr::{BinaryOp, EvalError, Expr, Function, UnaryOp};

const MAX_DEPTH: usize = 64;

pub(crate) fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(EvalError::syntax(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        end: source.chars().count(),
    };
    let expr = parser.expression()?;
    if let Some(extra) = parser.peek() {
        return Err(EvalError::syntax(
            extra.position,
            format!("unexpected {}", describe(&extra.token)),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn position(&self) -> usize {
        self.peek().map(|spanned| spanned.position).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().is_some_and(|spanned| &spanned.token == expected) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Spanned { token: Token::Ident(name), .. }) if name == keyword)
        {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(EvalError::syntax(self.position(), format!("expected {what}")))
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::syntax(
                self.position(),
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let condition = self.or()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.expression()?;
            self.expect(Token::Colon, "':' in conditional")?;
            let otherwise = self.expression()?;
            Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) || self.eat_keyword("or") {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) || self.eat_keyword("and") {
            let right = self.equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.comparison()?;
        loop {
            let op = if self.eat(&Token::EqEq) {
                BinaryOp::Eq
            } else if self.eat(&Token::NotEq) {
                BinaryOp::NotEq
            } else {
                return Ok(left);
            };
            let right = self.comparison()?;
            left = binary(op, left, right);
        }
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().map(|spanned| &spanned.token) {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.cursor += 1;
            let right = self.additive()?;
            left = binary(op, left, right);
        }
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek().map(|spanned| &spanned.token) {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.cursor += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().map(|spanned| &spanned.token) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.cursor += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = if self.eat(&Token::Minus) {
            Some(UnaryOp::Neg)
        } else if self.eat(&Token::Plus) {
            Some(UnaryOp::Plus)
        } else if self.eat(&Token::Bang) || self.eat_keyword("not") {
            Some(UnaryOp::Not)
        } else {
            None
        };
        match op {
            Some(op) => {
                self.enter()?;
                let operand = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, EvalError> {
        let base = self.primary()?;
        if self.eat(&Token::StarStar) {
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let position = self.position();
        let Some(spanned) = self.advance() else {
            return Err(EvalError::syntax(position, "unexpected end of expression"));
        };
        match spanned.token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Text(text) => Ok(Expr::Text(text)),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if name == "true" || name == "false" {
                    Ok(Expr::Bool(name == "true"))
                } else if self.eat(&Token::LParen) {
                    self.call(name)
                } else {
                    Ok(Expr::Var(name))
                }
            }
            other => Err(EvalError::syntax(
                position,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, EvalError> {
        let function = Function::lookup(&name).ok_or(EvalError::UnknownFunction(name))?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RParen, "',' or ')' in argument list")?;
                break;
            }
        }
        function.check_arity(args.len()).map_err(|expected| EvalError::Arity {
            function: function.name().to_string(),
            expected,
            found: args.len(),
        })?;
        Ok(Expr::Call { function, args })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(value) => format!("number {value}"),
        Token::Text(text) => format!("string '{text}'"),
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Plus => "'+'".into(),
        Token::Minus => "'-'".into(),
        Token::Star => "'*'".into(),
        Token::StarStar => "'**'".into(),
        Token::Slash => "'/'".into(),
        Token::Percent => "'%'".into(),
        Token::Bang => "'!'".into(),
        Token::AndAnd => "'&&'".into(),
        Token::OrOr => "'||'".into(),
        Token::EqEq => "'=='".into(),
        Token::NotEq => "'!='".into(),
        Token::Lt => "'<'".into(),
        Token::Le => "'<='".into(),
        Token::Gt => "'>'".into(),
        Token::Ge => "'>='".into(),
        Token::Question => "'?'".into(),
        Token::Colon => "':'".into(),
        Token::Comma => "','".into(),
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
    }
}
