use super::{ast::*, token::*, Error};

/// Why parsing of an item stopped early.
enum Stop {
    Incomplete,
    Quit,
    Error(Error),
}

impl From<Error> for Stop {
    fn from(e: Error) -> Self {
        Stop::Error(e)
    }
}

type Result<T> = std::result::Result<T, Stop>;

/// Parses lexemes into top level items. Parsing ends at the first `quit`
/// or at input that needs more lines to complete.
pub fn parse(lexemes: &[Lexeme]) -> Vec<Parsed> {
    Parser::parse(lexemes)
}

struct Parser<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
    notices: Vec<Error>,
}

impl<'a> Parser<'a> {
    fn parse(lexemes: &'a [Lexeme]) -> Vec<Parsed> {
        let mut parser = Parser {
            lexemes,
            pos: 0,
            notices: vec![],
        };
        let mut v = vec![];
        loop {
            while parser.peek() == Some(&Token::Newline) {
                parser.next();
            }
            let start = match parser.lexemes.get(parser.pos) {
                Some(lexeme) => (lexeme.offset, lexeme.line),
                None => return v,
            };
            parser.notices.clear();
            match parser.item() {
                Ok(unit) => v.push(Parsed::Unit(unit, std::mem::take(&mut parser.notices))),
                Err(Stop::Quit) => {
                    v.push(Parsed::Quit);
                    return v;
                }
                Err(Stop::Incomplete) => {
                    v.push(Parsed::Incomplete(start.0, start.1));
                    return v;
                }
                Err(Stop::Error(e)) => {
                    v.push(Parsed::Error(e));
                    if !parser.recover() {
                        return v;
                    }
                }
            }
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.lexemes.get(self.pos).map(|l| &l.token)
    }

    fn peek_second(&self) -> Option<&'a Token> {
        self.lexemes.get(self.pos + 1).map(|l| &l.token)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let t = self.peek();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn line(&self) -> usize {
        match self.lexemes.get(self.pos) {
            Some(l) => l.line,
            None => self.lexemes.last().map_or(1, |l| l.line),
        }
    }

    /// Skips past the next newline. Returns false if input ran out first.
    fn recover(&mut self) -> bool {
        loop {
            match self.next() {
                Some(Token::Newline) => return true,
                Some(_) => continue,
                None => return false,
            }
        }
    }

    fn syntax_error(&self) -> Stop {
        match self.peek() {
            None | Some(Token::Incomplete) => Stop::Incomplete,
            Some(Token::Unknown(s)) => {
                Stop::Error(error!(SyntaxError, self.line(); format!("illegal character: {}", s)))
            }
            Some(Token::Word(Word::Quit)) => Stop::Quit,
            Some(_) => Stop::Error(error!(SyntaxError, self.line())),
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.peek() == Some(&token) {
            self.next();
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn notice(&mut self, message: &str) {
        let line = self.line();
        self.notices.push(error!(NotStandard, line; message));
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.next();
        }
    }

    fn item(&mut self) -> Result<Unit> {
        if self.peek() == Some(&Token::Word(Word::Define)) {
            let define = self.define()?;
            return Ok(Unit::Define(define));
        }
        let mut statements = vec![];
        loop {
            match self.peek() {
                Some(Token::Newline) => {
                    self.next();
                    return Ok(Unit::Statements(statements));
                }
                Some(Token::Semicolon) => {
                    self.next();
                    continue;
                }
                _ => {}
            }
            statements.push(self.statement()?);
            match self.peek() {
                Some(Token::Newline) | Some(Token::Semicolon) => {}
                _ => return Err(self.syntax_error()),
            }
        }
    }

    fn define(&mut self) -> Result<Define> {
        let line = self.line();
        self.next();
        let name = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(self.syntax_error()),
        };
        self.next();
        self.multi_letter(&name);
        self.expect(Token::LParen)?;
        let params = self.declarations(Token::RParen)?;
        self.expect(Token::RParen)?;
        if params.iter().any(|p| matches!(p, Declared::Array(_))) {
            self.notice("Array parameter");
        }
        self.skip_newlines();
        self.expect(Token::LBrace)?;
        self.skip_newlines();
        let mut autos = vec![];
        if self.peek() == Some(&Token::Word(Word::Auto)) {
            self.next();
            autos = self.declarations(Token::Semicolon)?;
            match self.peek() {
                Some(Token::Semicolon) | Some(Token::Newline) => {
                    self.next();
                }
                _ => return Err(self.syntax_error()),
            }
        }
        let body = self.statement_list()?;
        self.expect(Token::RBrace)?;
        Ok(Define {
            line,
            name,
            params,
            autos,
            body,
        })
    }

    // Comma separated `name` or `name[]`, possibly empty when `close`
    // follows immediately.
    fn declarations(&mut self, close: Token) -> Result<Vec<Declared>> {
        let mut v = vec![];
        if self.peek() == Some(&close) {
            return Ok(v);
        }
        loop {
            let name = match self.peek() {
                Some(Token::Ident(name)) => name.clone(),
                _ => return Err(self.syntax_error()),
            };
            self.next();
            self.multi_letter(&name);
            if self.peek() == Some(&Token::LBracket) {
                self.next();
                self.expect(Token::RBracket)?;
                v.push(Declared::Array(name));
            } else {
                v.push(Declared::Scalar(name));
            }
            if self.peek() == Some(&Token::Comma) {
                self.next();
                continue;
            }
            return Ok(v);
        }
    }

    // Statements up to a closing brace, separated by newlines or semicolons.
    fn statement_list(&mut self) -> Result<Vec<Statement>> {
        let mut v = vec![];
        loop {
            match self.peek() {
                Some(Token::Newline) | Some(Token::Semicolon) => {
                    self.next();
                    continue;
                }
                Some(Token::RBrace) => return Ok(v),
                None | Some(Token::Incomplete) => return Err(Stop::Incomplete),
                _ => {}
            }
            v.push(self.statement()?);
            match self.peek() {
                Some(Token::Newline) | Some(Token::Semicolon) | Some(Token::RBrace) => {}
                _ => return Err(self.syntax_error()),
            }
        }
    }

    fn statement(&mut self) -> Result<Statement> {
        let line = self.line();
        match self.peek() {
            Some(Token::String(s)) => {
                self.next();
                Ok(Statement::String(line, s.clone()))
            }
            Some(Token::LBrace) => {
                self.next();
                let list = self.statement_list()?;
                self.expect(Token::RBrace)?;
                Ok(Statement::Block(line, list))
            }
            Some(Token::Semicolon) => Ok(Statement::Empty(line)),
            Some(Token::Word(word)) => match word {
                Word::If => self.r#if(line),
                Word::While => self.r#while(line),
                Word::For => self.r#for(line),
                Word::Print => self.print(line),
                Word::Break => {
                    self.next();
                    Ok(Statement::Break(line))
                }
                Word::Continue => {
                    self.next();
                    Ok(Statement::Continue(line))
                }
                Word::Halt => {
                    self.next();
                    self.notice("halt statement");
                    Ok(Statement::Halt(line))
                }
                Word::Limits => {
                    self.next();
                    self.notice("limits statement");
                    Ok(Statement::Limits(line))
                }
                Word::Quit => Err(Stop::Quit),
                Word::Return => self.r#return(line),
                _ => Ok(Statement::Expression(line, self.expression()?)),
            },
            _ => Ok(Statement::Expression(line, self.expression()?)),
        }
    }

    fn condition(&mut self) -> Result<Expression> {
        self.expect(Token::LParen)?;
        let expr = self.expression()?;
        self.expect(Token::RParen)?;
        Ok(expr)
    }

    fn body(&mut self) -> Result<Statement> {
        self.skip_newlines();
        self.statement()
    }

    fn r#if(&mut self, line: usize) -> Result<Statement> {
        self.next();
        let cond = self.condition()?;
        let then = Box::new(self.body()?);
        let mut otherwise = None;
        if self.peek() == Some(&Token::Word(Word::Else)) {
            self.notice("else clause in if statement");
            self.next();
            otherwise = Some(Box::new(self.body()?));
        }
        Ok(Statement::If(line, cond, then, otherwise))
    }

    fn r#while(&mut self, line: usize) -> Result<Statement> {
        self.next();
        let cond = self.condition()?;
        let body = Box::new(self.body()?);
        Ok(Statement::While(line, cond, body))
    }

    fn r#for(&mut self, line: usize) -> Result<Statement> {
        self.next();
        self.expect(Token::LParen)?;
        let init = self.optional_expression(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;
        let cond = self.optional_expression(&Token::Semicolon)?;
        self.expect(Token::Semicolon)?;
        let step = self.optional_expression(&Token::RParen)?;
        self.expect(Token::RParen)?;
        let body = Box::new(self.body()?);
        Ok(Statement::For(line, init, cond, step, body))
    }

    fn optional_expression(&mut self, end: &Token) -> Result<Option<Expression>> {
        if self.peek() == Some(end) {
            Ok(None)
        } else {
            Ok(Some(self.expression()?))
        }
    }

    fn r#return(&mut self, line: usize) -> Result<Statement> {
        self.next();
        match self.peek() {
            None
            | Some(Token::Newline)
            | Some(Token::Semicolon)
            | Some(Token::RBrace)
            | Some(Token::Word(Word::Else)) => Ok(Statement::Return(line, None)),
            _ => Ok(Statement::Return(line, Some(self.expression()?))),
        }
    }

    fn print(&mut self, line: usize) -> Result<Statement> {
        self.next();
        self.notice("print statement");
        let mut items = vec![];
        loop {
            match self.peek() {
                Some(Token::String(s)) => {
                    self.next();
                    items.push(PrintItem::String(s.clone()));
                }
                _ => items.push(PrintItem::Expression(self.expression()?)),
            }
            if self.peek() == Some(&Token::Comma) {
                self.next();
                continue;
            }
            return Ok(Statement::Print(line, items));
        }
    }

    fn multi_letter(&mut self, name: &str) {
        if name.len() > 1 {
            self.notice(&format!("multiple letter name - {}", name));
        }
    }

    fn expression(&mut self) -> Result<Expression> {
        let mut lhs = self.and_expression()?;
        while self.peek() == Some(&Token::Operator(Operator::Or)) {
            self.next();
            self.notice("|| operator");
            let rhs = self.and_expression()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expression(&mut self) -> Result<Expression> {
        let mut lhs = self.not_expression()?;
        while self.peek() == Some(&Token::Operator(Operator::And)) {
            self.next();
            self.notice("&& operator");
            let rhs = self.not_expression()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expression(&mut self) -> Result<Expression> {
        if self.peek() == Some(&Token::Operator(Operator::Not)) {
            self.next();
            self.notice("! operator");
            let expr = self.not_expression()?;
            return Ok(Expression::Not(Box::new(expr)));
        }
        self.relational()
    }

    fn relational(&mut self) -> Result<Expression> {
        let mut lhs = self.assignment()?;
        while let Some(Token::Operator(op)) = self.peek() {
            if !op.is_relational() {
                break;
            }
            self.next();
            let rhs = self.assignment()?;
            lhs = self.binary(*op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn binary(&self, op: Operator, lhs: Expression, rhs: Expression) -> Result<Expression> {
        match Expression::for_binary_op(op, lhs, rhs) {
            Some(expr) => Ok(expr),
            None => Err(Stop::Error(error!(SyntaxError, self.line()))),
        }
    }

    fn assignment(&mut self) -> Result<Expression> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::Operator(op)) if op.is_assignment() => *op,
            _ => return Ok(lhs),
        };
        let var = match lhs {
            Expression::Variable(var) => var,
            _ => return Err(self.syntax_error()),
        };
        self.next();
        let rhs = self.assignment()?;
        let arith = match op {
            Operator::AddAssign => Some(Operator::Plus),
            Operator::SubAssign => Some(Operator::Minus),
            Operator::MulAssign => Some(Operator::Multiply),
            Operator::DivAssign => Some(Operator::Divide),
            Operator::ModAssign => Some(Operator::Modulo),
            Operator::PowAssign => Some(Operator::Caret),
            _ => None,
        };
        Ok(Expression::Assign(var, arith, Box::new(rhs)))
    }

    fn additive(&mut self) -> Result<Expression> {
        let mut lhs = self.multiplicative()?;
        while let Some(Token::Operator(op @ (Operator::Plus | Operator::Minus))) = self.peek() {
            self.next();
            let rhs = self.multiplicative()?;
            lhs = self.binary(*op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expression> {
        let mut lhs = self.power()?;
        while let Some(Token::Operator(
            op @ (Operator::Multiply | Operator::Divide | Operator::Modulo),
        )) = self.peek()
        {
            self.next();
            let rhs = self.power()?;
            lhs = self.binary(*op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn power(&mut self) -> Result<Expression> {
        let base = self.unary()?;
        if self.peek() == Some(&Token::Operator(Operator::Caret)) {
            self.next();
            let exponent = self.power()?;
            return Ok(Expression::Power(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<Expression> {
        match self.peek() {
            Some(Token::Operator(Operator::Minus)) => {
                self.next();
                let expr = self.unary()?;
                Ok(Expression::Negation(Box::new(expr)))
            }
            Some(Token::Operator(Operator::Not)) => self.not_expression(),
            Some(Token::Operator(op @ (Operator::Increment | Operator::Decrement))) => {
                self.next();
                let var = self.variable()?;
                Ok(match op {
                    Operator::Increment => Expression::PreIncrement(var),
                    _ => Expression::PreDecrement(var),
                })
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expression> {
        let expr = self.primary()?;
        if let Expression::Variable(var) = &expr {
            match self.peek() {
                Some(Token::Operator(Operator::Increment)) => {
                    self.next();
                    return Ok(Expression::PostIncrement(var.clone()));
                }
                Some(Token::Operator(Operator::Decrement)) => {
                    self.next();
                    return Ok(Expression::PostDecrement(var.clone()));
                }
                _ => {}
            }
        }
        Ok(expr)
    }

    fn variable(&mut self) -> Result<Variable> {
        match self.primary()? {
            Expression::Variable(var) => Ok(var),
            _ => Err(Stop::Error(error!(SyntaxError, self.line()))),
        }
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = match self.peek() {
            Some(t) => t,
            None => return Err(Stop::Incomplete),
        };
        match token {
            Token::Number(n) => {
                self.next();
                Ok(Expression::Number(n.clone()))
            }
            Token::LParen => {
                self.next();
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Paren(Box::new(expr)))
            }
            Token::Ident(name) => {
                self.next();
                self.multi_letter(name);
                match self.peek() {
                    Some(Token::LParen) => {
                        self.next();
                        let args = self.arguments()?;
                        Ok(Expression::Call(name.clone(), args))
                    }
                    Some(Token::LBracket) => {
                        self.next();
                        let index = self.expression()?;
                        self.expect(Token::RBracket)?;
                        Ok(Expression::Variable(Variable::Array(
                            name.clone(),
                            Box::new(index),
                        )))
                    }
                    _ => Ok(Expression::Variable(Variable::Scalar(name.clone()))),
                }
            }
            Token::Word(Word::Ibase) => {
                self.next();
                Ok(Expression::Variable(Variable::Ibase))
            }
            Token::Word(Word::Obase) => {
                self.next();
                Ok(Expression::Variable(Variable::Obase))
            }
            Token::Word(Word::Last) => {
                self.next();
                self.notice("Last variable");
                Ok(Expression::Variable(Variable::Last))
            }
            Token::Word(Word::Scale) => {
                self.next();
                if self.peek() == Some(&Token::LParen) {
                    let expr = self.condition()?;
                    Ok(Expression::Scale(Box::new(expr)))
                } else {
                    Ok(Expression::Variable(Variable::Scale))
                }
            }
            Token::Word(Word::Length) => {
                self.next();
                let expr = self.condition()?;
                Ok(Expression::Length(Box::new(expr)))
            }
            Token::Word(Word::Sqrt) => {
                self.next();
                let expr = self.condition()?;
                Ok(Expression::Sqrt(Box::new(expr)))
            }
            _ => Err(self.syntax_error()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Argument>> {
        let mut v = vec![];
        if self.peek() == Some(&Token::RParen) {
            self.next();
            return Ok(v);
        }
        loop {
            let array = match (self.peek(), self.peek_second()) {
                (Some(Token::Ident(name)), Some(Token::LBracket)) => {
                    match self.lexemes.get(self.pos + 2).map(|l| &l.token) {
                        Some(Token::RBracket) => Some(name.clone()),
                        _ => None,
                    }
                }
                _ => None,
            };
            match array {
                Some(name) => {
                    self.pos += 3;
                    self.multi_letter(&name);
                    v.push(Argument::Array(name));
                }
                None => v.push(Argument::Value(self.expression()?)),
            }
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                }
                Some(Token::RParen) => {
                    self.next();
                    return Ok(v);
                }
                _ => return Err(self.syntax_error()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::lex;

    fn parse_str(s: &str) -> Vec<Parsed> {
        parse(&lex(s, 1))
    }

    fn statements(s: &str) -> Vec<Statement> {
        match parse_str(s).pop() {
            Some(Parsed::Unit(Unit::Statements(v), _)) => v,
            other => panic!("{:?}", other),
        }
    }

    fn num(s: &str) -> Box<Expression> {
        Box::new(Expression::Number(s.into()))
    }

    fn var(s: &str) -> Variable {
        Variable::Scalar(s.into())
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            statements("1+2*3^4^5\n"),
            vec![Statement::Expression(
                1,
                Expression::Add(
                    num("1"),
                    Box::new(Expression::Multiply(
                        num("2"),
                        Box::new(Expression::Power(
                            num("3"),
                            Box::new(Expression::Power(num("4"), num("5")))
                        ))
                    ))
                )
            )]
        );
        assert_eq!(
            statements("-2^2\n"),
            vec![Statement::Expression(
                1,
                Expression::Power(Box::new(Expression::Negation(num("2"))), num("2"))
            )]
        );
    }

    #[test]
    fn test_assignment_binds_tighter_than_relation() {
        assert_eq!(
            statements("a=b<c\n"),
            vec![Statement::Expression(
                1,
                Expression::Less(
                    Box::new(Expression::Assign(
                        var("a"),
                        None,
                        Box::new(Expression::Variable(var("b")))
                    )),
                    Box::new(Expression::Variable(var("c")))
                )
            )]
        );
        assert_eq!(
            statements("a+=b=2\n"),
            vec![Statement::Expression(
                1,
                Expression::Assign(
                    var("a"),
                    Some(Operator::Plus),
                    Box::new(Expression::Assign(var("b"), None, num("2")))
                )
            )]
        );
    }

    #[test]
    fn test_units_per_line() {
        let p = parse_str("a=1;b=2\nc\n\n");
        assert_eq!(p.len(), 2);
        assert!(matches!(&p[0], Parsed::Unit(Unit::Statements(v), _) if v.len() == 2));
        assert!(matches!(&p[1], Parsed::Unit(Unit::Statements(v), _) if v.len() == 1));
    }

    #[test]
    fn test_incomplete_block() {
        let p = parse_str("1\nwhile (i < 3) {\n i\n");
        assert_eq!(p.len(), 2);
        assert_eq!(p[1], Parsed::Incomplete(2, 2));
    }

    #[test]
    fn test_define() {
        let p = parse_str("define f(n, a[]) {\n auto x, y[]\n return (n)\n}\n");
        match &p[0] {
            Parsed::Unit(Unit::Define(d), notices) => {
                assert_eq!(d.name, "f");
                assert_eq!(
                    d.params,
                    vec![Declared::Scalar("n".into()), Declared::Array("a".into())]
                );
                assert_eq!(
                    d.autos,
                    vec![Declared::Scalar("x".into()), Declared::Array("y".into())]
                );
                assert_eq!(d.body.len(), 1);
                assert_eq!(notices.len(), 1);
                assert_eq!(notices[0].text(), "Array parameter");
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_recovers_at_newline() {
        let p = parse_str("1 +* 2\n3\n");
        assert_eq!(p.len(), 2);
        match &p[0] {
            Parsed::Error(e) => assert_eq!(e.to_string(), "(standard_in) 1: syntax error"),
            other => panic!("{:?}", other),
        }
        assert!(matches!(&p[1], Parsed::Unit(..)));
    }

    #[test]
    fn test_quit_stops_parsing() {
        let p = parse_str("1\nif (0) quit\n2\n");
        assert_eq!(p.len(), 2);
        assert_eq!(p[1], Parsed::Quit);
    }

    #[test]
    fn test_else_same_line() {
        let s = statements("if (a) b else c\n");
        assert!(matches!(&s[0], Statement::If(_, _, _, Some(_))));
        let p = parse_str("if (a) b\nelse c\n");
        assert!(matches!(&p[1], Parsed::Error(_)));
    }

    #[test]
    fn test_notices() {
        match &parse_str("abc = last && !x\n")[0] {
            Parsed::Unit(_, notices) => {
                let texts: Vec<&str> = notices.iter().map(|n| n.text()).collect();
                assert_eq!(
                    texts,
                    vec!["multiple letter name - abc", "Last variable", "&& operator", "! operator"]
                );
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            statements("f(1, a[], b[2])\n"),
            vec![Statement::Expression(
                1,
                Expression::Call(
                    "f".into(),
                    vec![
                        Argument::Value(Expression::Number("1".into())),
                        Argument::Array("a".into()),
                        Argument::Value(Expression::Variable(Variable::Array(
                            "b".into(),
                            num("2")
                        ))),
                    ]
                )
            )]
        );
    }
}
