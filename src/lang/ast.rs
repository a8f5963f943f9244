use super::token::Operator;
use super::Error;

/// One top level item of bc input. Statements on a line are a unit of
/// execution; a function definition is compiled on its own.
#[derive(Debug, PartialEq)]
pub enum Unit {
    Statements(Vec<Statement>),
    Define(Define),
}

/// What the parser produced for one input item.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    /// A complete unit and the portability notices found in it.
    Unit(Unit, Vec<Error>),
    Error(Error),
    /// `quit` was read; nothing after it is looked at.
    Quit,
    /// Input ran out inside an item that starts at this byte offset and
    /// source line.
    Incomplete(usize, usize),
}

#[derive(Debug, PartialEq)]
pub struct Define {
    pub line: usize,
    pub name: String,
    pub params: Vec<Declared>,
    pub autos: Vec<Declared>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Declared {
    Scalar(String),
    Array(String),
}

impl Declared {
    pub fn name(&self) -> &str {
        match self {
            Declared::Scalar(s) | Declared::Array(s) => s,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Expression(usize, Expression),
    String(usize, String),
    Print(usize, Vec<PrintItem>),
    Block(usize, Vec<Statement>),
    If(usize, Expression, Box<Statement>, Option<Box<Statement>>),
    While(usize, Expression, Box<Statement>),
    For(
        usize,
        Option<Expression>,
        Option<Expression>,
        Option<Expression>,
        Box<Statement>,
    ),
    Break(usize),
    Continue(usize),
    Return(usize, Option<Expression>),
    Halt(usize),
    Limits(usize),
    Empty(usize),
}

impl Statement {
    pub fn line(&self) -> usize {
        match self {
            Statement::Expression(l, ..)
            | Statement::String(l, ..)
            | Statement::Print(l, ..)
            | Statement::Block(l, ..)
            | Statement::If(l, ..)
            | Statement::While(l, ..)
            | Statement::For(l, ..)
            | Statement::Break(l)
            | Statement::Continue(l)
            | Statement::Return(l, ..)
            | Statement::Halt(l)
            | Statement::Limits(l)
            | Statement::Empty(l) => *l,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PrintItem {
    String(String),
    Expression(Expression),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Variable {
    Scalar(String),
    Array(String, Box<Expression>),
    Ibase,
    Obase,
    Scale,
    Last,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Argument {
    Value(Expression),
    Array(String),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Number(String),
    Variable(Variable),
    Paren(Box<Expression>),
    Call(String, Vec<Argument>),
    Length(Box<Expression>),
    Scale(Box<Expression>),
    Sqrt(Box<Expression>),
    Negation(Box<Expression>),
    Not(Box<Expression>),
    Power(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Modulo(Box<Expression>, Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    Less(Box<Expression>, Box<Expression>),
    LessEqual(Box<Expression>, Box<Expression>),
    Greater(Box<Expression>, Box<Expression>),
    GreaterEqual(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    /// The operator is `None` for plain `=`, else the arithmetic operator
    /// of a compound assignment.
    Assign(Variable, Option<Operator>, Box<Expression>),
    PreIncrement(Variable),
    PreDecrement(Variable),
    PostIncrement(Variable),
    PostDecrement(Variable),
}

impl Expression {
    pub fn is_assignment(&self) -> bool {
        matches!(self, Expression::Assign(..))
    }

    pub fn for_binary_op(op: Operator, lhs: Expression, rhs: Expression) -> Option<Expression> {
        use Expression::*;
        let (l, r) = (Box::new(lhs), Box::new(rhs));
        Some(match op {
            Operator::Caret => Power(l, r),
            Operator::Multiply => Multiply(l, r),
            Operator::Divide => Divide(l, r),
            Operator::Modulo => Modulo(l, r),
            Operator::Plus => Add(l, r),
            Operator::Minus => Subtract(l, r),
            Operator::Equal => Equal(l, r),
            Operator::NotEqual => NotEqual(l, r),
            Operator::Less => Less(l, r),
            Operator::LessEqual => LessEqual(l, r),
            Operator::Greater => Greater(l, r),
            Operator::GreaterEqual => GreaterEqual(l, r),
            Operator::And => And(l, r),
            Operator::Or => Or(l, r),
            _ => return None,
        })
    }
}
