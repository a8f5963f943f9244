#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Unknown(String),
    /// Unterminated string or comment at end of input.
    Incomplete,
    Number(String),
    String(String),
    Ident(String),
    Word(Word),
    Operator(Operator),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Newline,
}

/// A token with the line it starts on and its byte offset in the source.
#[derive(Debug, PartialEq, Clone)]
pub struct Lexeme {
    pub token: Token,
    pub line: usize,
    pub offset: usize,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Unknown(s) => write!(f, "{}", s),
            Incomplete => write!(f, ""),
            Number(s) => write!(f, "{}", s),
            String(s) => write!(f, "\"{}\"", s),
            Ident(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Comma => write!(f, ","),
            Semicolon => write!(f, ";"),
            Newline => writeln!(f),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Word {
    Auto,
    Break,
    Continue,
    Define,
    Else,
    For,
    Halt,
    Ibase,
    If,
    Last,
    Length,
    Limits,
    Obase,
    Print,
    Quit,
    Return,
    Scale,
    Sqrt,
    While,
}

impl Word {
    pub fn from_name(s: &str) -> Option<Word> {
        use Word::*;
        Some(match s {
            "auto" => Auto,
            "break" => Break,
            "continue" => Continue,
            "define" => Define,
            "else" => Else,
            "for" => For,
            "halt" => Halt,
            "ibase" => Ibase,
            "if" => If,
            "last" => Last,
            "length" => Length,
            "limits" => Limits,
            "obase" => Obase,
            "print" => Print,
            "quit" => Quit,
            "return" => Return,
            "scale" => Scale,
            "sqrt" => Sqrt,
            "while" => While,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        let s = match self {
            Auto => "auto",
            Break => "break",
            Continue => "continue",
            Define => "define",
            Else => "else",
            For => "for",
            Halt => "halt",
            Ibase => "ibase",
            If => "if",
            Last => "last",
            Length => "length",
            Limits => "limits",
            Obase => "obase",
            Print => "print",
            Quit => "quit",
            Return => "return",
            Scale => "scale",
            Sqrt => "sqrt",
            While => "while",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Caret,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    Increment,
    Decrement,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
}

impl Operator {
    pub fn from_symbol(s: &str) -> Option<Operator> {
        use Operator::*;
        Some(match s {
            "+" => Plus,
            "-" => Minus,
            "*" => Multiply,
            "/" => Divide,
            "%" => Modulo,
            "^" => Caret,
            "=" => Assign,
            "+=" => AddAssign,
            "-=" => SubAssign,
            "*=" => MulAssign,
            "/=" => DivAssign,
            "%=" => ModAssign,
            "^=" => PowAssign,
            "++" => Increment,
            "--" => Decrement,
            "==" => Equal,
            "!=" => NotEqual,
            "<" => Less,
            "<=" => LessEqual,
            ">" => Greater,
            ">=" => GreaterEqual,
            "!" => Not,
            "&&" => And,
            "||" => Or,
            _ => return None,
        })
    }

    pub fn is_assignment(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Assign | AddAssign | SubAssign | MulAssign | DivAssign | ModAssign | PowAssign
        )
    }

    pub fn is_relational(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        let s = match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Caret => "^",
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            PowAssign => "^=",
            Increment => "++",
            Decrement => "--",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "!",
            And => "&&",
            Or => "||",
        };
        write!(f, "{}", s)
    }
}
