use super::token::*;

/// Splits bc source into lexemes. `first_line` is the line number of the
/// first character of `s`.
pub fn lex(s: &str, first_line: usize) -> Vec<Lexeme> {
    BcLexer::lex(s, first_line)
}

fn is_bc_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\x0c'
}

fn is_bc_digit(c: char) -> bool {
    c.is_ascii_digit() || ('A'..='F').contains(&c)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

struct BcLexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
}

impl<'a> BcLexer<'a> {
    fn lex(src: &'a str, first_line: usize) -> Vec<Lexeme> {
        let mut lexer = BcLexer {
            src,
            chars: src.char_indices().peekable(),
            line: first_line,
        };
        let mut v = vec![];
        while let Some(lexeme) = lexer.next() {
            let incomplete = lexeme.token == Token::Incomplete;
            v.push(lexeme);
            if incomplete {
                break;
            }
        }
        v
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn next(&mut self) -> Option<Lexeme> {
        loop {
            let (offset, ch) = *self.chars.peek()?;
            let line = self.line;
            if is_bc_whitespace(ch) {
                self.chars.next();
                continue;
            }
            if ch == '\\' && self.peek_second() == Some('\n') {
                self.chars.next();
                self.chars.next();
                self.line += 1;
                continue;
            }
            if ch == '#' {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
                continue;
            }
            if ch == '/' && self.peek_second() == Some('*') {
                match self.comment() {
                    Some(()) => continue,
                    None => return Some(self.lexeme(Token::Incomplete, line, offset)),
                }
            }
            let token = if ch == '\n' {
                self.chars.next();
                self.line += 1;
                Token::Newline
            } else if ch == '"' {
                self.string()
            } else if is_bc_digit(ch) || (ch == '.' && self.peek_second().map_or(false, is_bc_digit)) {
                self.number()
            } else if ch.is_ascii_lowercase() {
                self.alphabetic()
            } else if ch == '.' {
                self.chars.next();
                Token::Word(Word::Last)
            } else {
                self.operator()
            };
            return Some(self.lexeme(token, line, offset));
        }
    }

    fn lexeme(&self, token: Token, line: usize, offset: usize) -> Lexeme {
        Lexeme {
            token,
            line,
            offset,
        }
    }

    // Returns None when the comment is not closed.
    fn comment(&mut self) -> Option<()> {
        self.chars.next();
        self.chars.next();
        let mut star = false;
        loop {
            let (_, c) = self.chars.next()?;
            if c == '\n' {
                self.line += 1;
            }
            if star && c == '/' {
                return Some(());
            }
            star = c == '*';
        }
    }

    fn string(&mut self) -> Token {
        self.chars.next();
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None => return Token::Incomplete,
                Some((_, '"')) => return Token::String(s),
                Some((_, c)) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    s.push(c);
                }
            }
        }
    }

    fn number(&mut self) -> Token {
        let mut s = String::new();
        let mut decimal = false;
        while let Some(c) = self.peek_char() {
            if c == '\\' && self.peek_second() == Some('\n') {
                self.chars.next();
                self.chars.next();
                self.line += 1;
                continue;
            }
            if c == '.' {
                if decimal {
                    break;
                }
                decimal = true;
            } else if !is_bc_digit(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        Token::Number(s)
    }

    fn alphabetic(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if !is_ident_char(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        match Word::from_name(&s) {
            Some(word) => Token::Word(word),
            None => Token::Ident(s),
        }
    }

    fn operator(&mut self) -> Token {
        let (offset, ch) = match self.chars.next() {
            Some(pair) => pair,
            None => return Token::Unknown(String::new()),
        };
        match ch {
            '(' => return Token::LParen,
            ')' => return Token::RParen,
            '[' => return Token::LBracket,
            ']' => return Token::RBracket,
            '{' => return Token::LBrace,
            '}' => return Token::RBrace,
            ',' => return Token::Comma,
            ';' => return Token::Semicolon,
            _ => {}
        }
        if let Some(second) = self.peek_char() {
            let end = offset + ch.len_utf8() + second.len_utf8();
            if let Some(op) = self.src.get(offset..end).and_then(Operator::from_symbol) {
                self.chars.next();
                return Token::Operator(op);
            }
        }
        match Operator::from_symbol(&ch.to_string()) {
            Some(op) => Token::Operator(op),
            None => Token::Unknown(ch.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        lex(s, 1).into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn test_expression() {
        use Operator::*;
        assert_eq!(
            tokens("a+=b^2\n"),
            vec![
                Token::Ident("a".into()),
                Token::Operator(AddAssign),
                Token::Ident("b".into()),
                Token::Operator(Caret),
                Token::Number("2".into()),
                Token::Newline,
            ]
        );
        assert_eq!(
            tokens("x++<=y--"),
            vec![
                Token::Ident("x".into()),
                Token::Operator(Increment),
                Token::Operator(LessEqual),
                Token::Ident("y".into()),
                Token::Operator(Decrement),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("1.5 .25 FF 1.2.3"), vec![
            Token::Number("1.5".into()),
            Token::Number(".25".into()),
            Token::Number("FF".into()),
            Token::Number("1.2".into()),
            Token::Number(".3".into()),
        ]);
        assert_eq!(tokens("12\\\n34"), vec![Token::Number("1234".into())]);
    }

    #[test]
    fn test_words_and_last() {
        assert_eq!(
            tokens("define f() auto . scale"),
            vec![
                Token::Word(Word::Define),
                Token::Ident("f".into()),
                Token::LParen,
                Token::RParen,
                Token::Word(Word::Auto),
                Token::Word(Word::Last),
                Token::Word(Word::Scale),
            ]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let l = lex("a /* one\ntwo */ b # tail\nc", 1);
        assert_eq!(l.len(), 4);
        assert_eq!(l[0].line, 1);
        assert_eq!(l[1].token, Token::Ident("b".into()));
        assert_eq!(l[1].line, 2);
        assert_eq!(l[2].token, Token::Newline);
        assert_eq!(l[3].line, 3);
        assert_eq!(l[2].offset, 24);
        assert_eq!(l[3].offset, 25);
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(tokens("\"abc"), vec![Token::Incomplete]);
        assert_eq!(tokens("1 /* open"), vec![Token::Number("1".into()), Token::Incomplete]);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(tokens("G"), vec![Token::Unknown("G".into())]);
        assert_eq!(tokens("@"), vec![Token::Unknown("@".into())]);
        assert_eq!(tokens("&"), vec![Token::Unknown("&".into())]);
    }
}
