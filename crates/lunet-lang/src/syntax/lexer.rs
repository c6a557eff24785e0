use crate::error::{Error, ErrorCode};
use crate::syntax::token::{Token, TokenKind, keyword_or_name};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'^' => TokenKind::Caret,
            b'#' => TokenKind::Hash,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'-' => {
                if self.peek() == b'-' {
                    self.advance();
                    self.skip_comment(line, col)?;
                    return Ok(None);
                }
                TokenKind::Minus
            }
            b'.' => {
                if self.peek() == b'.' { self.advance(); TokenKind::Concat }
                else if self.peek().is_ascii_digit() { self.read_number(ch) }
                else { TokenKind::Dot }
            }
            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Assign }
            }
            b'~' => {
                if self.peek() == b'=' { self.advance(); TokenKind::TildeEq }
                else {
                    return Err(Error::new(ErrorCode::L001, line, col,
                        "expected `~=`, bare `~` is not valid"));
                }
            }
            b'<' => {
                if self.peek() == b'=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            b'>' => {
                if self.peek() == b'=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }

            b'"' | b'\'' => TokenKind::StringLit(self.read_string(ch, line, col)?),
            b'0'..=b'9' => self.read_number(ch),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => keyword_or_name(self.read_name(ch)),

            other => {
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    /// Called after `--`. `--[[ ... ]]` is a block comment, anything else runs to end of line.
    fn skip_comment(&mut self, start_line: usize, start_col: usize) -> Result<(), Error> {
        if self.peek() == b'[' && self.peek_next() == b'[' {
            self.advance(); // [
            self.advance(); // [
            while !self.is_at_end() {
                if self.peek() == b']' && self.peek_next() == b']' {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                self.advance();
            }
            return Err(Error::new(ErrorCode::L004, start_line, start_col,
                "unterminated block comment"));
        }
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
        Ok(())
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_string(&mut self, quote: u8, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let mut error: Option<Error> = None;
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let ch = self.advance();
            if ch == quote { break; }
            if ch == b'\\' {
                let esc_line = self.line;
                let esc_col  = self.column;
                if self.is_at_end() { continue; }
                match self.advance() {
                    b'n'  => bytes.push(b'\n'),
                    b't'  => bytes.push(b'\t'),
                    b'r'  => bytes.push(b'\r'),
                    b'0'  => bytes.push(0),
                    b'"'  => bytes.push(b'"'),
                    b'\'' => bytes.push(b'\''),
                    b'\\' => bytes.push(b'\\'),
                    other => {
                        // Keep consuming so the rest of the string doesn't cascade into errors.
                        if error.is_none() {
                            error = Some(Error::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{}`", other as char)));
                        }
                    }
                }
            } else {
                bytes.push(ch);
            }
        }
        if let Some(e) = error { return Err(e); }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Integer or float literal text. `first` is either a digit or the `.` of `.5`.
    fn read_number(&mut self, first: u8) -> TokenKind {
        let mut s = String::new();
        s.push(first as char);
        let mut is_float = first == b'.';
        self.read_digits(&mut s);

        // `1..2` is `1` concatenated with `2`, not a malformed float
        if !is_float && self.peek() == b'.' && self.peek_next() != b'.' {
            is_float = true;
            s.push(self.advance() as char);
            self.read_digits(&mut s);
        }

        if matches!(self.peek(), b'e' | b'E') {
            let next = self.peek_next();
            let signed = matches!(next, b'+' | b'-')
                && self.source.get(self.pos + 2).is_some_and(|b| b.is_ascii_digit());
            if next.is_ascii_digit() || signed {
                is_float = true;
                s.push(self.advance() as char);
                if signed { s.push(self.advance() as char); }
                self.read_digits(&mut s);
            }
        }

        if is_float { TokenKind::Float(s) } else { TokenKind::Int(s) }
    }

    fn read_digits(&mut self, s: &mut String) {
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
    }

    fn read_name(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            s.push(self.advance() as char);
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<Error> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    fn name(s: &str) -> TokenKind { TokenKind::Name(s.into()) }
    fn int(s: &str) -> TokenKind { TokenKind::Int(s.into()) }
    fn float(s: &str) -> TokenKind { TokenKind::Float(s.into()) }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn integer_keeps_text() {
        assert_eq!(lex("42"), vec![int("42"), TokenKind::Eof]);
    }

    #[test]
    fn float_literals() {
        assert_eq!(lex("3.14"), vec![float("3.14"), TokenKind::Eof]);
        assert_eq!(lex(".5"), vec![float(".5"), TokenKind::Eof]);
        assert_eq!(lex("1e3"), vec![float("1e3"), TokenKind::Eof]);
        assert_eq!(lex("2.5E-2"), vec![float("2.5E-2"), TokenKind::Eof]);
    }

    #[test]
    fn concat_between_numbers_is_not_a_decimal_point() {
        assert_eq!(lex("1..2"), vec![int("1"), TokenKind::Concat, int("2"), TokenKind::Eof]);
    }

    #[test]
    fn field_access() {
        assert_eq!(lex("t.x"), vec![name("t"), TokenKind::Dot, name("x"), TokenKind::Eof]);
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("function"), vec![TokenKind::Function, TokenKind::Eof]);
        assert_eq!(lex("local"),    vec![TokenKind::Local,    TokenKind::Eof]);
        assert_eq!(lex("elseif"),   vec![TokenKind::Elseif,   TokenKind::Eof]);
        assert_eq!(lex("repeat"),   vec![TokenKind::Repeat,   TokenKind::Eof]);
        assert_eq!(lex("until"),    vec![TokenKind::Until,    TokenKind::Eof]);
        assert_eq!(lex("nil"),      vec![TokenKind::Nil,      TokenKind::Eof]);
        assert_eq!(lex("print"),    vec![name("print"),       TokenKind::Eof]);
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(lex("=="), vec![TokenKind::EqEq,    TokenKind::Eof]);
        assert_eq!(lex("~="), vec![TokenKind::TildeEq, TokenKind::Eof]);
        assert_eq!(lex("<="), vec![TokenKind::LtEq,    TokenKind::Eof]);
        assert_eq!(lex(">="), vec![TokenKind::GtEq,    TokenKind::Eof]);
        assert_eq!(lex(".."), vec![TokenKind::Concat,  TokenKind::Eof]);
    }

    #[test]
    fn line_comment_skipped() {
        assert_eq!(lex("-- comment\n42"), vec![int("42"), TokenKind::Eof]);
    }

    #[test]
    fn block_comment_skipped() {
        assert_eq!(lex("--[[ a\nb ]]42"), vec![int("42"), TokenKind::Eof]);
    }

    #[test]
    fn minus_is_not_a_comment() {
        assert_eq!(lex("a - b"), vec![name("a"), TokenKind::Minus, name("b"), TokenKind::Eof]);
    }

    #[test]
    fn string_literals_both_quotes() {
        assert_eq!(lex(r#""hello""#), vec![TokenKind::StringLit("hello".into()), TokenKind::Eof]);
        assert_eq!(lex("'it''s'"), vec![
            TokenKind::StringLit("it".into()), TokenKind::StringLit("s".into()), TokenKind::Eof,
        ]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(lex(r#""a\tb\n""#), vec![TokenKind::StringLit("a\tb\n".into()), TokenKind::Eof]);
        assert_eq!(lex(r"'don\'t'"), vec![TokenKind::StringLit("don't".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_keeps_utf8() {
        assert_eq!(lex("\"żółw\""), vec![TokenKind::StringLit("żółw".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_error() {
        let errs = lex_err(r#""oops"#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L002);
    }

    #[test]
    fn invalid_escape_error() {
        let errs = lex_err(r#""\q""#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L003);
    }

    #[test]
    fn unterminated_block_comment_error() {
        let errs = lex_err("--[[ never closed");
        assert_eq!(errs[0].code, ErrorCode::L004);
    }

    #[test]
    fn bare_tilde_error() {
        let errs = lex_err("~");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L001);
    }

    #[test]
    fn errors_are_collected() {
        let errs = lex_err("@ x $");
        assert_eq!(errs.len(), 2);
        assert_eq!((errs[1].line, errs[1].column), (1, 5));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn numeric_for_header() {
        assert_eq!(
            lex("for i = 1, 10, -2 do"),
            vec![
                TokenKind::For, name("i"), TokenKind::Assign,
                int("1"), TokenKind::Comma, int("10"), TokenKind::Comma,
                TokenKind::Minus, int("2"), TokenKind::Do, TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn token_kind_helpers() {
        assert!(TokenKind::Caret.is_arithmetic());
        assert!(TokenKind::TildeEq.is_comparison());
        assert!(TokenKind::Nil.is_literal());
        assert!(TokenKind::Until.is_block_end());
        assert!(TokenKind::Local.starts_statement());
        assert!(!name("x").starts_statement());
    }
}
