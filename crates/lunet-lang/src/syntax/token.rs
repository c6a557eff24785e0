#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals. Numbers keep their source text; conversion happens at evaluation.
    Int(String),
    Float(String),
    Name(String),
    StringLit(String),

    // Keywords
    And,
    Break,
    Do,
    Else,
    Elseif,
    End,
    False,
    For,
    Function,
    If,
    In,
    Local,
    Nil,
    Not,
    Or,
    Repeat,
    Return,
    Then,
    True,
    Until,
    While,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Caret,      // ^
    Hash,       // #
    Concat,     // ..
    Assign,     // =
    EqEq,       // ==
    TildeEq,    // ~=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    // Punctuation
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Float(_) | Self::StringLit(_) | Self::Nil | Self::True | Self::False
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus | Self::Star | Self::Slash | Self::Percent | Self::Caret)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::EqEq | Self::TildeEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }

    /// Tokens that close a block. A block's statement list stops at any of these.
    pub fn is_block_end(&self) -> bool {
        matches!(self, Self::End | Self::Else | Self::Elseif | Self::Until | Self::Eof)
    }

    /// Tokens that can only start a statement; the parser resynchronises on them.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Break | Self::Do | Self::For | Self::Function | Self::If | Self::Local
            | Self::Repeat | Self::Return | Self::While
        )
    }

    /// Human-readable form used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Int(s) | Self::Float(s) => format!("number `{s}`"),
            Self::Name(s)      => format!("name `{s}`"),
            Self::StringLit(s) => format!("string \"{s}\""),
            Self::Eof          => "end of file".to_string(),
            other              => format!("`{}`", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            Self::And => "and", Self::Break => "break", Self::Do => "do",
            Self::Else => "else", Self::Elseif => "elseif", Self::End => "end",
            Self::False => "false", Self::For => "for", Self::Function => "function",
            Self::If => "if", Self::In => "in", Self::Local => "local",
            Self::Nil => "nil", Self::Not => "not", Self::Or => "or",
            Self::Repeat => "repeat", Self::Return => "return", Self::Then => "then",
            Self::True => "true", Self::Until => "until", Self::While => "while",
            Self::Plus => "+", Self::Minus => "-", Self::Star => "*", Self::Slash => "/",
            Self::Percent => "%", Self::Caret => "^", Self::Hash => "#", Self::Concat => "..",
            Self::Assign => "=", Self::EqEq => "==", Self::TildeEq => "~=",
            Self::Lt => "<", Self::LtEq => "<=", Self::Gt => ">", Self::GtEq => ">=",
            Self::Comma => ",", Self::Semicolon => ";", Self::Dot => ".",
            Self::LParen => "(", Self::RParen => ")", Self::LBrace => "{", Self::RBrace => "}",
            Self::LBracket => "[", Self::RBracket => "]",
            Self::Int(_) | Self::Float(_) | Self::Name(_) | Self::StringLit(_) | Self::Eof => "",
        }
    }
}

/// Maps an identifier string to its keyword token, or returns `Name`.
pub fn keyword_or_name(s: String) -> TokenKind {
    match s.as_str() {
        "and"      => TokenKind::And,
        "break"    => TokenKind::Break,
        "do"       => TokenKind::Do,
        "else"     => TokenKind::Else,
        "elseif"   => TokenKind::Elseif,
        "end"      => TokenKind::End,
        "false"    => TokenKind::False,
        "for"      => TokenKind::For,
        "function" => TokenKind::Function,
        "if"       => TokenKind::If,
        "in"       => TokenKind::In,
        "local"    => TokenKind::Local,
        "nil"      => TokenKind::Nil,
        "not"      => TokenKind::Not,
        "or"       => TokenKind::Or,
        "repeat"   => TokenKind::Repeat,
        "return"   => TokenKind::Return,
        "then"     => TokenKind::Then,
        "true"     => TokenKind::True,
        "until"    => TokenKind::Until,
        "while"    => TokenKind::While,
        _          => TokenKind::Name(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
