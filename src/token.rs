//! Token model shared by the lexer and the parser.
//!
//! Token kinds are single-bit identifiers (`TokenKind` wraps a `u128`) so
//! that the sets of tokens acceptable at a given parse point can be
//! expressed as a bitmask and tested with one `&` operation, per the
//! contract the lexer presents to the parser.

use std::fmt::{self, Display};

/// A bitmask of token kinds. Each elementary kind occupies exactly one bit;
/// masks such as [`TokenKind::SKIP_TRIVIA`] or [`TokenKind::EXPRESSION_START`]
/// are unions of elementary bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenKind(pub u128);

macro_rules! bits {
    ($($name:ident = $bit:expr;)*) => {
        impl TokenKind {
            $(pub const $name: TokenKind = TokenKind(1u128 << $bit);)*
        }
    };
}

impl TokenKind {
    pub const NONE: TokenKind = TokenKind(0);
}

bits! {
    EOF = 0;
    ERROR = 1;
    COMMENT = 2;
    WHITESPACE = 3;
    ID = 4;

    KW_SIZEOF = 5;
    KW_AUTO = 6;
    KW_LONG = 7;
    KW_SHORT = 8;
    KW_VOLATILE = 9;
    KW_CONST = 10;
    KW_RESTRICT = 11;
    KW_EXTERN = 12;
    KW_REGISTER = 13;
    KW_STATIC = 14;
    KW_SIGNED = 15;
    KW_UNSIGNED = 16;
    KW_ENUM = 17;
    KW_TYPEDEF = 18;
    KW_UNION = 19;
    KW_STRUCT = 20;
    KW_BREAK = 21;
    KW_CONTINUE = 22;
    KW_ELSE = 23;
    KW_FOR = 24;
    KW_IF = 25;
    KW_RETURN = 26;
    KW_WHILE = 27;
    KW_VOID = 28;
    KW_CHAR = 29;
    KW_INT = 30;
    KW_FLOAT = 31;
    KW_DOUBLE = 32;

    LIT_INT = 33;
    LIT_FLOAT = 34;
    LIT_STRING = 35;
    LIT_CHAR = 36;

    STAR = 37;
    AMPERSAND = 38;
    PLUS = 39;
    MINUS = 40;
    SLASH = 41;
    PERCENT = 42;
    BANG = 43;
    TILDE = 44;
    PIPE = 45;
    CARET = 46;
    SHL = 47;
    SHR = 48;
    AND_AND = 49;
    OR_OR = 50;
    EQ_EQ = 51;
    NOT_EQ = 52;
    LESS = 53;
    LESS_EQ = 54;
    GREATER = 55;
    GREATER_EQ = 56;
    INCREMENT = 57;
    DECREMENT = 58;
    QUERY = 59;
    COLON = 60;
    COMMA = 61;
    SEMICOLON = 62;
    DOT = 63;
    ARROW = 64;

    ASSIGN = 65;
    ADD_ASSIGN = 66;
    SUB_ASSIGN = 67;
    MUL_ASSIGN = 68;
    DIV_ASSIGN = 69;
    MOD_ASSIGN = 70;
    SHL_ASSIGN = 71;
    SHR_ASSIGN = 72;
    AND_ASSIGN = 73;
    XOR_ASSIGN = 74;
    OR_ASSIGN = 75;

    PAREN_BEGIN = 76;
    PAREN_END = 77;
    SCOPE_BEGIN = 78;
    SCOPE_END = 79;
    CROCHET_BEGIN = 80;
    CROCHET_END = 81;
}

impl TokenKind {
    pub const SKIP_TRIVIA: TokenKind = TokenKind(TokenKind::COMMENT.0 | TokenKind::WHITESPACE.0);

    pub const STORAGE: TokenKind = TokenKind(
        TokenKind::KW_EXTERN.0 | TokenKind::KW_REGISTER.0 | TokenKind::KW_STATIC.0 | TokenKind::KW_AUTO.0,
    );
    pub const CVR: TokenKind =
        TokenKind(TokenKind::KW_CONST.0 | TokenKind::KW_VOLATILE.0 | TokenKind::KW_RESTRICT.0);
    pub const SIGNEDNESS: TokenKind = TokenKind(TokenKind::KW_SIGNED.0 | TokenKind::KW_UNSIGNED.0);
    pub const SIZE_MODIFIER: TokenKind = TokenKind(TokenKind::KW_SHORT.0 | TokenKind::KW_LONG.0);
    pub const FUNDAMENTAL: TokenKind = TokenKind(
        TokenKind::KW_VOID.0
            | TokenKind::KW_CHAR.0
            | TokenKind::KW_INT.0
            | TokenKind::KW_FLOAT.0
            | TokenKind::KW_DOUBLE.0,
    );
    pub const RECORD_KEYWORD: TokenKind =
        TokenKind(TokenKind::KW_STRUCT.0 | TokenKind::KW_UNION.0 | TokenKind::KW_ENUM.0);

    pub const ASSIGN_OPS: TokenKind = TokenKind(
        TokenKind::ASSIGN.0
            | TokenKind::ADD_ASSIGN.0
            | TokenKind::SUB_ASSIGN.0
            | TokenKind::MUL_ASSIGN.0
            | TokenKind::DIV_ASSIGN.0
            | TokenKind::MOD_ASSIGN.0
            | TokenKind::SHL_ASSIGN.0
            | TokenKind::SHR_ASSIGN.0
            | TokenKind::AND_ASSIGN.0
            | TokenKind::XOR_ASSIGN.0
            | TokenKind::OR_ASSIGN.0,
    );

    pub const EXPRESSION_START: TokenKind = TokenKind(
        TokenKind::ID.0
            | TokenKind::LIT_INT.0
            | TokenKind::LIT_FLOAT.0
            | TokenKind::LIT_STRING.0
            | TokenKind::LIT_CHAR.0
            | TokenKind::INCREMENT.0
            | TokenKind::DECREMENT.0
            | TokenKind::PLUS.0
            | TokenKind::MINUS.0
            | TokenKind::BANG.0
            | TokenKind::TILDE.0
            | TokenKind::STAR.0
            | TokenKind::AMPERSAND.0
            | TokenKind::KW_SIZEOF.0
            | TokenKind::PAREN_BEGIN.0,
    );

    pub const STATEMENT_START: TokenKind = TokenKind(
        TokenKind::SCOPE_BEGIN.0 | TokenKind::KW_IF.0 | TokenKind::KW_WHILE.0 | TokenKind::KW_FOR.0,
    );

    pub fn union(self, other: TokenKind) -> TokenKind {
        TokenKind(self.0 | other.0)
    }

    pub fn intersects(self, mask: TokenKind) -> bool {
        self.0 & mask.0 != 0
    }

    pub fn is_single(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }
}

impl std::ops::BitOr for TokenKind {
    type Output = TokenKind;
    fn bitor(self, rhs: TokenKind) -> TokenKind {
        self.union(rhs)
    }
}

/// A span of byte offsets into the source text, used for error carets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

/// A lexeme with a textual slice, a kind drawn from [`TokenKind`], and an
/// `ok` flag used when the token is presented as the outcome of a
/// peek/expect predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub span: Span,
    pub ok: bool,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, span: Span) -> Self {
        Token {
            text: text.into(),
            kind,
            span,
            ok: true,
        }
    }

    pub fn eof(span: Span) -> Self {
        Token {
            text: String::new(),
            kind: TokenKind::EOF,
            span,
            ok: true,
        }
    }

    pub fn error(text: impl Into<String>, span: Span) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::ERROR,
            span,
            ok: false,
        }
    }

    pub fn is(&self, mask: TokenKind) -> bool {
        self.kind.intersects(mask)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
