//! Pull-based lexer: `next(skip_mask) -> Token`.
//!
//! The NFA/regex engine that actually drives recognition is treated as a
//! collaborator reached through the `regex` crate rather than hand-rolled,
//! matching the rest of the example pack's habit of reaching for `regex`
//! instead of writing a bespoke automaton. The lexer itself only knows how
//! to turn the longest match at the current position into a [`Token`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::{Span, Token, TokenKind};

/// One recognizable lexeme class: a compiled pattern anchored at the start
/// of the remaining input, and the `TokenKind` it produces on match.
struct Rule {
    pattern: Regex,
    kind: TokenKind,
}

macro_rules! rule {
    ($pat:expr, $kind:expr) => {
        Rule {
            pattern: Regex::new(concat!("^(?:", $pat, ")")).expect("static lexer pattern"),
            kind: $kind,
        }
    };
}

/// Rules are tried in order for a given starting character class; within a
/// class the earliest rule that matches the longest prefix wins. Keywords
/// are listed before the generic identifier rule so they take priority.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use TokenKind as K;
    vec![
        rule!(r"/\*([^*]|\*[^/])*\*/", K::COMMENT),
        rule!(r"//[^\n]*", K::COMMENT),
        rule!(r"[ \t\r\n]+", K::WHITESPACE),
        rule!(r"sizeof\b", K::KW_SIZEOF),
        rule!(r"auto\b", K::KW_AUTO),
        rule!(r"long\b", K::KW_LONG),
        rule!(r"short\b", K::KW_SHORT),
        rule!(r"volatile\b", K::KW_VOLATILE),
        rule!(r"const\b", K::KW_CONST),
        rule!(r"extern\b", K::KW_EXTERN),
        rule!(r"register\b", K::KW_REGISTER),
        rule!(r"restrict\b", K::KW_RESTRICT),
        rule!(r"static\b", K::KW_STATIC),
        rule!(r"signed\b", K::KW_SIGNED),
        rule!(r"unsigned\b", K::KW_UNSIGNED),
        rule!(r"enum\b", K::KW_ENUM),
        rule!(r"typedef\b", K::KW_TYPEDEF),
        rule!(r"union\b", K::KW_UNION),
        rule!(r"struct\b", K::KW_STRUCT),
        rule!(r"break\b", K::KW_BREAK),
        rule!(r"continue\b", K::KW_CONTINUE),
        rule!(r"else\b", K::KW_ELSE),
        rule!(r"for\b", K::KW_FOR),
        rule!(r"if\b", K::KW_IF),
        rule!(r"return\b", K::KW_RETURN),
        rule!(r"while\b", K::KW_WHILE),
        rule!(r"void\b", K::KW_VOID),
        rule!(r"char\b", K::KW_CHAR),
        rule!(r"int\b", K::KW_INT),
        rule!(r"float\b", K::KW_FLOAT),
        rule!(r"double\b", K::KW_DOUBLE),
        rule!(r"[A-Za-z_][A-Za-z0-9_]*", K::ID),
        rule!(r"0[xX][0-9a-fA-F]+[uUlL]*", K::LIT_INT),
        rule!(r"0[bB][01]+[uUlL]*", K::LIT_INT),
        rule!(r"[0-9]+\.[0-9]+([fF]|[lL])?", K::LIT_FLOAT),
        rule!(r"[0-9]+[uUlL]*", K::LIT_INT),
        rule!(r#""(\\.|[^"\\])*""#, K::LIT_STRING),
        rule!(r"'(\\.|[^'\\])*'", K::LIT_CHAR),
        rule!(r"\+\+", K::INCREMENT),
        rule!(r"--", K::DECREMENT),
        rule!(r"<<=", K::SHL_ASSIGN),
        rule!(r">>=", K::SHR_ASSIGN),
        rule!(r"<<", K::SHL),
        rule!(r">>", K::SHR),
        rule!(r"&&", K::AND_AND),
        rule!(r"\|\|", K::OR_OR),
        rule!(r"==", K::EQ_EQ),
        rule!(r"!=", K::NOT_EQ),
        rule!(r"<=", K::LESS_EQ),
        rule!(r">=", K::GREATER_EQ),
        rule!(r"\+=", K::ADD_ASSIGN),
        rule!(r"-=", K::SUB_ASSIGN),
        rule!(r"\*=", K::MUL_ASSIGN),
        rule!(r"/=", K::DIV_ASSIGN),
        rule!(r"%=", K::MOD_ASSIGN),
        rule!(r"&=", K::AND_ASSIGN),
        rule!(r"\^=", K::XOR_ASSIGN),
        rule!(r"\|=", K::OR_ASSIGN),
        rule!(r"->", K::ARROW),
        rule!(r"<", K::LESS),
        rule!(r">", K::GREATER),
        rule!(r"\*", K::STAR),
        rule!(r"&", K::AMPERSAND),
        rule!(r"\+", K::PLUS),
        rule!(r"-", K::MINUS),
        rule!(r"/", K::SLASH),
        rule!(r"%", K::PERCENT),
        rule!(r"!", K::BANG),
        rule!(r"~", K::TILDE),
        rule!(r"\|", K::PIPE),
        rule!(r"\^", K::CARET),
        rule!(r"\?", K::QUERY),
        rule!(r":", K::COLON),
        rule!(r",", K::COMMA),
        rule!(r";", K::SEMICOLON),
        rule!(r"\.", K::DOT),
        rule!(r"=", K::ASSIGN),
        rule!(r"\(", K::PAREN_BEGIN),
        rule!(r"\)", K::PAREN_END),
        rule!(r"\{", K::SCOPE_BEGIN),
        rule!(r"\}", K::SCOPE_END),
        rule!(r"\[", K::CROCHET_BEGIN),
        rule!(r"\]", K::CROCHET_END),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn advance_position(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.offset += text.len();
    }

    /// Scan one raw token (no trivia skipping) at the current offset.
    fn scan_one(&mut self) -> Result<Token, LexError> {
        let span_start = Span {
            start: self.offset,
            end: self.offset,
            line: self.line,
            col: self.col,
        };

        let remaining = &self.source[self.offset..];

        if remaining.is_empty() {
            return Ok(Token::eof(span_start));
        }

        let mut best: Option<(&Rule, &str)> = None;
        for rule in RULES.iter() {
            if let Some(m) = rule.pattern.find(remaining) {
                let longer = best.map(|(_, prev)| m.as_str().len() > prev.len()).unwrap_or(true);
                if longer {
                    best = Some((rule, m.as_str()));
                }
            }
        }

        match best {
            Some((rule, matched)) => {
                let text = matched.to_string();
                let span = Span {
                    start: span_start.start,
                    end: span_start.start + text.len(),
                    line: span_start.line,
                    col: span_start.col,
                };
                self.advance_position(&text);
                Ok(Token::new(text, rule.kind, span))
            }
            None => {
                let bad = remaining.chars().next().unwrap().to_string();
                self.advance_position(&bad);
                Err(LexError {
                    message: format!("unrecognized input near '{bad}'"),
                    span: span_start,
                })
            }
        }
    }

    /// Pull the next token, silently discarding any token whose kind
    /// intersects `skip_mask`.
    pub fn next(&mut self, skip_mask: TokenKind) -> Result<Token, LexError> {
        loop {
            let token = self.scan_one()?;
            if token.kind == TokenKind::EOF || !token.is(skip_mask) {
                return Ok(token);
            }
        }
    }
}

/// Un-escapes the interior of a string or char literal's textual slice
/// (the slice still carries its surrounding quotes). Recognizes the fixed
/// escape table `\n \t \r \0 \\ \' \"` plus `\xHH`, matching the escape set
/// pinned from `original_source`'s `escape_sequence` table.
pub fn unescape_literal(raw: &str) -> Result<String, String> {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => {
                let hi = chars.next().ok_or("truncated \\x escape")?;
                let lo = chars.next().ok_or("truncated \\x escape")?;
                let byte = u8::from_str_radix(&format!("{hi}{lo}"), 16)
                    .map_err(|_| "invalid \\x escape".to_string())?;
                out.push(byte as char);
            }
            Some(other) => return Err(format!("unknown escape sequence '\\{other}'")),
            None => return Err("dangling escape at end of literal".to_string()),
        }
    }

    Ok(out)
}
