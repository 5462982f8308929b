//! Token definitions produced by the [`lexer`](super::lexer)
//!
//! Every token is paired with the [`SourceRange`] it was scanned from in a
//! [`TokenEntry`]. Trivia (whitespace and comments) is kept as tokens so the
//! stream reconstructs the original text exactly.

use crate::source::{Locatable, SourceLocation, SourceRange};
use std::fmt;
use thiserror::Error;

/// Syntactic category of a reserved word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCategory {
    Declaration,
    Statement,
    Expression,
    Pattern,
}

macro_rules! keywords {
    ($($variant:ident => $text:literal, $category:ident;)*) => {
        /// Reserved words, each tagged with a [`KeywordCategory`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            pub fn lookup(text: &str) -> Option<Keyword> {
                match text {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }

            pub fn category(self) -> KeywordCategory {
                match self {
                    $(Keyword::$variant => KeywordCategory::$category,)*
                }
            }
        }
    };
}

keywords! {
    Associatedtype => "associatedtype", Declaration;
    Class => "class", Declaration;
    Deinit => "deinit", Declaration;
    Enum => "enum", Declaration;
    Extension => "extension", Declaration;
    Fileprivate => "fileprivate", Declaration;
    Func => "func", Declaration;
    Import => "import", Declaration;
    Init => "init", Declaration;
    Inout => "inout", Declaration;
    Internal => "internal", Declaration;
    Let => "let", Declaration;
    Open => "open", Declaration;
    Operator => "operator", Declaration;
    Private => "private", Declaration;
    Precedencegroup => "precedencegroup", Declaration;
    Protocol => "protocol", Declaration;
    Public => "public", Declaration;
    Rethrows => "rethrows", Declaration;
    Static => "static", Declaration;
    Struct => "struct", Declaration;
    Subscript => "subscript", Declaration;
    Typealias => "typealias", Declaration;
    Var => "var", Declaration;

    Break => "break", Statement;
    Case => "case", Statement;
    Continue => "continue", Statement;
    Default => "default", Statement;
    Defer => "defer", Statement;
    Do => "do", Statement;
    Else => "else", Statement;
    Fallthrough => "fallthrough", Statement;
    For => "for", Statement;
    Guard => "guard", Statement;
    If => "if", Statement;
    In => "in", Statement;
    Repeat => "repeat", Statement;
    Return => "return", Statement;
    Switch => "switch", Statement;
    Where => "where", Statement;
    While => "while", Statement;

    As => "as", Expression;
    Any => "Any", Expression;
    Catch => "catch", Expression;
    False => "false", Expression;
    Is => "is", Expression;
    Nil => "nil", Expression;
    Super => "super", Expression;
    SelfValue => "self", Expression;
    SelfType => "Self", Expression;
    Throw => "throw", Expression;
    Throws => "throws", Expression;
    True => "true", Expression;
    Try => "try", Expression;

    Underscore => "_", Pattern;
}

/// `#`-prefixed keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoundKeyword {
    File,
    Line,
    Column,
    Function,
    Selector,
    Available,
    If,
    ElseIf,
    Else,
    EndIf,
}

impl PoundKeyword {
    pub fn lookup(text: &str) -> Option<PoundKeyword> {
        Some(match text {
            "file" => PoundKeyword::File,
            "line" => PoundKeyword::Line,
            "column" => PoundKeyword::Column,
            "function" => PoundKeyword::Function,
            "selector" => PoundKeyword::Selector,
            "available" => PoundKeyword::Available,
            "if" => PoundKeyword::If,
            "elseif" => PoundKeyword::ElseIf,
            "else" => PoundKeyword::Else,
            "endif" => PoundKeyword::EndIf,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PoundKeyword::File => "#file",
            PoundKeyword::Line => "#line",
            PoundKeyword::Column => "#column",
            PoundKeyword::Function => "#function",
            PoundKeyword::Selector => "#selector",
            PoundKeyword::Available => "#available",
            PoundKeyword::If => "#if",
            PoundKeyword::ElseIf => "#elseif",
            PoundKeyword::Else => "#else",
            PoundKeyword::EndIf => "#endif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuator {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftSquare,
    RightSquare,
    Period,
    Comma,
    Colon,
    Semicolon,
    /// Assignment `=`
    Equal,
    At,
    Hash,
    /// Prefix `&` marking an in-out argument
    Ampersand,
    Arrow,
    Backslash,
    /// Whitespace-preceded `?` of a ternary conditional
    Question,
    /// `?` bound to the preceding token: optional type or optional chaining
    PostfixQuestion,
    /// `!` bound to the preceding token: forced unwrap
    PostfixExclaim,
}

impl Punctuator {
    pub fn as_str(self) -> &'static str {
        match self {
            Punctuator::LeftParen => "(",
            Punctuator::RightParen => ")",
            Punctuator::LeftBrace => "{",
            Punctuator::RightBrace => "}",
            Punctuator::LeftSquare => "[",
            Punctuator::RightSquare => "]",
            Punctuator::Period => ".",
            Punctuator::Comma => ",",
            Punctuator::Colon => ":",
            Punctuator::Semicolon => ";",
            Punctuator::Equal => "=",
            Punctuator::At => "@",
            Punctuator::Hash => "#",
            Punctuator::Ampersand => "&",
            Punctuator::Arrow => "->",
            Punctuator::Backslash => "\\",
            Punctuator::Question | Punctuator::PostfixQuestion => "?",
            Punctuator::PostfixExclaim => "!",
        }
    }
}

/// A piece of an interpolated string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum StringSegment {
    /// Decoded literal text
    Text(String),
    /// Raw source of an interpolated expression and where it starts
    Interpolation {
        source: String,
        start: SourceLocation,
    },
}

/// Why the lexer could not make sense of some input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidTokenReason {
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("malformed numeric literal")]
    MalformedNumber,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence in string literal")]
    InvalidEscape,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated back-quoted identifier")]
    UnterminatedBacktick,
    #[error("unknown '#' keyword")]
    UnknownPoundKeyword,
}

/// All token variants produced by the lexer.
///
/// Literal variants keep their raw spelling (digit separators, prefixes) so
/// the token stream can be printed back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    BinaryIntegerLiteral(String),
    OctalIntegerLiteral(String),
    DecimalIntegerLiteral(String),
    HexadecimalIntegerLiteral(String),
    DecimalFloatLiteral(String),
    HexadecimalFloatLiteral(String),
    StaticStringLiteral { value: String, raw: String },
    InterpolatedStringLiteral { segments: Vec<StringSegment>, raw: String },

    // Identifiers
    Identifier(String),
    BacktickIdentifier(String),

    Keyword(Keyword),
    PoundKeyword(PoundKeyword),
    Punctuator(Punctuator),

    // Operators, classified by surrounding whitespace
    PrefixOperator(String),
    BinaryOperator(String),
    PostfixOperator(String),

    // Trivia
    Whitespace(String),
    LineComment(String),
    BlockComment(String),

    Invalid { reason: InvalidTokenReason, text: String },

    Eof,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::LineComment(_) | Token::BlockComment(_)
        )
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    pub fn is_punctuator(&self, punctuator: Punctuator) -> bool {
        matches!(self, Token::Punctuator(p) if *p == punctuator)
    }

    /// Operator text regardless of fixity.
    pub fn operator_text(&self) -> Option<&str> {
        match self {
            Token::PrefixOperator(op) | Token::BinaryOperator(op) | Token::PostfixOperator(op) => {
                Some(op)
            }
            _ => None,
        }
    }

    /// Identifier text, including back-quoted identifiers.
    pub fn identifier_text(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) | Token::BacktickIdentifier(name) => Some(name),
            _ => None,
        }
    }

    /// The exact source spelling of the token.
    pub fn spelling(&self) -> String {
        match self {
            Token::BinaryIntegerLiteral(raw)
            | Token::OctalIntegerLiteral(raw)
            | Token::DecimalIntegerLiteral(raw)
            | Token::HexadecimalIntegerLiteral(raw)
            | Token::DecimalFloatLiteral(raw)
            | Token::HexadecimalFloatLiteral(raw)
            | Token::StaticStringLiteral { raw, .. }
            | Token::InterpolatedStringLiteral { raw, .. }
            | Token::Identifier(raw)
            | Token::PrefixOperator(raw)
            | Token::BinaryOperator(raw)
            | Token::PostfixOperator(raw)
            | Token::Whitespace(raw)
            | Token::LineComment(raw)
            | Token::BlockComment(raw)
            | Token::Invalid { text: raw, .. } => raw.clone(),
            Token::BacktickIdentifier(name) => format!("`{name}`"),
            Token::Keyword(keyword) => keyword.as_str().to_string(),
            Token::PoundKeyword(keyword) => keyword.as_str().to_string(),
            Token::Punctuator(punctuator) => punctuator.as_str().to_string(),
            Token::Eof => String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::BinaryIntegerLiteral(raw)
            | Token::OctalIntegerLiteral(raw)
            | Token::DecimalIntegerLiteral(raw)
            | Token::HexadecimalIntegerLiteral(raw) => write!(f, "integer literal {raw}"),
            Token::DecimalFloatLiteral(raw) | Token::HexadecimalFloatLiteral(raw) => {
                write!(f, "floating-point literal {raw}")
            }
            Token::StaticStringLiteral { raw, .. }
            | Token::InterpolatedStringLiteral { raw, .. } => write!(f, "string literal {raw}"),
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::BacktickIdentifier(name) => write!(f, "identifier '`{name}`'"),
            Token::Keyword(keyword) => write!(f, "'{}'", keyword.as_str()),
            Token::PoundKeyword(keyword) => write!(f, "'{}'", keyword.as_str()),
            Token::Punctuator(punctuator) => write!(f, "'{}'", punctuator.as_str()),
            Token::PrefixOperator(op) => write!(f, "prefix operator '{op}'"),
            Token::BinaryOperator(op) => write!(f, "operator '{op}'"),
            Token::PostfixOperator(op) => write!(f, "postfix operator '{op}'"),
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::LineComment(_) | Token::BlockComment(_) => write!(f, "comment"),
            Token::Invalid { text, .. } => write!(f, "invalid token '{text}'"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}

/// A token paired with the range it was scanned from.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEntry {
    pub token: Token,
    pub range: SourceRange,
}

impl TokenEntry {
    pub fn new(token: Token, range: SourceRange) -> Self {
        Self { token, range }
    }
}

impl Locatable for TokenEntry {
    fn source_range(&self) -> SourceRange {
        self.range.clone()
    }
}
