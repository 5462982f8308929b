//! Lexer (tokenizer) for Swift source code
//!
//! Converts raw source text into a flat list of [`TokenEntry`] values consumed
//! by the parser. Scanning is total: anything the lexer cannot make sense of
//! becomes a [`Token::Invalid`] entry, and whitespace and comments are kept
//! as tokens, so the ranges of all entries tile the input exactly.
//!
//! Operators are scanned maximal-munch and classified as prefix, binary or
//! postfix from the characters around them. A run of `!`/`?` glued to the
//! preceding token splits into individual postfix punctuators. Generic
//! chevrons are not special here: closing a generic clause inside an
//! operator such as `>>` is left to the parser.

use super::token::{InvalidTokenReason, Keyword, PoundKeyword, Punctuator, StringSegment, Token, TokenEntry};
use crate::source::{SourceFile, SourceLocation, SourceRange};
use std::sync::Arc;

/// Lexer for Swift source code
pub struct Lexer {
    identifier: Arc<str>,
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<TokenEntry>,
}

/// Saved scanner position used to undo a tentative scan.
#[derive(Clone, Copy)]
struct Mark {
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a lexer over the whole text of `file`.
    pub fn new(file: &SourceFile) -> Self {
        Self::at(file.identifier().clone(), file.content(), 1, 1)
    }

    /// Create a lexer over a fragment of a file that starts at `line:column`.
    pub fn at(identifier: Arc<str>, text: &str, line: usize, column: usize) -> Self {
        Self {
            identifier,
            input: text.chars().collect(),
            position: 0,
            line,
            column,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input. The last entry is always [`Token::Eof`].
    pub fn tokenize(&mut self) -> Vec<TokenEntry> {
        while !self.is_at_end() {
            self.next_token();
        }
        let end = self.current_location();
        self.tokens
            .push(TokenEntry::new(Token::Eof, SourceRange::new(end.clone(), end)));
        std::mem::take(&mut self.tokens)
    }

    /// Scan one token (or a split run of postfix glyphs) and record it.
    fn next_token(&mut self) {
        let start = self.current_location();
        let start_position = self.position;
        let Some(ch) = self.peek() else {
            return;
        };

        let token = match ch {
            c if is_whitespace(c) => self.whitespace(),
            '/' if self.peek_ahead(1) == Some('/') => self.line_comment(),
            '/' if self.peek_ahead(1) == Some('*') => self.block_comment(),
            '"' => self.string_literal(start_position),
            '0'..='9' => self.number_literal(start_position),
            '`' => self.backtick_identifier(start_position),
            '#' => self.pound(start_position),
            '$' if self.peek_ahead(1).is_some_and(is_identifier_char) => {
                self.identifier_or_keyword()
            }
            c if is_identifier_head(c) => self.identifier_or_keyword(),
            '.' if self.peek_ahead(1) != Some('.') => {
                self.advance();
                Token::Punctuator(Punctuator::Period)
            }
            c if is_operator_head(c) || c == '.' => {
                self.operator(start);
                return;
            }
            '(' => self.punctuator(Punctuator::LeftParen),
            ')' => self.punctuator(Punctuator::RightParen),
            '{' => self.punctuator(Punctuator::LeftBrace),
            '}' => self.punctuator(Punctuator::RightBrace),
            '[' => self.punctuator(Punctuator::LeftSquare),
            ']' => self.punctuator(Punctuator::RightSquare),
            ',' => self.punctuator(Punctuator::Comma),
            ':' => self.punctuator(Punctuator::Colon),
            ';' => self.punctuator(Punctuator::Semicolon),
            '@' => self.punctuator(Punctuator::At),
            '\\' => self.punctuator(Punctuator::Backslash),
            _ => {
                self.advance();
                Token::Invalid {
                    reason: InvalidTokenReason::UnexpectedCharacter,
                    text: ch.to_string(),
                }
            }
        };

        let range = SourceRange::new(start, self.current_location());
        self.tokens.push(TokenEntry::new(token, range));
    }

    fn punctuator(&mut self, punctuator: Punctuator) -> Token {
        self.advance();
        Token::Punctuator(punctuator)
    }

    fn whitespace(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek().filter(|c| is_whitespace(*c)) {
            text.push(ch);
            self.advance();
        }
        Token::Whitespace(text)
    }

    /// `// ...` up to, not including, the line feed
    fn line_comment(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek().filter(|c| *c != '\n') {
            text.push(ch);
            self.advance();
        }
        Token::LineComment(text)
    }

    /// `/* ... */`, nestable
    fn block_comment(&mut self) -> Token {
        let mut text = String::from("/*");
        self.advance();
        self.advance();

        let mut depth = 1;
        while depth > 0 {
            match (self.peek(), self.peek_ahead(1)) {
                (Some('/'), Some('*')) => {
                    depth += 1;
                    text.push_str("/*");
                    self.advance();
                    self.advance();
                }
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    text.push_str("*/");
                    self.advance();
                    self.advance();
                }
                (Some(ch), _) => {
                    text.push(ch);
                    self.advance();
                }
                (None, _) => {
                    return Token::Invalid {
                        reason: InvalidTokenReason::UnterminatedComment,
                        text,
                    };
                }
            }
        }
        Token::BlockComment(text)
    }

    fn identifier_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        if let Some(ch) = self.advance() {
            ident.push(ch);
        }
        while let Some(ch) = self.peek().filter(|c| is_identifier_char(*c)) {
            ident.push(ch);
            self.advance();
        }

        match Keyword::lookup(&ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(ident),
        }
    }

    fn backtick_identifier(&mut self, start_position: usize) -> Token {
        self.advance();
        let mut ident = String::new();
        while let Some(ch) = self.peek().filter(|c| is_identifier_char(*c)) {
            ident.push(ch);
            self.advance();
        }
        if !ident.is_empty() && self.peek() == Some('`') {
            self.advance();
            return Token::BacktickIdentifier(ident);
        }
        Token::Invalid {
            reason: InvalidTokenReason::UnterminatedBacktick,
            text: self.text_from(start_position),
        }
    }

    /// `#keyword` or a bare `#`
    fn pound(&mut self, start_position: usize) -> Token {
        self.advance();
        if !self.peek().is_some_and(is_identifier_head) {
            return Token::Punctuator(Punctuator::Hash);
        }
        let mut word = String::new();
        while let Some(ch) = self.peek().filter(|c| is_identifier_char(*c)) {
            word.push(ch);
            self.advance();
        }
        match PoundKeyword::lookup(&word) {
            Some(keyword) => Token::PoundKeyword(keyword),
            None => Token::Invalid {
                reason: InvalidTokenReason::UnknownPoundKeyword,
                text: self.text_from(start_position),
            },
        }
    }

    // ===== Numbers =====

    fn number_literal(&mut self, start_position: usize) -> Token {
        // `t.0.1` is two tuple-member accesses, never a float
        let after_period = matches!(
            self.tokens.last(),
            Some(TokenEntry {
                token: Token::Punctuator(Punctuator::Period),
                ..
            })
        );

        let token = if self.peek() == Some('0') {
            match self.peek_ahead(1) {
                Some('b') => self.radix_integer(|c| matches!(c, '0' | '1'), Token::BinaryIntegerLiteral),
                Some('o') => self.radix_integer(|c| matches!(c, '0'..='7'), Token::OctalIntegerLiteral),
                Some('x') => self.hexadecimal_literal(after_period),
                _ => self.decimal_literal(after_period),
            }
        } else {
            self.decimal_literal(after_period)
        };

        let token = token.unwrap_or(Token::Invalid {
            reason: InvalidTokenReason::MalformedNumber,
            text: String::new(),
        });

        // Identifier characters glued to a number make the whole run malformed
        if self.peek().is_some_and(is_identifier_char) || matches!(token, Token::Invalid { .. }) {
            while self.peek().is_some_and(is_identifier_char) {
                self.advance();
            }
            return Token::Invalid {
                reason: InvalidTokenReason::MalformedNumber,
                text: self.text_from(start_position),
            };
        }
        token
    }

    /// `0b...` / `0o...`; `None` when no digit follows the prefix
    fn radix_integer(
        &mut self,
        is_digit: fn(char) -> bool,
        make: fn(String) -> Token,
    ) -> Option<Token> {
        let mut raw = String::new();
        raw.extend(self.advance());
        raw.extend(self.advance());
        if !self.peek().is_some_and(is_digit) {
            return None;
        }
        self.digits(&mut raw, is_digit);
        Some(make(raw))
    }

    fn hexadecimal_literal(&mut self, after_period: bool) -> Option<Token> {
        let mut raw = String::new();
        raw.extend(self.advance());
        raw.extend(self.advance());
        if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        self.digits(&mut raw, |c| c.is_ascii_hexdigit());

        let mut is_float = false;
        if !after_period
            && self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_hexdigit())
        {
            // Only a float if an exponent follows the fraction
            let mark = self.mark();
            let mut fraction = String::new();
            fraction.extend(self.advance());
            self.digits(&mut fraction, |c| c.is_ascii_hexdigit());
            if matches!(self.peek(), Some('p' | 'P')) {
                raw.push_str(&fraction);
                is_float = true;
            } else {
                self.reset(mark);
            }
        }

        if matches!(self.peek(), Some('p' | 'P')) {
            if !self.exponent(&mut raw) {
                return None;
            }
            is_float = true;
        }

        Some(if is_float {
            Token::HexadecimalFloatLiteral(raw)
        } else {
            Token::HexadecimalIntegerLiteral(raw)
        })
    }

    fn decimal_literal(&mut self, after_period: bool) -> Option<Token> {
        let mut raw = String::new();
        self.digits(&mut raw, |c| c.is_ascii_digit());

        let mut is_float = false;
        if !after_period
            && self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
        {
            raw.extend(self.advance());
            self.digits(&mut raw, |c| c.is_ascii_digit());
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) && !after_period {
            let digit_follows = match self.peek_ahead(1) {
                Some('+' | '-') => self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if digit_follows {
                self.exponent(&mut raw);
                is_float = true;
            }
        }

        Some(if is_float {
            Token::DecimalFloatLiteral(raw)
        } else {
            Token::DecimalIntegerLiteral(raw)
        })
    }

    /// Exponent marker, optional sign and at least one decimal digit.
    fn exponent(&mut self, raw: &mut String) -> bool {
        raw.extend(self.advance());
        if matches!(self.peek(), Some('+' | '-')) {
            raw.extend(self.advance());
        }
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        self.digits(raw, |c| c.is_ascii_digit());
        true
    }

    /// Digits of one radix, with `_` separators after the first digit.
    fn digits(&mut self, raw: &mut String, is_digit: fn(char) -> bool) {
        while let Some(ch) = self.peek().filter(|c| is_digit(*c) || *c == '_') {
            raw.push(ch);
            self.advance();
        }
    }

    // ===== Strings =====

    fn string_literal(&mut self, start_position: usize) -> Token {
        self.advance();
        let multiline = self.peek() == Some('"') && self.peek_ahead(1) == Some('"');
        if multiline {
            self.advance();
            self.advance();
        }

        let mut segments = Vec::new();
        let mut text = String::new();
        let mut interpolated = false;
        let mut invalid = None;

        loop {
            match self.peek() {
                None => {
                    invalid = Some(InvalidTokenReason::UnterminatedString);
                    break;
                }
                Some('\n') if !multiline => {
                    invalid = Some(InvalidTokenReason::UnterminatedString);
                    break;
                }
                Some('"') => {
                    if !multiline {
                        self.advance();
                        break;
                    }
                    if self.peek_ahead(1) == Some('"') && self.peek_ahead(2) == Some('"') {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    text.push('"');
                    self.advance();
                }
                Some('\\') => {
                    self.advance();
                    if self.peek() == Some('(') {
                        self.advance();
                        interpolated = true;
                        if !text.is_empty() {
                            segments.push(StringSegment::Text(std::mem::take(&mut text)));
                        }
                        let start = self.current_location();
                        let mut source = String::new();
                        if !self.interpolation_body(&mut source, multiline) {
                            invalid = Some(InvalidTokenReason::UnterminatedString);
                            break;
                        }
                        segments.push(StringSegment::Interpolation { source, start });
                    } else {
                        match self.escape(multiline) {
                            Some(Some(ch)) => text.push(ch),
                            Some(None) => {}
                            None => invalid = invalid.or(Some(InvalidTokenReason::InvalidEscape)),
                        }
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        let raw = self.text_from(start_position);
        if let Some(reason) = invalid {
            return Token::Invalid { reason, text: raw };
        }
        if !text.is_empty() || segments.is_empty() {
            segments.push(StringSegment::Text(text));
        }
        if multiline {
            dedent_multiline(&mut segments);
        }

        if interpolated {
            return Token::InterpolatedStringLiteral { segments, raw };
        }
        let value = segments
            .into_iter()
            .map(|segment| match segment {
                StringSegment::Text(text) => text,
                StringSegment::Interpolation { source, .. } => source,
            })
            .collect();
        Token::StaticStringLiteral { value, raw }
    }

    /// Decode the escape after a `\`. `Some(None)` for an escaped line feed
    /// in a multi-line literal, `None` for an invalid escape.
    fn escape(&mut self, multiline: bool) -> Option<Option<char>> {
        let ch = self.peek()?;
        if ch == '\n' && !multiline {
            return None;
        }
        self.advance();
        let decoded = match ch {
            '0' => '\0',
            '\\' => '\\',
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            '"' => '"',
            '\'' => '\'',
            '\n' => return Some(None),
            'u' => {
                if self.peek() != Some('{') {
                    return None;
                }
                self.advance();
                let mut hex = String::new();
                while let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit()) {
                    hex.push(c);
                    self.advance();
                }
                if self.peek() != Some('}') || hex.is_empty() || hex.len() > 8 {
                    return None;
                }
                self.advance();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        };
        Some(Some(decoded))
    }

    /// Consume an interpolation body after `\(` through its matching `)`.
    /// The body is appended to `out` without the closing paren. Quotes and
    /// parens inside nested string literals do not count towards nesting.
    fn interpolation_body(&mut self, out: &mut String, multiline: bool) -> bool {
        let mut depth = 1;
        loop {
            match self.peek() {
                None => return false,
                Some('\n') if !multiline => return false,
                Some('(') => {
                    depth += 1;
                    out.push('(');
                    self.advance();
                }
                Some(')') => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return true;
                    }
                    out.push(')');
                }
                Some('"') => {
                    if !self.nested_string(out, multiline) {
                        return false;
                    }
                }
                Some(ch) => {
                    out.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Copy a string literal nested in an interpolation verbatim into `out`.
    fn nested_string(&mut self, out: &mut String, multiline: bool) -> bool {
        out.push('"');
        self.advance();
        loop {
            match self.peek() {
                None | Some('\n') => return false,
                Some('"') => {
                    out.push('"');
                    self.advance();
                    return true;
                }
                Some('\\') => {
                    out.push('\\');
                    self.advance();
                    match self.peek() {
                        Some('(') => {
                            out.push('(');
                            self.advance();
                            if !self.interpolation_body(out, multiline) {
                                return false;
                            }
                            out.push(')');
                        }
                        Some(ch) => {
                            out.push(ch);
                            self.advance();
                        }
                        None => return false,
                    }
                }
                Some(ch) => {
                    out.push(ch);
                    self.advance();
                }
            }
        }
    }

    // ===== Operators =====

    fn operator(&mut self, start: SourceLocation) {
        let start_position = self.position;
        let is_dot_operator = self.peek() == Some('.');
        let left_bound = self.left_bound();

        let mut text = String::new();
        while let Some(ch) = self.peek() {
            let continues = if is_dot_operator {
                ch == '.' || is_operator_char(ch)
            } else {
                is_operator_char(ch)
            };
            let starts_comment =
                ch == '/' && matches!(self.peek_ahead(1), Some('/' | '*'));
            if !continues || (starts_comment && self.position > start_position) {
                break;
            }
            text.push(ch);
            self.advance();
        }

        let right_bound = self.right_bound();
        self.tokens
            .extend(classify_operator(&text, &start, left_bound, right_bound));
    }

    /// True when the previous token binds to an operator starting here.
    fn left_bound(&self) -> bool {
        match self.tokens.last().map(|entry| &entry.token) {
            None => false,
            Some(token) if token.is_trivia() => false,
            Some(Token::Punctuator(
                Punctuator::LeftParen
                | Punctuator::LeftSquare
                | Punctuator::LeftBrace
                | Punctuator::Comma
                | Punctuator::Semicolon
                | Punctuator::Colon,
            )) => false,
            Some(_) => true,
        }
    }

    /// True when the character after the operator binds to it.
    fn right_bound(&self) -> bool {
        match self.peek() {
            None => false,
            Some(c) if is_whitespace(c) => false,
            Some(')' | ']' | '}' | ',' | ';' | ':') => false,
            Some('/') => !matches!(self.peek_ahead(1), Some('/' | '*')),
            Some(_) => true,
        }
    }

    // ===== Cursor helpers =====

    fn text_from(&self, start_position: usize) -> String {
        self.input[start_position..self.position].iter().collect()
    }

    fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn reset(&mut self, mark: Mark) {
        self.position = mark.position;
        self.line = mark.line;
        self.column = mark.column;
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.identifier.clone(), self.line, self.column)
    }
}

/// Turn an operator run into tokens.
///
/// Shared with the parser, which re-classifies what is left of an operator
/// after splitting a closing `>` off its front. Operators never span lines,
/// so each character occupies one column from `start`.
pub(crate) fn classify_operator(
    text: &str,
    start: &SourceLocation,
    left_bound: bool,
    right_bound: bool,
) -> Vec<TokenEntry> {
    let at = |offset: usize| {
        SourceLocation::new(start.identifier.clone(), start.line, start.column + offset)
    };
    let length = text.chars().count();
    let whole = SourceRange::new(start.clone(), at(length));

    if left_bound && !text.is_empty() && text.chars().all(|c| c == '!' || c == '?') {
        return text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let punctuator = if c == '!' {
                    Punctuator::PostfixExclaim
                } else {
                    Punctuator::PostfixQuestion
                };
                TokenEntry::new(
                    Token::Punctuator(punctuator),
                    SourceRange::new(at(i), at(i + 1)),
                )
            })
            .collect();
    }

    let token = match text {
        "." => Token::Punctuator(Punctuator::Period),
        "=" => Token::Punctuator(Punctuator::Equal),
        "->" => Token::Punctuator(Punctuator::Arrow),
        "?" => Token::Punctuator(Punctuator::Question),
        "&" if !left_bound && right_bound => Token::Punctuator(Punctuator::Ampersand),
        _ => match (left_bound, right_bound) {
            (true, false) => Token::PostfixOperator(text.to_string()),
            (false, true) => Token::PrefixOperator(text.to_string()),
            _ => Token::BinaryOperator(text.to_string()),
        },
    };
    vec![TokenEntry::new(token, whole)]
}

/// Re-attach the text segments of a `"""` literal to their lines: drop the
/// line feed after the opening delimiter, the last line holding the closing
/// delimiter, and the closing delimiter's indentation from every line.
fn dedent_multiline(segments: &mut [StringSegment]) {
    let mut indent = String::new();
    if let Some(StringSegment::Text(last)) = segments.last_mut() {
        if let Some(newline) = last.rfind('\n') {
            let tail = &last[newline + 1..];
            if tail.chars().all(|c| c == ' ' || c == '\t') {
                indent = tail.to_string();
                last.truncate(newline);
            }
        }
    }
    if let Some(StringSegment::Text(first)) = segments.first_mut() {
        if first.starts_with('\n') {
            first.remove(0);
            if let Some(stripped) = first.strip_prefix(indent.as_str()) {
                *first = stripped.to_string();
            }
        }
    }
    if indent.is_empty() {
        return;
    }
    let with_indent = format!("\n{indent}");
    for segment in segments.iter_mut() {
        if let StringSegment::Text(text) = segment {
            *text = text.replace(&with_indent, "\n");
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\0')
}

fn is_identifier_head(c: char) -> bool {
    matches!(
        c,
        'A'..='Z' | 'a'..='z' | '_'
            | '\u{00A8}'
            | '\u{00AA}'
            | '\u{00AD}'
            | '\u{00AF}'
            | '\u{00B2}'..='\u{00B5}'
            | '\u{00B7}'..='\u{00BA}'
            | '\u{00BC}'..='\u{00BE}'
            | '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{00FF}'
            | '\u{0100}'..='\u{02FF}'
            | '\u{0370}'..='\u{167F}'
            | '\u{1681}'..='\u{180D}'
            | '\u{180F}'..='\u{1DBF}'
            | '\u{1E00}'..='\u{1FFF}'
            | '\u{200B}'..='\u{200D}'
            | '\u{202A}'..='\u{202E}'
            | '\u{203F}'..='\u{2040}'
            | '\u{2054}'
            | '\u{2060}'..='\u{206F}'
            | '\u{2070}'..='\u{20CF}'
            | '\u{2100}'..='\u{218F}'
            | '\u{2460}'..='\u{24FF}'
            | '\u{2776}'..='\u{2793}'
            | '\u{2C00}'..='\u{2DFF}'
            | '\u{2E80}'..='\u{2FFF}'
            | '\u{3004}'..='\u{3007}'
            | '\u{3021}'..='\u{302F}'
            | '\u{3031}'..='\u{303F}'
            | '\u{3040}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FD3D}'
            | '\u{FD40}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FE1F}'
            | '\u{FE30}'..='\u{FE44}'
            | '\u{FE47}'..='\u{FFFD}'
    ) || is_supplementary_identifier_head(c)
}

/// `U+x0000` to `U+xFFFD` of every supplementary plane except the last two
fn is_supplementary_identifier_head(c: char) -> bool {
    let code = c as u32;
    (0x1_0000..=0xE_FFFF).contains(&code) && code & 0xFFFF <= 0xFFFD
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_digit()
        || is_identifier_head(c)
        || matches!(c, '\u{0300}'..='\u{036F}' | '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}' | '\u{FE20}'..='\u{FE2F}')
}

fn is_operator_head(c: char) -> bool {
    matches!(
        c,
        '/' | '=' | '-' | '+' | '!' | '*' | '%' | '<' | '>' | '&' | '|' | '^' | '~' | '?'
            | '\u{00A1}'..='\u{00A7}'
            | '\u{00A9}'
            | '\u{00AB}'
            | '\u{00AC}'
            | '\u{00AE}'
            | '\u{00B0}'..='\u{00B1}'
            | '\u{00B6}'
            | '\u{00BB}'
            | '\u{00BF}'
            | '\u{00D7}'
            | '\u{00F7}'
            | '\u{2016}'..='\u{2017}'
            | '\u{2020}'..='\u{2027}'
            | '\u{2030}'..='\u{203E}'
            | '\u{2041}'..='\u{2053}'
            | '\u{2055}'..='\u{205E}'
            | '\u{2190}'..='\u{23FF}'
            | '\u{2500}'..='\u{2775}'
            | '\u{2794}'..='\u{2BFF}'
            | '\u{2E00}'..='\u{2E7F}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3020}'
            | '\u{3030}'
    )
}

fn is_operator_char(c: char) -> bool {
    is_operator_head(c)
        || matches!(
            c,
            '\u{0300}'..='\u{036F}'
                | '\u{1DC0}'..='\u{1DFF}'
                | '\u{20D0}'..='\u{20FF}'
                | '\u{FE00}'..='\u{FE0F}'
                | '\u{FE20}'..='\u{FE2F}'
                | '\u{E0100}'..='\u{E01EF}'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let file = SourceFile::in_memory(source);
        Lexer::new(&file)
            .tokenize()
            .into_iter()
            .map(|entry| entry.token)
            .filter(|token| !token.is_trivia())
            .collect()
    }

    fn punct(p: Punctuator) -> Token {
        Token::Punctuator(p)
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = lex("func main() { return 0 }");

        assert_eq!(tokens[0], Token::Keyword(Keyword::Func));
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "main"));
        assert_eq!(tokens[2], punct(Punctuator::LeftParen));
        assert_eq!(tokens[3], punct(Punctuator::RightParen));
        assert_eq!(tokens[4], punct(Punctuator::LeftBrace));
        assert_eq!(tokens[5], Token::Keyword(Keyword::Return));
        assert!(matches!(tokens[6], Token::DecimalIntegerLiteral(ref s) if s == "0"));
        assert_eq!(tokens[7], punct(Punctuator::RightBrace));
        assert_eq!(tokens[8], Token::Eof);
    }

    #[test]
    fn test_numeric_literals() {
        let tokens = lex("0b1010_1 0o7_7 1_000 0xFF_ff 3.14e-2 0x1.8p3 0x1p-2 1e10");

        assert!(matches!(tokens[0], Token::BinaryIntegerLiteral(ref s) if s == "0b1010_1"));
        assert!(matches!(tokens[1], Token::OctalIntegerLiteral(ref s) if s == "0o7_7"));
        assert!(matches!(tokens[2], Token::DecimalIntegerLiteral(ref s) if s == "1_000"));
        assert!(matches!(tokens[3], Token::HexadecimalIntegerLiteral(ref s) if s == "0xFF_ff"));
        assert!(matches!(tokens[4], Token::DecimalFloatLiteral(ref s) if s == "3.14e-2"));
        assert!(matches!(tokens[5], Token::HexadecimalFloatLiteral(ref s) if s == "0x1.8p3"));
        assert!(matches!(tokens[6], Token::HexadecimalFloatLiteral(ref s) if s == "0x1p-2"));
        assert!(matches!(tokens[7], Token::DecimalFloatLiteral(ref s) if s == "1e10"));
    }

    #[test]
    fn test_malformed_numbers_are_invalid() {
        let tokens = lex("0b 12abc 0x");
        assert!(tokens[..3].iter().all(|t| matches!(
            t,
            Token::Invalid { reason: InvalidTokenReason::MalformedNumber, .. }
        )));
    }

    #[test]
    fn test_tuple_member_digits_stay_integers() {
        let tokens = lex("t.0.1");
        assert!(matches!(tokens[0], Token::Identifier(_)));
        assert_eq!(tokens[1], punct(Punctuator::Period));
        assert!(matches!(tokens[2], Token::DecimalIntegerLiteral(ref s) if s == "0"));
        assert_eq!(tokens[3], punct(Punctuator::Period));
        assert!(matches!(tokens[4], Token::DecimalIntegerLiteral(ref s) if s == "1"));
    }

    #[test]
    fn test_member_access_on_integer() {
        let tokens = lex("1.description");
        assert!(matches!(tokens[0], Token::DecimalIntegerLiteral(_)));
        assert_eq!(tokens[1], punct(Punctuator::Period));
    }

    #[test]
    fn test_static_string_literal() {
        let tokens = lex(r#""hello\n\u{41}\"""#);
        match &tokens[0] {
            Token::StaticStringLiteral { value, .. } => assert_eq!(value, "hello\nA\""),
            other => panic!("Expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn test_interpolated_string_with_nested_quotes_and_parens() {
        let tokens = lex(r#""a \(f("x)", (1 + 2))) b" c"#);
        match &tokens[0] {
            Token::InterpolatedStringLiteral { segments, .. } => {
                assert_eq!(segments.len(), 3);
                assert_eq!(segments[0], StringSegment::Text("a ".to_string()));
                match &segments[1] {
                    StringSegment::Interpolation { source, start } => {
                        assert_eq!(source, r#"f("x)", (1 + 2))"#);
                        assert_eq!(start.column, 6);
                    }
                    other => panic!("Expected interpolation, got {other:?}"),
                }
                assert_eq!(segments[2], StringSegment::Text(" b".to_string()));
            }
            other => panic!("Expected interpolated string, got {other:?}"),
        }
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "c"));
    }

    #[test]
    fn test_multiline_string_strips_indentation() {
        let tokens = lex("let s = \"\"\"\n    one\n      two\n    \"\"\"");
        match &tokens[3] {
            Token::StaticStringLiteral { value, .. } => assert_eq!(value, "one\n  two"),
            other => panic!("Expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        let tokens = lex("\"abc\nx");
        assert!(matches!(
            tokens[0],
            Token::Invalid { reason: InvalidTokenReason::UnterminatedString, .. }
        ));
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "x"));
    }

    #[test]
    fn test_postfix_glyphs_split_after_identifier() {
        let tokens = lex("a!? b ?? c");
        assert_eq!(tokens[1], punct(Punctuator::PostfixExclaim));
        assert_eq!(tokens[2], punct(Punctuator::PostfixQuestion));
        assert!(matches!(tokens[3], Token::Identifier(_)));
        assert!(matches!(tokens[4], Token::BinaryOperator(ref op) if op == "??"));
    }

    #[test]
    fn test_optional_chaining() {
        let tokens = lex("a?.b");
        assert_eq!(tokens[1], punct(Punctuator::PostfixQuestion));
        assert_eq!(tokens[2], punct(Punctuator::Period));
    }

    #[test]
    fn test_ternary_question() {
        let tokens = lex("a ? b : c");
        assert_eq!(tokens[1], punct(Punctuator::Question));
        assert_eq!(tokens[3], punct(Punctuator::Colon));
    }

    #[test]
    fn test_operator_fixity() {
        let tokens = lex("a+b -c d- e + f");
        assert!(matches!(tokens[1], Token::BinaryOperator(ref op) if op == "+"));
        assert!(matches!(tokens[3], Token::PrefixOperator(ref op) if op == "-"));
        assert!(matches!(tokens[6], Token::PostfixOperator(ref op) if op == "-"));
        assert!(matches!(tokens[8], Token::BinaryOperator(ref op) if op == "+"));
    }

    #[test]
    fn test_dot_operators() {
        let tokens = lex("0..<10 a...b x.y");
        assert!(matches!(tokens[1], Token::BinaryOperator(ref op) if op == "..<"));
        assert!(matches!(tokens[4], Token::BinaryOperator(ref op) if op == "..."));
        assert_eq!(tokens[7], punct(Punctuator::Period));
    }

    #[test]
    fn test_operator_stops_before_comment() {
        let tokens = lex("a +/* c */ b");
        assert!(matches!(tokens[1], Token::BinaryOperator(ref op) if op == "+"));
        assert!(matches!(tokens[2], Token::Identifier(ref s) if s == "b"));
    }

    #[test]
    fn test_special_punctuators() {
        let tokens = lex("x = y -> z; f(&a) @b");
        assert_eq!(tokens[1], punct(Punctuator::Equal));
        assert_eq!(tokens[3], punct(Punctuator::Arrow));
        assert_eq!(tokens[5], punct(Punctuator::Semicolon));
        assert_eq!(tokens[8], punct(Punctuator::Ampersand));
        assert_eq!(tokens[11], punct(Punctuator::At));
    }

    #[test]
    fn test_chevrons_are_not_fused_with_generic_content() {
        let tokens = lex("A<B<C>>");
        assert!(matches!(tokens[1], Token::BinaryOperator(ref op) if op == "<"));
        assert!(matches!(tokens[3], Token::BinaryOperator(ref op) if op == "<"));
        assert!(matches!(tokens[5], Token::PostfixOperator(ref op) if op == ">>"));
    }

    #[test]
    fn test_nested_block_comments() {
        let file = SourceFile::in_memory("/* a /* b */ c */x");
        let entries = Lexer::new(&file).tokenize();
        assert!(matches!(entries[0].token, Token::BlockComment(ref s) if s == "/* a /* b */ c */"));
        assert!(matches!(entries[1].token, Token::Identifier(ref s) if s == "x"));
    }

    #[test]
    fn test_unterminated_comment_is_invalid() {
        let tokens = lex("x /* never closed");
        assert!(matches!(
            tokens[1],
            Token::Invalid { reason: InvalidTokenReason::UnterminatedComment, .. }
        ));
    }

    #[test]
    fn test_keywords_identifiers_and_pound_keywords() {
        let tokens = lex("`class` _ _x $0 #file #selector # self");
        assert!(matches!(tokens[0], Token::BacktickIdentifier(ref s) if s == "class"));
        assert_eq!(tokens[1], Token::Keyword(Keyword::Underscore));
        assert!(matches!(tokens[2], Token::Identifier(ref s) if s == "_x"));
        assert!(matches!(tokens[3], Token::Identifier(ref s) if s == "$0"));
        assert_eq!(tokens[4], Token::PoundKeyword(PoundKeyword::File));
        assert_eq!(tokens[5], Token::PoundKeyword(PoundKeyword::Selector));
        assert_eq!(tokens[6], punct(Punctuator::Hash));
        assert_eq!(tokens[7], Token::Keyword(Keyword::SelfValue));
    }

    #[test]
    fn test_unicode_identifiers() {
        let tokens = lex("let 🙂 = café + π2 + x\u{0301}");
        assert!(matches!(tokens[1], Token::Identifier(ref s) if s == "🙂"));
        assert!(matches!(tokens[3], Token::Identifier(ref s) if s == "café"));
        assert!(matches!(tokens[5], Token::Identifier(ref s) if s == "π2"));
        assert!(matches!(tokens[7], Token::Identifier(ref s) if s == "x\u{0301}"));
        assert!(!tokens.iter().any(|t| matches!(t, Token::Invalid { .. })));

        // U+10FFFD is outside the identifier planes
        assert!(matches!(lex("\u{10FFFD}")[0], Token::Invalid { .. }));
    }

    #[test]
    fn test_columns_count_unicode_scalars() {
        let file = SourceFile::in_memory("let 🙂 = 1");
        let entries = Lexer::new(&file).tokenize();
        let names: Vec<_> = entries.iter().filter(|e| !e.token.is_trivia()).collect();
        assert_eq!((names[1].range.start.column, names[1].range.end.column), (5, 6));
        assert_eq!(names[2].range.start.column, 7);
    }

    #[test]
    fn test_token_ranges() {
        let file = SourceFile::in_memory("ab\n  cd");
        let entries = Lexer::new(&file).tokenize();

        assert_eq!((entries[0].range.start.column, entries[0].range.end.column), (1, 3));
        // whitespace run crosses the line feed
        assert_eq!(entries[1].range.end.line, 2);
        assert_eq!(entries[1].range.end.column, 3);
        assert_eq!(entries[2].range.start.line, 2);
        assert_eq!((entries[2].range.start.column, entries[2].range.end.column), (3, 5));
    }
}
