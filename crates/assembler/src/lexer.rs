//! Tokenizer for Tarn assembly text.

use crate::error::AsmError;

/// A single token from an assembly line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A mnemonic, function name, label reference or keyword. Case is kept;
    /// mnemonics are matched case-insensitively by the parser.
    Ident(String),
    /// A numeric literal, kept as written. The parser decides whether it is
    /// an operand, an integer, a float or a decimal.
    Number(String),
    /// A double-quoted string literal with escapes resolved.
    Str(String),
    /// A `.name` directive, lowercased, without the dot.
    Directive(String),
    /// A `name:` label definition, without the colon.
    Label(String),
}

impl Token {
    /// The token as it would appear in source, for error messages.
    pub(crate) fn text(&self) -> String {
        match self {
            Token::Ident(s) | Token::Number(s) => s.clone(),
            Token::Str(s) => format!("{s:?}"),
            Token::Directive(s) => format!(".{s}"),
            Token::Label(s) => format!("{s}:"),
        }
    }
}

/// Tokenize a single line of assembly text.
///
/// Returns an empty Vec for blank lines and comment-only lines.
/// Comments start with `;` outside a string and extend to end of line.
pub(crate) fn tokenize_line(line: &str, line_num: usize) -> Result<Vec<Token>, AsmError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == ';' {
            break;
        }
        if c == '"' {
            chars.next();
            tokens.push(Token::Str(string_literal(&mut chars, line_num)?));
            continue;
        }

        let mut end = line.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == ';' || c == '"' {
                end = i;
                break;
            }
            chars.next();
        }
        tokens.push(classify(&line[start..end]));
    }

    Ok(tokens)
}

fn string_literal(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line_num: usize,
) -> Result<String, AsmError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(AsmError::UnterminatedString { line: line_num }),
            Some((_, '"')) => return Ok(text),
            Some((_, '\\')) => {
                let escaped = match chars.next() {
                    None => return Err(AsmError::UnterminatedString { line: line_num }),
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, 'r')) => '\r',
                    Some((_, '0')) => '\0',
                    Some((_, '\\')) => '\\',
                    Some((_, '"')) => '"',
                    Some((_, other)) => {
                        return Err(AsmError::UnexpectedToken {
                            line: line_num,
                            token: format!("\\{other}"),
                        })
                    }
                };
                text.push(escaped);
            }
            Some((_, c)) => text.push(c),
        }
    }
}

fn classify(word: &str) -> Token {
    if let Some(name) = word.strip_suffix(':').filter(|n| !n.is_empty()) {
        return Token::Label(name.to_string());
    }
    if let Some(name) = word
        .strip_prefix('.')
        .filter(|n| n.starts_with(|c: char| c.is_ascii_alphabetic()))
    {
        return Token::Directive(name.to_ascii_lowercase());
    }
    if looks_numeric(word) {
        Token::Number(word.to_string())
    } else {
        Token::Ident(word.to_string())
    }
}

fn looks_numeric(word: &str) -> bool {
    let body = word
        .strip_prefix('-')
        .or_else(|| word.strip_prefix('+'))
        .unwrap_or(word);
    let mut bytes = body.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_digit() => true,
        Some(b'.') => bytes.next().is_some_and(|b| b.is_ascii_digit()),
        _ => false,
    }
}

/// Escape a string for use inside a double-quoted literal.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
