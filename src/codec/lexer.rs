use crate::error::AcModelError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Content of `<...>`, uppercased.
    Keyword(String),
    /// Macro kind letter following `~`.
    Macro(char),
    /// Double-quoted string, quotes removed.
    Quoted(String),
    /// Any other whitespace-delimited word (numbers, bare names).
    Word(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub line: usize,
}

/// Splits HTK-ASCII text into tokens. Keywords may be glued to their
/// neighbours (`<VECSIZE> 39<NULLD><MFCC_0_D_A>`).
pub(crate) fn tokenize(text: &str, source_name: &str) -> Result<Vec<Lexeme>, AcModelError> {
    let mut lexemes = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '<' => {
                chars.next();
                let mut keyword = String::new();
                loop {
                    match chars.next() {
                        Some('>') => break,
                        Some('\n') | None => {
                            return Err(AcModelError::format(
                                source_name,
                                line,
                                "unterminated keyword",
                            ))
                        }
                        Some(k) => keyword.push(k),
                    }
                }
                lexemes.push(Lexeme {
                    token: Token::Keyword(keyword.trim().to_ascii_uppercase()),
                    line,
                });
            }
            '~' => {
                chars.next();
                let kind = chars
                    .next()
                    .filter(|k| k.is_ascii_alphabetic())
                    .ok_or_else(|| AcModelError::format(source_name, line, "bad macro marker"))?;
                lexemes.push(Lexeme {
                    token: Token::Macro(kind.to_ascii_lowercase()),
                    line,
                });
            }
            '"' => {
                chars.next();
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\n') | None => {
                            return Err(AcModelError::format(
                                source_name,
                                line,
                                "unterminated string",
                            ))
                        }
                        Some(q) => quoted.push(q),
                    }
                }
                lexemes.push(Lexeme {
                    token: Token::Quoted(quoted),
                    line,
                });
            }
            _ => {
                let mut word = String::new();
                while let Some(&w) = chars.peek() {
                    if w.is_whitespace() || w == '<' || w == '"' {
                        break;
                    }
                    word.push(w);
                    chars.next();
                }
                lexemes.push(Lexeme {
                    token: Token::Word(word),
                    line,
                });
            }
        }
    }
    Ok(lexemes)
}
