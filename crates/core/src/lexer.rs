use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords — distinguished in the parser
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Numeric literal — kept as string to preserve exact representation
    Number(String),
    // Punctuation
    LParen,
    RParen,
    Comma,
    Dot,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    // Logical operators (symbolic forms; `and`/`or`/`not` arrive as words)
    And,
    Or,
    Not,
    // End of input
    Eof,
}

impl Token {
    /// Human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{}'", w),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Number(n) => format!("number {}", n),
            Token::LParen => "'('".to_owned(),
            Token::RParen => "')'".to_owned(),
            Token::Comma => "','".to_owned(),
            Token::Dot => "'.'".to_owned(),
            Token::Eq => "'=='".to_owned(),
            Token::Neq => "'!='".to_owned(),
            Token::Lt => "'<'".to_owned(),
            Token::Lte => "'<='".to_owned(),
            Token::Gt => "'>'".to_owned(),
            Token::Gte => "'>='".to_owned(),
            Token::Plus => "'+'".to_owned(),
            Token::Minus => "'-'".to_owned(),
            Token::Star => "'*'".to_owned(),
            Token::Slash => "'/'".to_owned(),
            Token::And => "'&&'".to_owned(),
            Token::Or => "'||'".to_owned(),
            Token::Not => "'!'".to_owned(),
            Token::Eof => "end of expression".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Character offset of the token's first character.
    pub offset: usize,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        // String literal, single or double quoted
        if c == '"' || c == '\'' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(ParseError::new(start, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == quote {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(ParseError::new(start, "unterminated escape in string"));
                    }
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\'' => s.push('\''),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                offset: start,
            });
            continue;
        }

        // Number: digits with an optional fractional part
        if c.is_ascii_digit() {
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                pos += 1; // consume '.'
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            if pos < chars.len() && (chars[pos].is_alphabetic() || chars[pos] == '_') {
                return Err(ParseError::new(
                    pos,
                    format!("unexpected character '{}' after number", chars[pos]),
                ));
            }
            let s: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Number(s),
                offset: start,
            });
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' || c == '$' {
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Word(word),
                offset: start,
            });
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::Eq, 2),
            ('=', _) => {
                return Err(ParseError::new(
                    start,
                    "unexpected '='; use '==' for equality",
                ))
            }
            ('!', Some('=')) => (Token::Neq, 2),
            ('!', _) => (Token::Not, 1),
            ('<', Some('=')) => (Token::Lte, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Gte, 2),
            ('>', _) => (Token::Gt, 1),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('&', _) | ('|', _) => {
                return Err(ParseError::new(
                    start,
                    format!("unexpected '{}'; use '{}{}' or the keyword form", c, c, c),
                ))
            }
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            // Unicode operators
            ('\u{2227}', _) => (Token::And, 1),
            ('\u{2228}', _) => (Token::Or, 1),
            ('\u{00AC}', _) => (Token::Not, 1),
            ('\u{2260}', _) => (Token::Neq, 1),
            ('\u{2264}', _) => (Token::Lte, 1),
            ('\u{2265}', _) => (Token::Gte, 1),
            _ => {
                return Err(ParseError::new(
                    start,
                    format!("unexpected character '{}'", c),
                ))
            }
        };
        tokens.push(Spanned {
            token,
            offset: start,
        });
        pos += width;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: chars.len(),
    });
    Ok(tokens)
}
