use crate::expr::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,
    Comma,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;

        if ch.is_ascii_digit() || (ch == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit))
        {
            let (value, next) = read_number(&chars, pos)?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position: start,
            });
            pos = next;
            continue;
        }

        if ch == '\'' || ch == '"' {
            let (text, next) = read_string(&chars, pos)?;
            tokens.push(Spanned {
                token: Token::Text(text),
                position: start,
            });
            pos = next;
            continue;
        }

        if is_ident_start(ch) {
            let (name, next) = read_ident(&chars, pos);
            tokens.push(Spanned {
                token: Token::Ident(name),
                position: start,
            });
            pos = next;
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let after = chars.get(pos + 2).copied();
        let (token, width) = match (ch, next, after) {
            ('*', Some('*'), _) => (Token::StarStar, 2),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('!', Some('='), Some('=')) => (Token::NotEq, 3),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('!', _, _) => (Token::Bang, 1),
            ('=', Some('='), Some('=')) => (Token::EqEq, 3),
            ('=', Some('='), _) => (Token::EqEq, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('>', _, _) => (Token::Gt, 1),
            ('&', Some('&'), _) => (Token::AndAnd, 2),
            ('|', Some('|'), _) => (Token::OrOr, 2),
            ('?', _, _) => (Token::Question, 1),
            (':', _, _) => (Token::Colon, 1),
            (',', _, _) => (Token::Comma, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('=', _, _) => {
                return Err(EvalError::syntax(start, "assignment is not allowed, use '=='"));
            }
            _ => {
                return Err(EvalError::syntax(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
        pos += width;
    }

    Ok(tokens)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn read_ident(chars: &[char], mut pos: usize) -> (String, usize) {
    let mut name = String::new();
    loop {
        while pos < chars.len() && is_ident_continue(chars[pos]) {
            name.push(chars[pos]);
            pos += 1;
        }
        // dotted names such as `Math.round`
        if chars.get(pos) == Some(&'.') && chars.get(pos + 1).is_some_and(|ch| is_ident_start(*ch))
        {
            name.push('.');
            pos += 1;
            continue;
        }
        return (name, pos);
    }
}

fn read_number(chars: &[char], mut pos: usize) -> Result<(f64, usize), EvalError> {
    let start = pos;
    let mut text = String::new();
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        text.push(chars[pos]);
        pos += 1;
    }
    if chars.get(pos) == Some(&'.') {
        text.push('.');
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            text.push(chars[pos]);
            pos += 1;
        }
    }
    if matches!(chars.get(pos), Some('e') | Some('E')) {
        let mut exponent = String::from("e");
        let mut cursor = pos + 1;
        if matches!(chars.get(cursor), Some('+') | Some('-')) {
            exponent.push(chars[cursor]);
            cursor += 1;
        }
        if chars.get(cursor).is_some_and(char::is_ascii_digit) {
            while cursor < chars.len() && chars[cursor].is_ascii_digit() {
                exponent.push(chars[cursor]);
                cursor += 1;
            }
            text.push_str(&exponent);
            pos = cursor;
        }
    }
    text.parse::<f64>()
        .map(|value| (value, pos))
        .map_err(|_| EvalError::syntax(start, format!("invalid number '{text}'")))
}

fn read_string(chars: &[char], pos: usize) -> Result<(String, usize), EvalError> {
    let quote = chars[pos];
    let mut text = String::new();
    let mut cursor = pos + 1;
    while cursor < chars.len() {
        match chars[cursor] {
            '\\' => {
                let escaped = chars
                    .get(cursor + 1)
                    .copied()
                    .ok_or_else(|| EvalError::syntax(pos, "unterminated string"))?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                cursor += 2;
            }
            ch if ch == quote => return Ok((text, cursor + 1)),
            ch => {
                text.push(ch);
                cursor += 1;
            }
        }
    }
    Err(EvalError::syntax(pos, "unterminated string"))
}
