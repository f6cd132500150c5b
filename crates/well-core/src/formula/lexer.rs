//! Lexer de la aritmética restringida: números, identificadores,
//! `+ - * /` y paréntesis. Cualquier otro carácter es error.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Token con su rango de bytes en el texto de origen.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Carácter válido dentro de un identificador (incluye CJK).
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut out = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '(' | '（' => Some(TokenKind::LParen),
            ')' | '）' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = single {
            chars.next();
            out.push(Token { kind, span: start..start + c.len_utf8() });
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            // Un número pegado a letras ("2abc") no es un literal válido.
            if let Some(&(_, d)) = chars.peek() {
                if is_ident_char(d) {
                    return Err(format!("literal numérico inválido en la posición {start}"));
                }
            }
            let text = &src[start..end];
            let value = text.parse::<f64>().map_err(|_| format!("literal numérico inválido: {text}"))?;
            out.push(Token { kind: TokenKind::Number(value), span: start..end });
            continue;
        }

        if is_ident_char(c) {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if is_ident_char(d) {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            out.push(Token { kind: TokenKind::Ident(src[start..end].to_string()), span: start..end });
            continue;
        }

        return Err(format!("carácter no permitido '{c}' en la posición {start}"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_identifiers_numbers_and_operators() {
        assert_eq!(kinds("a_1 * (2.5 - b)"),
                   vec![TokenKind::Ident("a_1".into()),
                        TokenKind::Star,
                        TokenKind::LParen,
                        TokenKind::Number(2.5),
                        TokenKind::Minus,
                        TokenKind::Ident("b".into()),
                        TokenKind::RParen]);
    }

    #[test]
    fn spans_point_into_source() {
        let src = "油压+x";
        let toks = tokenize(src).unwrap();
        assert_eq!(&src[toks[0].span.clone()], "油压");
        assert_eq!(&src[toks[2].span.clone()], "x");
    }

    #[test]
    fn rejects_foreign_characters() {
        assert!(tokenize("a ** b; drop").is_err());
        assert!(tokenize("__import__('os')").is_err());
        assert!(tokenize("1.2.3").is_err());
        assert!(tokenize("2abc").is_err());
    }
}
