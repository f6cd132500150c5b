//! Sustitución de etiquetas humanas por identificadores canónicos.

use well_domain::fields::LABELS_LONGEST_FIRST;

use super::lexer::is_ident_char;

/// Reemplaza cada etiqueta conocida que aparezca como token completo.
///
/// Se prueba siempre la etiqueta más larga primero y la coincidencia exige
/// que los caracteres vecinos no formen parte de un identificador, de modo
/// que `液量` nunca se sustituye dentro de `液量/斗数` ni de `日产液量`.
pub fn substitute_labels(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut i = 0;

    'scan: while i < text.len() {
        let rest = &text[i..];
        if !prev.is_some_and(is_ident_char) {
            for (label, canonical) in LABELS_LONGEST_FIRST.iter() {
                if !rest.starts_with(label) {
                    continue;
                }
                let after = rest[label.len()..].chars().next();
                if after.is_some_and(is_ident_char) {
                    continue;
                }
                out.push_str(canonical);
                prev = label.chars().last();
                i += label.len();
                continue 'scan;
            }
        }
        let Some(c) = rest.chars().next() else { break };
        out.push(c);
        prev = Some(c);
        i += c.len_utf8();
    }
    out
}
