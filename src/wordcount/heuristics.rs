//! # Heurísticas de conteo
//! src/wordcount/heuristics.rs
//!
//! No hay una única definición de "palabra visible" en una página HTML, así
//! que se cuentan varias aproximaciones y el reporte se queda con la menor.
//! Una palabra es una secuencia maximal de letras ASCII (`[a-zA-Z]+`).
//!
//! | Heurística      | Texto considerado                                          |
//! |-----------------|------------------------------------------------------------|
//! | `data_segments` | todo texto fuera de tags y comentarios (incluye scripts)   |
//! | `visible_text`  | igual, sin `script`, `style`, `head` ni `title`             |
//! | `rendered_body` | sólo `<body>`, como se vería renderizado                   |

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Función de conteo sobre un documento HTML
pub type Heuristic = fn(&str) -> usize;

/// Heurísticas en el orden en que se reportan
pub const HEURISTICS: [(&str, Heuristic); 3] = [
    ("data_segments", data_segments),
    ("visible_text", visible_text),
    ("rendered_body", rendered_body),
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[a-zA-Z]+"));

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<!--.*?-->"));

/// Cualquier tag, declaración (`<!DOCTYPE>`) o instrucción (`<?xml?>`)
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]*>"));

/// Tag de apertura o cierre con nombre capturado
static NAMED_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"<\s*/?\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>"));

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<body\b[^>]*>(.*?)(?:</body\s*>|\z)"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});"));

static INVISIBLE_ELEMENTS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| element_patterns(&["script", "style", "head", "title"]));

static NON_RENDERED_ELEMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    element_patterns(&["script", "style", "noscript", "template", "head", "title"])
});

/// Tags que el navegador muestra en su propia línea
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hard-coded pattern is valid")
}

/// Un patrón por elemento: el crate `regex` no tiene backreferences
fn element_patterns(tags: &[&str]) -> Vec<Regex> {
    tags.iter()
        .map(|tag| pattern(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")))
        .collect()
}

fn strip_elements(html: &str, elements: &[Regex]) -> String {
    elements.iter().fold(html.to_string(), |text, re| {
        re.replace_all(&text, " ").into_owned()
    })
}

/// Número de palabras en un texto plano
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Palabras en todos los segmentos de datos del documento
///
/// Quita comentarios y tags; el contenido de `script` y `style` cuenta.
pub fn data_segments(html: &str) -> usize {
    let text = COMMENT_RE.replace_all(html, " ");
    let text = TAG_RE.replace_all(&text, " ");
    count_words(&decode_entities(&text))
}

/// Palabras en el texto visible, sin elementos que nunca se muestran
pub fn visible_text(html: &str) -> usize {
    let text = COMMENT_RE.replace_all(html, " ");
    let text = strip_elements(&text, &INVISIBLE_ELEMENTS);
    let text = TAG_RE.replace_all(&text, " ");
    count_words(&decode_entities(&text))
}

/// Palabras en el cuerpo renderizado
pub fn rendered_body(html: &str) -> usize {
    count_words(&render_text(html))
}

/// Aproxima el texto que muestra un navegador
///
/// Usa sólo el contenido de `<body>` (o el documento completo si no hay
/// body). Los tags de bloque se vuelven saltos de línea y los inline
/// desaparecen sin separar el texto que los rodea.
pub fn render_text(html: &str) -> String {
    let body = BODY_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or(html, |m| m.as_str());

    let text = COMMENT_RE.replace_all(body, "");
    let text = strip_elements(&text, &NON_RENDERED_ELEMENTS);
    let text = NAMED_TAG_RE.replace_all(&text, |caps: &Captures| {
        let name = caps[1].to_ascii_lowercase();
        if BLOCK_TAGS.contains(&name.as_str()) {
            "\n"
        } else {
            ""
        }
    });
    // Declaraciones sueltas y restos de markup sin nombre
    let text = TAG_RE.replace_all(&text, "");

    decode_entities(&text)
}

/// Decodifica entidades HTML con nombre comunes y todas las numéricas
///
/// Las entidades desconocidas o inválidas se dejan tal cual.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity.strip_prefix('#') {
                Some(num) => decode_numeric(num).map(String::from),
                None => named_entity(entity).map(String::from),
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_numeric(num: &str) -> Option<char> {
    let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
    };
    char::from_u32(code)
}

fn named_entity(name: &str) -> Option<&'static str> {
    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        _ => return None,
    };
    Some(decoded)
}
