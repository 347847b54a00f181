//! Pure string transforms shared by the cleaning run and the record creator.
//!
//! - [`comparison_key`]: projection used for matching (`"Mr. Mime"` → `"mrmime"`)
//! - [`display_form`]: canonical rendering (`"mr-mime"` → `"Mr Mime"`)
//! - [`is_junk`]: names that carry no word characters at all
//!
//! Both transforms are deterministic and idempotent.

/// Lowercase, ASCII-alphanumeric-only projection of `raw`.
pub fn comparison_key(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Title-cased, hyphen-normalized rendering of `raw`.
///
/// Hyphens become spaces, every space-separated token gets an uppercase
/// first character and lowercase remainder, and tokens are rejoined with a
/// single space. Empty input is returned unchanged.
pub fn display_form(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    raw.replace('-', " ")
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    // Multi-char uppercase expansions (ß → SS) keep only their head upper.
    let mut upper = first.to_uppercase();
    let head = upper.next().unwrap_or(first);
    std::iter::once(head)
        .chain(upper.flat_map(char::to_lowercase))
        .chain(chars.flat_map(char::to_lowercase))
        .collect()
}

/// True when a stored name is absent, blank, or has no word character.
pub fn is_junk(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(name) => name.trim().is_empty() || !name.chars().any(is_word_char),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
