//! Shared lexical tokenizer.
//!
//! The tokenizer is part of the public index contract: the sparse index
//! and query-time lookups must produce identical tokens or scores are
//! meaningless. Rules: lowercase, replace every character that is not a
//! word character, whitespace, or one of `áéíóúñü` with a space, split
//! on whitespace, drop empties.

use std::sync::LazyLock;

use regex::Regex;

/// Characters outside the token alphabet. The accented vowels and `ñ`/`ü`
/// are already word characters under Unicode `\w`; the explicit set keeps
/// the contract readable and byte-for-byte stable.
#[allow(clippy::unwrap_used)]
static NON_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\sáéíóúñü]").unwrap());

/// Tokenizes text for sparse indexing and querying.
///
/// # Examples
///
/// ```
/// use testigo::index::tokenize;
///
/// assert_eq!(
///     tokenize("¿Quién es Alaniso?"),
///     vec!["quién", "es", "alaniso"]
/// );
/// ```
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_TOKEN.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .map(ToString::to_string)
        .collect()
}
