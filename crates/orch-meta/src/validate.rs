//! Document validation
//!
//! Pure functions, no locking. Validation failures are reported as `false` /
//! `None`, never as errors.

use serde_yaml::Value;

/// Frontmatter delimiter line
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Markdown code fence marker
pub const CODE_FENCE: &str = "```";

/// Split `text` into its raw frontmatter block and the body after it
///
/// The first line must be `---`; the block ends at the next line that is
/// exactly `---`. Returns `None` if either delimiter is missing.
#[must_use]
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == FRONTMATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse the frontmatter of `text` as YAML
///
/// Returns the parsed mapping and the remaining body. An empty block, or one
/// holding a scalar or sequence instead of key-value data, yields `None`.
#[must_use]
pub fn extract_frontmatter(text: &str) -> Option<(Value, &str)> {
    let (block, body) = split_frontmatter(text)?;
    match serde_yaml::from_str::<Value>(block) {
        Ok(value @ Value::Mapping(_)) => Some((value, body)),
        Ok(_) | Err(_) => None,
    }
}

/// Check that `text` opens with a well-formed YAML frontmatter block
#[must_use]
pub fn validate_frontmatter(text: &str) -> bool {
    extract_frontmatter(text).is_some()
}

/// Number of triple-backtick markers in `text`
#[inline]
#[must_use]
pub fn count_code_fences(text: &str) -> usize {
    text.matches(CODE_FENCE).count()
}

/// Check that every fenced code block is closed
///
/// True when the number of fence markers is even.
#[inline]
#[must_use]
pub fn validate_markdown_balance(text: &str) -> bool {
    count_code_fences(text) % 2 == 0
}
