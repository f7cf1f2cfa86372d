//! Token estimation utilities

/// Characters per token assumed by the estimator
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of a text as `ceil(chars / 4)`.
///
/// Counts Unicode scalar values rather than bytes so multi-byte text is not
/// overcharged.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
