//! # Name Sanitizer
//!
//! Replaces characters that are illegal in filesystem path segments.
//!
//! Used for every payload-derived folder segment (tax ID, department) and
//! every filename component (company, branch, type, subject, extension).

/// Characters that may not appear in a path segment.
pub const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replacement used for every forbidden character.
pub const REPLACEMENT_CHAR: char = '_';

/// Replace each forbidden character in `name` with `_`.
///
/// Total and idempotent: the output never contains a forbidden character, so
/// sanitizing twice yields the same string.
///
/// # Examples
///
/// ```
/// use document_center_core::sanitize::sanitize_segment;
///
/// assert_eq!(sanitize_segment("a<b>c"), "a_b_c");
/// assert_eq!(sanitize_segment("Fiscal"), "Fiscal");
/// ```
pub fn sanitize_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if is_forbidden(c) {
                REPLACEMENT_CHAR
            } else {
                c
            }
        })
        .collect()
}

/// Check whether `c` is illegal in a path segment
pub fn is_forbidden(c: char) -> bool {
    FORBIDDEN_CHARS.contains(&c)
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
