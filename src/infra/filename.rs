//! Output filename generation from a page title and its ancestors.

/// Characters that are unsafe in filenames on at least one common platform.
const RESERVED_CHARS: &str = "|\\?*<:>+[]/";
const MAX_NAME_LENGTH: usize = 255;
const HTML_SUFFIX: &str = ".html";
const MAX_GENERATED_LENGTH: usize = MAX_NAME_LENGTH - HTML_SUFFIX.len();

/// Appends the filename-safe transliteration of `title` to `out`.
///
/// - control characters, spaces, non-ASCII and reserved characters become `_`
///   (one per UTF-16 code unit)
/// - uppercase ASCII letters become `_` plus the lowercase letter
/// - everything else is kept
fn push_transliterated(out: &mut String, title: &str) {
    for c in title.chars() {
        if c <= ' ' || c >= '\u{7f}' || RESERVED_CHARS.contains(c) {
            for _ in 0..c.len_utf16() {
                out.push('_');
            }
        } else if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
}

/// Transliterates a single title.
///
/// # Examples
///
/// ```
/// use scms::infra::transliterate;
///
/// assert_eq!(transliterate("Home"), "_home");
/// assert_eq!(transliterate("a/b c"), "a_b_c");
/// ```
pub fn transliterate(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 4);
    push_transliterated(&mut out, title);
    out
}

/// Generates the relative output filename for a page.
///
/// `ancestors` runs from the nearest (parent) to the furthest (root). Each
/// ancestor adds a separator, `_-` when its title starts with an uppercase
/// letter (whose transliteration already starts with `_`) and `_-_`
/// otherwise, followed by its transliterated title. The result is cut to
/// fit 255 bytes including `.html`, stripped of leading underscores and
/// prefixed with `./`.
///
/// # Examples
///
/// ```
/// use scms::infra::dynamic_filename;
///
/// assert_eq!(dynamic_filename("About", &["Home"]), "./about_-_home.html");
/// assert_eq!(dynamic_filename("faq", &["help"]), "./faq_-_help.html");
/// ```
pub fn dynamic_filename(title: &str, ancestors: &[&str]) -> String {
    let mut name = String::new();
    push_transliterated(&mut name, title);
    for ancestor in ancestors {
        if ancestor.chars().next().is_some_and(char::is_uppercase) {
            name.push_str("_-");
        } else {
            name.push_str("_-_");
        }
        push_transliterated(&mut name, ancestor);
    }
    // transliteration output is ASCII, so byte truncation is char-safe
    name.truncate(MAX_GENERATED_LENGTH);
    name.push_str(HTML_SUFFIX);
    format!("./{}", name.trim_start_matches('_'))
}
