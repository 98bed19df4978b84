use lazy_regex::regex_replace_all;

/// Makes a video title safe to use as a file name.
///
/// Every character other than a word character, `-`, `_`, `.` or a space is
/// replaced with `_`.
///
/// ```
/// use grabcore::core::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("AC/DC: Live?"), "AC_DC_ Live_");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let safe = regex_replace_all!(r"[^\w\-. ]", title, "_").into_owned();
    if safe.trim().is_empty() {
        "video".to_string()
    } else {
        safe
    }
}

/// First eight characters of an identifier, used to disambiguate file names.
pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(idx, _)| &id[..idx])
}
