//! Header normalization for raw spreadsheet column labels.

/// Canonicalize one raw header label: trim, lowercase, spaces to underscores,
/// and transliterate the accented Latin characters that occur in the source
/// exports.
pub fn normalize_header(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}

/// Normalize an ordered sequence of header labels. Output has the same length
/// and order as the input; duplicates are not resolved here.
pub fn normalize_headers<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|l| normalize_header(l.as_ref()))
        .collect()
}
