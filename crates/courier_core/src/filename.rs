use url::Url;

const MAX_STEM_LEN: usize = 100;

/// Attachment filename for a rendered article: `{stem}.pdf`.
pub fn attachment_filename(source: &str, stamp_millis: i64) -> String {
    format!("{}.pdf", attachment_stem(source, stamp_millis))
}

/// Filesystem- and mail-safe stem: the URL path (or, for non-URL input, the
/// text itself) with every non-alphanumeric character replaced by `-`,
/// lowercased, suffixed with `stamp_millis` and capped at 100 characters.
pub fn attachment_stem(source: &str, stamp_millis: i64) -> String {
    let source = source.trim();
    let basis = match Url::parse(source) {
        Ok(url) if url.has_host() => sanitize(url.path()),
        _ => sanitize(source),
    };
    let basis = if basis.is_empty() { "blog".to_string() } else { basis };

    let mut stem = format!("{basis}-{stamp_millis}");
    // Only ASCII survives sanitizing, so byte truncation is safe.
    stem.truncate(MAX_STEM_LEN);
    stem
}

fn sanitize(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_string()
}
