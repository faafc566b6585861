const GB: u64 = 1024 * 1024 * 1024;

/// Whole gigabytes, truncated.
pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / GB
}

/// Renders rows as `<key right-aligned> <value>` lines.
///
/// The key column is as wide as the longest key plus one space of padding.
pub fn render_aligned<K: AsRef<str>, V: AsRef<str>>(rows: &[(K, V)]) -> String {
    let width = rows
        .iter()
        .map(|(k, _)| k.as_ref().chars().count())
        .max()
        .unwrap_or(0)
        + 1;

    let mut out = String::new();
    for (key, value) in rows {
        out.push_str(&format!("{:>width$} {}\n", key.as_ref(), value.as_ref()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gb_conversion_truncates() {
        assert_eq!(bytes_to_gb(0), 0);
        assert_eq!(bytes_to_gb(GB - 1), 0);
        assert_eq!(bytes_to_gb(GB), 1);
        assert_eq!(bytes_to_gb(16 * GB + GB / 2), 16);
    }

    #[test]
    fn aligns_keys_right() {
        let rows = [("OS", "linux"), ("Kernel", "6.1.0")];
        assert_eq!(render_aligned(&rows), "     OS linux\n Kernel 6.1.0\n");
    }

    #[test]
    fn empty_rows_render_nothing() {
        let rows: [(&str, &str); 0] = [];
        assert_eq!(render_aligned(&rows), "");
    }
}
