use std::path::Path;

/// A source counts as a URL when it parses and names a host.
pub fn is_url(source: &str) -> bool {
    url::Url::parse(source)
        .map(|u| u.has_host())
        .unwrap_or(false)
}

pub fn is_valid_source(source: &str) -> bool {
    is_url(source) || Path::new(source).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url_accepts_http_links() {
        assert!(is_url("https://valid.example/a.md"));
        assert!(is_url("http://example.com"));
        assert!(is_url("ftp://files.example.org/readme.md"));
    }

    #[test]
    fn test_is_url_rejects_paths_and_bare_words() {
        assert!(!is_url("/nonexistent/path"));
        assert!(!is_url("relative/file.md"));
        assert!(!is_url("C:\\docs\\file.md"));
        assert!(!is_url("mailto:someone@example.com"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_is_valid_source_checks_file_existence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "text").unwrap();

        assert!(is_valid_source(file.to_str().unwrap()));
        assert!(!is_valid_source(dir.path().to_str().unwrap()));
        assert!(!is_valid_source("/nonexistent/path"));
    }
}
