use anyhow::{bail, Context, Result};
use std::path::Path;

/// Reads the watchlist file: one mount path per line, `#` lines are
/// comments, blank lines are ignored.
///
/// # Errors
///
/// Fails when the file cannot be read or when the resulting watch set is
/// empty — both are fatal configuration errors at startup.
pub fn load_watchlist(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read watchlist '{}'", path.display()))?;
    let mounts = parse_watchlist(&content);
    if mounts.is_empty() {
        bail!(
            "watchlist '{}' contains no mount points; nothing to monitor",
            path.display()
        );
    }
    Ok(mounts)
}

fn parse_watchlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mounts_skipping_comments_and_blanks() {
        let content = "# watched mounts\n/\n\n  /data  \n# disabled:\n#/backup\n";
        assert_eq!(parse_watchlist(content), vec!["/", "/data"]);
    }

    #[test]
    fn empty_watch_set_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.txt");
        std::fs::write(&path, "# only comments\n\n").unwrap();
        assert!(load_watchlist(&path).is_err());
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_watchlist(Path::new("/nonexistent/watchlist.txt")).is_err());
    }
}
