//! Message of the day.

use std::path::Path;

use tracing::warn;

/// Longest MOTD output line, in bytes.
const MOTD_WRAP: usize = 80;

/// Load the MOTD, falling back to a built-in block when the file is
/// absent or unreadable. Lines are wrapped to 80 bytes.
pub fn load(path: Option<&str>) -> Vec<String> {
    let raw = match path {
        Some(path) => match std::fs::read_to_string(Path::new(path)) {
            Ok(content) => content,
            Err(e) => {
                warn!(%path, error = %e, "Failed to read MOTD file, using default");
                return default_motd();
            }
        },
        None => return default_motd(),
    };

    raw.lines().flat_map(wrap_line).collect()
}

fn default_motd() -> Vec<String> {
    vec![
        "Welcome to cinderd.".to_string(),
        "This server has no MOTD file configured.".to_string(),
    ]
}

/// Split one source line into chunks of at most `MOTD_WRAP` bytes,
/// never cutting through a UTF-8 sequence.
fn wrap_line(line: &str) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut out = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        if rest.len() <= MOTD_WRAP {
            out.push(rest.to_string());
            break;
        }
        let mut cut = MOTD_WRAP;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn wraps_long_lines_to_80_bytes() {
        let long = "x".repeat(200);
        let wrapped = wrap_line(&long);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[0].len(), 80);
        assert_eq!(wrapped[1].len(), 80);
        assert_eq!(wrapped[2].len(), 40);
    }

    #[test]
    fn wrap_respects_utf8_boundaries() {
        // 'é' is two bytes; 41 of them straddle the 80-byte mark.
        let line = "é".repeat(41);
        let wrapped = wrap_line(&line);
        assert_eq!(wrapped.len(), 2);
        assert!(wrapped[0].len() <= 80);
        assert_eq!(wrapped.concat(), line);
    }

    #[test]
    fn empty_lines_survive() {
        assert_eq!(wrap_line(""), vec![String::new()]);
    }

    #[test]
    fn loads_from_file_and_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "line one").unwrap();
        writeln!(file, "{}", "y".repeat(100)).unwrap();
        let lines = load(Some(file.path().to_str().unwrap()));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "line one");
        assert_eq!(lines[1].len(), 80);

        assert_eq!(load(None), default_motd());
        assert_eq!(load(Some("/nonexistent/motd.txt")), default_motd());
    }
}
