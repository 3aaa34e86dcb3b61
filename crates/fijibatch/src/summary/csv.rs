//! Minimal CSV reading and writing for measurement tables.
//!
//! Handles quoting for fields containing commas, quotes or newlines; parsing
//! accepts the same convention back. Embedded newlines inside quoted fields
//! are not supported, which matches what the external tool exports.

use std::path::Path;

pub fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

/// Reads a CSV file with a header row. Returns `None` for an empty file.
pub fn read_table(path: &Path) -> std::io::Result<Option<(Vec<String>, Vec<Vec<String>>)>> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Ok(None);
    };

    let header = parse_line(header_line);
    let rows = lines.map(parse_line).collect();

    Ok(Some((header, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_value() {
        assert_eq!(escape("42.5"), "42.5");
    }

    #[test]
    fn test_escape_comma_and_quote() {
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_format_row() {
        assert_eq!(format_row(&["a", "b,c", ""]), "a,\"b,c\",");
    }

    #[test]
    fn test_parse_plain_line() {
        assert_eq!(parse_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        assert_eq!(parse_line("a,\"b,c\",d"), vec!["a", "b,c", "d"]);
        assert_eq!(parse_line("\"say \"\"hi\"\"\""), vec!["say \"hi\""]);
    }

    #[test]
    fn test_parse_empty_fields() {
        assert_eq!(parse_line("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn test_roundtrip() {
        let fields = vec!["plain", "with,comma", "with \"quote\"", ""];
        let parsed = parse_line(&format_row(&fields));
        assert_eq!(parsed, fields);
    }

    #[test]
    fn test_read_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("table.csv");
        std::fs::write(&path, " ,Area,Mean\n1,42,7.5\n2,11,3.2\n").unwrap();

        let (header, rows) = read_table(&path).unwrap().unwrap();
        assert_eq!(header, vec![" ", "Area", "Mean"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "42", "7.5"]);
    }

    #[test]
    fn test_read_empty_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        assert!(read_table(&path).unwrap().is_none());
    }
}
