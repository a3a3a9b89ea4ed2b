use crate::error::{Error, Result};
use crate::ir::FunctionRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// <complexity> <package> <function> <file>:<line>:<column>
static ANALYZER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s+(\S+)\s+(.+?)\s+(\S.*):(\d+):(\d+)$").unwrap()
});
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Average:\s").unwrap());

/// Decode function records from either a JSON array or analyzer text output.
///
/// JSON is detected by a leading `[`. Text input skips blank lines, `#`
/// comments and the trailing `Average:` summary line.
pub fn parse_records(input: &str) -> Result<Vec<FunctionRecord>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        let records: Vec<FunctionRecord> = serde_json::from_str(trimmed)?;
        debug!(records = records.len(), "decoded JSON records");
        return Ok(records);
    }

    let mut records = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || SUMMARY_RE.is_match(line) {
            continue;
        }
        records.push(parse_analyzer_line(line, idx + 1)?);
    }
    debug!(records = records.len(), "decoded analyzer lines");
    Ok(records)
}

fn parse_analyzer_line(line: &str, line_no: usize) -> Result<FunctionRecord> {
    let caps = ANALYZER_LINE_RE.captures(line).ok_or_else(|| Error::Input {
        line: line_no,
        reason: format!("expected `<complexity> <package> <function> <file>:<line>:<column>`, got `{line}`"),
    })?;
    let number = |idx: usize, what: &str| -> Result<u32> {
        caps[idx].parse().map_err(|_| Error::Input {
            line: line_no,
            reason: format!("{what} `{}` is out of range", &caps[idx]),
        })
    };
    Ok(FunctionRecord {
        name: caps[3].to_string(),
        file: caps[4].to_string(),
        line: number(5, "line")?,
        column: number(6, "column")?,
        complexity: number(1, "complexity")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyzer_output() {
        let input = "\
14 server (*Server).handle internal/server/server.go:42:1
3 main main cmd/tool/main.go:10:1
Average: 8.5
";
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "(*Server).handle");
        assert_eq!(records[0].file, "internal/server/server.go");
        assert_eq!(records[0].complexity, 14);
        assert_eq!(records[0].location().to_string(), "internal/server/server.go:42:1");
        assert_eq!(records[1].name, "main");
    }

    #[test]
    fn parses_json_array_with_optional_position() {
        let input = r#"[
            {"name": "Parse", "file": "parse.go", "line": 4, "column": 2, "complexity": 9},
            {"name": "Lex", "file": "lex.go", "complexity": 21}
        ]"#;
        let records = parse_records(input).unwrap();
        assert_eq!(records[0], FunctionRecord::new("Parse", "parse.go", 9).at(4, 2));
        assert_eq!(records[1].line, 0);
        assert_eq!(records[1].complexity, 21);
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("\n# nothing measured\n").unwrap().is_empty());
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn reports_offending_line() {
        let input = "2 pkg ok a.go:1:1\n\nnot a record\n";
        match parse_records(input) {
            Err(Error::Input { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("not a record"));
            }
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_overflowing_complexity() {
        let err = parse_records("99999999999 pkg f a.go:1:1").unwrap_err();
        assert!(err.to_string().contains("complexity"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_records("[{\"name\": 1}]"), Err(Error::Json(_))));
    }
}
