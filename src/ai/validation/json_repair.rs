//! JSON Recovery for Model Output
//!
//! Vision models are asked for JSON but routinely wrap it in prose or code
//! fences, or stop mid-object at the token limit. `recover_json` applies
//! increasingly aggressive fixes and reports which one worked:
//!
//! 1. Direct parse after removing fences and a BOM
//! 2. Outermost balanced `{...}`/`[...]` sliced out of surrounding text
//! 3. Trailing commas removed, open strings and brackets closed

use serde_json::Value;
use tracing::debug;

/// How the JSON was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Parsed as-is (after fence removal)
    Clean,
    /// Sliced out of surrounding prose
    Extracted,
    /// Structurally repaired
    Repaired,
}

/// Recover a JSON value from model output, if any strategy succeeds
pub fn recover_json(raw: &str) -> Option<(Value, Recovery)> {
    let cleaned = strip_wrapping(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some((value, Recovery::Clean));
    }

    let start = cleaned.find(['{', '['])?;
    let candidate = &cleaned[start..];

    if let Some(end) = balanced_end(candidate)
        && let Ok(value) = serde_json::from_str::<Value>(&candidate[..end])
    {
        debug!("JSON extracted from surrounding text");
        return Some((value, Recovery::Extracted));
    }

    let repaired = close_open_structures(&drop_trailing_commas(candidate));
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => {
            debug!("JSON repaired ({} -> {} chars)", candidate.len(), repaired.len());
            Some((value, Recovery::Repaired))
        }
        Err(e) => {
            debug!("JSON recovery failed: {}", e);
            None
        }
    }
}

/// Trim whitespace, a BOM, and a surrounding markdown code fence
fn strip_wrapping(raw: &str) -> &str {
    let mut s = raw.trim().trim_start_matches('\u{feff}').trim();

    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string (e.g. "json") on the opening fence line
        s = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
        s = s.trim_end();
        s = s.strip_suffix("```").unwrap_or(s).trim();
    }

    s
}

/// Tracks string/escape state while walking JSON text
#[derive(Default)]
struct Scanner {
    in_string: bool,
    escaped: bool,
}

impl Scanner {
    /// Feed one character; returns true when it is structural (outside a string)
    fn structural(&mut self, ch: char) -> bool {
        if self.escaped {
            self.escaped = false;
            return false;
        }
        if self.in_string {
            match ch {
                '\\' => self.escaped = true,
                '"' => self.in_string = false,
                _ => {}
            }
            return false;
        }
        if ch == '"' {
            self.in_string = true;
            return false;
        }
        true
    }
}

/// Byte offset just past the bracket that closes the first opener
fn balanced_end(s: &str) -> Option<usize> {
    let mut scanner = Scanner::default();
    let mut depth = 0usize;

    for (i, ch) in s.char_indices() {
        if !scanner.structural(ch) {
            continue;
        }
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Remove commas that directly precede a closing bracket
fn drop_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut scanner = Scanner::default();

    for (i, &ch) in chars.iter().enumerate() {
        if scanner.structural(ch) && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Close an unterminated string and every still-open bracket, innermost first
fn close_open_structures(s: &str) -> String {
    let mut scanner = Scanner::default();
    let mut open: Vec<char> = Vec::new();

    for ch in s.chars() {
        if !scanner.structural(ch) {
            continue;
        }
        match ch {
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    let mut out = s.trim_end().to_string();
    if scanner.in_string {
        out.push('"');
    }
    // A dangling comma or colon cannot precede a closer
    while out.ends_with(',') || out.ends_with(':') {
        out.pop();
    }
    while let Some(closer) = open.pop() {
        out.push(closer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json() {
        let (value, how) = recover_json(r#"{"key": "value"}"#).unwrap();
        assert_eq!(value["key"], "value");
        assert_eq!(how, Recovery::Clean);
    }

    #[test]
    fn test_code_fence() {
        let (value, how) = recover_json("```json\n{\"key\": \"value\"}\n```").unwrap();
        assert_eq!(value["key"], "value");
        assert_eq!(how, Recovery::Clean);
    }

    #[test]
    fn test_extract_from_prose() {
        let input = "Here is the analysis:\n{\"sections\": [{\"section_name\": \"Overview\"}]}\nLet me know!";
        let (value, how) = recover_json(input).unwrap();
        assert_eq!(value["sections"][0]["section_name"], "Overview");
        assert_eq!(how, Recovery::Extracted);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let input = r#"note {"text": "a } b { c", "n": 1} trailing"#;
        let (value, _) = recover_json(input).unwrap();
        assert_eq!(value["text"], "a } b { c");
    }

    #[test]
    fn test_trailing_comma() {
        let (value, how) = recover_json(r#"{"metrics": [{"name": "CSAT"},]}"#).unwrap();
        assert!(value["metrics"].is_array());
        assert_eq!(how, Recovery::Repaired);
    }

    #[test]
    fn test_truncated_output() {
        let input = r#"{"dashboard_purpose": "Track support", "sections": [{"section_name": "Queue"#;
        let (value, how) = recover_json(input).unwrap();
        assert_eq!(how, Recovery::Repaired);
        assert_eq!(value["sections"][0]["section_name"], "Queue");
    }

    #[test]
    fn test_not_json() {
        assert!(recover_json("The dashboard shows revenue by region.").is_none());
        assert!(recover_json("   ").is_none());
    }
}
