/// Escapes raw control characters (U+0000..U+001F) that appear inside JSON string
/// literals, so exports written by lax serialisers still parse. Characters outside
/// strings are left untouched; whitespace there is already legal JSON.
pub fn escape_control_chars(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c < ' ' {
                out.push_str(&format!("\\u{:04x}", c as u32));
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_only_inside_strings() {
        let input = "[\n{\"a\": \"line1\nline2\ttab\"}\n]";
        let output = escape_control_chars(input);
        assert_eq!(output, "[\n{\"a\": \"line1\\u000aline2\\u0009tab\"}\n]");
    }

    #[test]
    fn test_escaped_quote_keeps_string_open() {
        let input = "[\"say \\\"hi\\\"\n\"]";
        let output = escape_control_chars(input);
        assert_eq!(output, "[\"say \\\"hi\\\"\\u000a\"]");
    }

    #[test]
    fn test_clean_input_unchanged() {
        let input = r#"[{"posted": "Mon, 01 Jan 2024 12:00:00 GMT"}]"#;
        assert_eq!(escape_control_chars(input), input);
    }
}
