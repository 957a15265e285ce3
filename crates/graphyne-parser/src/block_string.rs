//! The block string algorithms from the GraphQL specification, shared by the
//! lexer (value decoding) and the printer (value encoding).

/// Decode a raw block string (the text between `"""` quotes, after `\"""`
/// escapes are resolved) into its value: strip the common indentation of all
/// lines after the first, then drop leading and trailing blank lines.
pub fn dedent_block_string_value(raw: &str) -> String {
    let lines: Vec<&str> = split_lines(raw).collect();

    let mut common_indent = usize::MAX;
    for line in lines.iter().skip(1) {
        let indent = leading_white_space(line);
        if indent < line.len() {
            common_indent = common_indent.min(indent);
        }
    }

    let mut start = lines.len();
    let mut end = 0;
    for (i, line) in lines.iter().enumerate() {
        if !is_blank(line) {
            start = start.min(i);
            end = i + 1;
        }
    }

    let mut value = String::with_capacity(raw.len());
    for (i, line) in lines[start.min(end)..end].iter().enumerate() {
        let original_index = start + i;
        let line = if original_index == 0 || common_indent == usize::MAX {
            *line
        } else {
            &line[common_indent.min(line.len())..]
        };
        if i > 0 {
            value.push('\n');
        }
        value.push_str(line);
    }
    value
}

/// Encode a string as a block string (including the `"""` quotes) such that
/// lexing the result yields the original value back.
pub fn print_block_string(value: &str) -> String {
    let escaped = value.replace("\"\"\"", "\\\"\"\"");
    let is_single_line = !escaped.contains(['\r', '\n']);

    // If every line but the first starts with whitespace, a leading blank
    // line keeps re-lexing from stripping that whitespace as indentation.
    let force_leading_new_line = !is_single_line
        && split_lines(&escaped)
            .skip(1)
            .all(|line| line.is_empty() || starts_with_white_space(line));

    let has_trailing_triple_quotes = escaped.ends_with("\\\"\"\"");
    let has_trailing_quote = value.ends_with('"') && !has_trailing_triple_quotes;
    let has_trailing_slash = value.ends_with('\\');
    let force_trailing_new_line = has_trailing_quote || has_trailing_slash;

    let print_as_multiple_lines = !is_single_line
        || value.len() > 70
        || force_trailing_new_line
        || force_leading_new_line
        || has_trailing_triple_quotes;

    let mut result = String::with_capacity(escaped.len() + 8);
    result.push_str("\"\"\"");
    let skip_leading_new_line = is_single_line && starts_with_white_space(value);
    if (print_as_multiple_lines && !skip_leading_new_line) || force_leading_new_line {
        result.push('\n');
    }
    result.push_str(&escaped);
    if print_as_multiple_lines || force_trailing_new_line {
        result.push('\n');
    }
    result.push_str("\"\"\"");
    result
}

/// Encode a string as a single-line string literal, including the quotes.
pub fn print_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\u{0008}' => result.push_str("\\b"),
            '\u{000C}' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                result.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Split on the line terminators GraphQL recognises: LF, CR, CRLF.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match rest.find(['\r', '\n']) {
            Some(index) => {
                let line = &rest[..index];
                let after = if rest[index..].starts_with("\r\n") {
                    index + 2
                } else {
                    index + 1
                };
                rest = &rest[after..];
                Some(line)
            }
            None => {
                done = true;
                Some(rest)
            }
        }
    })
}

fn leading_white_space(line: &str) -> usize {
    line.bytes().take_while(|&b| is_white_space(b)).count()
}

fn starts_with_white_space(line: &str) -> bool {
    matches!(line.as_bytes().first(), Some(b) if is_white_space(*b))
}

fn is_blank(line: &str) -> bool {
    leading_white_space(line) == line.len()
}

fn is_white_space(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedents_and_trims_blank_lines() {
        let raw = "\n    Hello,\n      World!\n\n    Yours,\n      GraphQL.\n  ";
        assert_eq!(
            dedent_block_string_value(raw),
            "Hello,\n  World!\n\nYours,\n  GraphQL."
        );
    }

    #[test]
    fn keeps_first_line_indentation() {
        assert_eq!(dedent_block_string_value("  abc\n  def"), "  abc\ndef");
    }

    #[test]
    fn handles_all_line_terminators() {
        assert_eq!(dedent_block_string_value("a\r\n  b\r  c\n  d"), "a\nb\nc\nd");
    }

    #[test]
    fn empty_when_only_blank_lines() {
        assert_eq!(dedent_block_string_value("  \n \t \n  "), "");
    }

    #[test]
    fn prints_simple_values_on_one_line() {
        assert_eq!(print_block_string("simple"), "\"\"\"simple\"\"\"");
    }

    #[test]
    fn leading_white_space_stays_on_the_quote_line() {
        assert_eq!(
            print_block_string("  leading space"),
            "\"\"\"  leading space\"\"\""
        );
    }

    #[test]
    fn trailing_quote_forces_a_new_line() {
        assert_eq!(
            print_block_string("say \"hi\""),
            "\"\"\"\nsay \"hi\"\n\"\"\""
        );
    }

    #[test]
    fn escapes_triple_quotes() {
        assert_eq!(print_block_string("a \"\"\" b"), "\"\"\"a \\\"\"\" b\"\"\"");
    }

    #[test]
    fn multi_line_values_round_trip() {
        for value in [
            "multi\nline",
            "\tstarts with tab\nand\nnewlines",
            "ends with backslash \\",
            "ends with quote \"",
            "contains \"\"\" triple quotes\nand more",
        ] {
            let printed = print_block_string(value);
            let raw = printed
                .strip_prefix("\"\"\"")
                .unwrap()
                .strip_suffix("\"\"\"")
                .unwrap()
                .replace("\\\"\"\"", "\"\"\"");
            assert_eq!(dedent_block_string_value(&raw), value, "printed: {printed}");
        }
    }
}
