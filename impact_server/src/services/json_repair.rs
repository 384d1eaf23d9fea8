//! Best-effort recovery of a JSON document from pasted or uploaded text.
//!
//! Handles HTML-wrapped payloads (saved web pages, `<pre>` dumps), HTML
//! entities, trailing commas, stray closing brackets and truncated input.
//! Every fix is reported so the caller can surface it as a warning.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<pre\b[^>]*>(.*?)</\s*pre\s*>",
        r"|<code\b[^>]*>(.*?)</\s*code\s*>",
        r#"|<script\b[^>]*\btype\s*=\s*["']application/(?:ld\+)?json["'][^>]*>(.*?)</\s*script\s*>"#,
    ))
    .unwrap()
});
static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</\s*script\s*>").unwrap());
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

const LITERALS: [&str; 3] = ["true", "false", "null"];

/// The recovered document plus a description of each fix applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub repairs: Vec<String>,
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, "").into_owned()
}

/// Pull the JSON-bearing text out of an HTML document.
fn unwrap_html(input: &str, repairs: &mut Vec<String>) -> String {
    let block = BLOCK_REGEX
        .captures_iter(input)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| decode_entities(&strip_tags(m.as_str())))
        .find(|body| body.contains('{') || body.contains('['));

    match block {
        Some(body) => {
            repairs.push("Extracted JSON from an HTML code block".to_string());
            body
        }
        None => {
            repairs.push("Stripped HTML markup around the JSON".to_string());
            let without_scripts = SCRIPT_REGEX.replace_all(input, "");
            decode_entities(&strip_tags(&without_scripts))
        }
    }
}

/// Drop a structural trailing comma; returns whether one was removed.
fn strip_trailing_comma(out: &mut String) -> bool {
    let trimmed = out.trim_end().len();
    if out[..trimmed].ends_with(',') {
        out.truncate(trimmed - 1);
        true
    } else {
        false
    }
}

/// Finish a literal cut off mid-word (`tru` → `true`).
fn complete_literal(out: &mut String) -> bool {
    let word_start = out
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let word = &out[word_start..];
    if word.is_empty() {
        return false;
    }
    match LITERALS
        .iter()
        .find(|lit| lit.len() > word.len() && lit.starts_with(word))
    {
        Some(lit) => {
            let rest = &lit[word.len()..];
            out.push_str(rest);
            true
        }
        None => false,
    }
}

/// Locate the first JSON document in `input` and repair it if needed.
///
/// Returns `None` when no `{` or `[` exists in the (unwrapped) input.
pub fn extract_json(input: &str) -> Option<Extracted> {
    let mut repairs = Vec::new();

    let text = if input.trim_start().starts_with('<') {
        unwrap_html(input, &mut repairs)
    } else {
        input.to_string()
    };

    let start = text.find(['{', '['])?;
    if !text[..start].trim().is_empty() {
        repairs.push("Ignored text before the JSON document".to_string());
    }
    let body = &text[start..];

    let mut out = String::with_capacity(body.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_start = 0;
    let mut trailing_commas = 0;
    let mut skipped_closers = 0;
    let mut consumed = body.len();

    for (idx, ch) in body.char_indices() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                string_start = out.len();
                in_string = true;
                out.push(ch);
            }
            '{' => {
                stack.push('}');
                out.push(ch);
            }
            '[' => {
                stack.push(']');
                out.push(ch);
            }
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    if strip_trailing_comma(&mut out) {
                        trailing_commas += 1;
                    }
                    stack.pop();
                    out.push(ch);
                    if stack.is_empty() {
                        consumed = idx + ch.len_utf8();
                        break;
                    }
                } else {
                    skipped_closers += 1;
                }
            }
            _ => out.push(ch),
        }
    }

    if !stack.is_empty() {
        if in_string {
            if escaped {
                out.pop();
            }
            out.push('"');
            repairs.push("Closed an unterminated string".to_string());
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);

        if out.ends_with(':') {
            out.push_str(" null");
            repairs.push("Completed a dangling key with null".to_string());
        } else if stack.last() == Some(&'}') && out.ends_with('"') && is_key(&out, string_start) {
            out.push_str(": null");
            repairs.push("Completed a dangling key with null".to_string());
        } else if complete_literal(&mut out) {
            repairs.push("Completed a truncated literal".to_string());
        } else if out.ends_with('.') {
            out.pop();
        }

        let missing = stack.len();
        while let Some(closer) = stack.pop() {
            if strip_trailing_comma(&mut out) {
                trailing_commas += 1;
            }
            out.push(closer);
        }
        repairs.push(format!(
            "Input appeared truncated; closed {missing} open bracket(s)"
        ));
    } else if !body[consumed..].trim().is_empty() {
        repairs.push("Ignored text after the JSON document".to_string());
    }

    if trailing_commas > 0 {
        repairs.push(format!("Removed {trailing_commas} trailing comma(s)"));
    }
    if skipped_closers > 0 {
        repairs.push(format!(
            "Skipped {skipped_closers} unmatched closing bracket(s)"
        ));
    }

    Some(Extracted { text: out, repairs })
}

/// Whether the string starting at `string_start` sits in key position.
fn is_key(out: &str, string_start: usize) -> bool {
    matches!(
        out[..string_start].trim_end().chars().last(),
        Some('{') | Some(',')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extracted: &Extracted) -> serde_json::Value {
        serde_json::from_str(&extracted.text).unwrap()
    }

    #[test]
    fn clean_json_passes_untouched() {
        let input = r#"{"name": "Water Forward", "sdgs": [6]}"#;
        let out = extract_json(input).unwrap();
        assert_eq!(out.text, input);
        assert!(out.repairs.is_empty());
    }

    #[test]
    fn brackets_inside_strings_are_not_counted() {
        let input = r#"{"name": "Brace {yourself} [ok]", "note": "say \"hi\" }"}"#;
        let out = extract_json(input).unwrap();
        assert_eq!(parse(&out)["name"], "Brace {yourself} [ok]");
        assert!(out.repairs.is_empty());
    }

    #[test]
    fn html_pre_block_is_unwrapped_and_decoded() {
        let input = "<html><body><h1>Export</h1><pre>{&quot;name&quot;: &quot;A &amp; B&quot;}</pre></body></html>";
        let out = extract_json(input).unwrap();
        assert_eq!(parse(&out)["name"], "A & B");
        assert_eq!(out.repairs, vec!["Extracted JSON from an HTML code block"]);
    }

    #[test]
    fn javascript_blocks_are_passed_over() {
        let input = concat!(
            "<html><head><script>window.cfg = {debug: true};</script></head>",
            r#"<body><script type="application/json">{"name": "Real Org"}</script></body></html>"#,
        );
        let out = extract_json(input).unwrap();
        assert_eq!(parse(&out)["name"], "Real Org");
        assert_eq!(out.repairs, vec!["Extracted JSON from an HTML code block"]);
    }

    #[test]
    fn inline_scripts_are_dropped_when_stripping_markup() {
        let input = r#"<div><script>var x = {a: 1};</script><p>{"name": "Green Roots"}</p></div>"#;
        let out = extract_json(input).unwrap();
        assert_eq!(parse(&out)["name"], "Green Roots");
    }

    #[test]
    fn html_without_code_block_is_stripped() {
        let input = "<div><p>{\"name\": \"Green Roots\"}</p></div>";
        let out = extract_json(input).unwrap();
        assert_eq!(parse(&out)["name"], "Green Roots");
        assert!(out.repairs[0].contains("Stripped HTML"));
    }

    #[test]
    fn truncated_object_is_closed() {
        let input = r#"{"name": "Cut", "programs": [{"name": "One"}, {"name": "Tw"#;
        let out = extract_json(input).unwrap();
        let value = parse(&out);
        assert_eq!(value["programs"][1]["name"], "Tw");
        assert!(out
            .repairs
            .iter()
            .any(|r| r.contains("closed 3 open bracket(s)")));
        assert!(out.repairs.iter().any(|r| r.contains("unterminated string")));
    }

    #[test]
    fn dangling_key_and_colon_become_null() {
        let colon = extract_json(r#"{"name": "A", "sector":"#).unwrap();
        assert_eq!(parse(&colon)["sector"], serde_json::Value::Null);

        let key = extract_json(r#"{"name": "A", "region""#).unwrap();
        assert_eq!(parse(&key)["region"], serde_json::Value::Null);
    }

    #[test]
    fn truncated_literal_and_trailing_comma_are_fixed() {
        let out = extract_json(r#"{"name": "A", "featured": tru"#).unwrap();
        assert_eq!(parse(&out)["featured"], true);

        let out = extract_json(r#"{"name": "A", "sdgs": [1, 2,"#).unwrap();
        assert_eq!(parse(&out)["sdgs"], serde_json::json!([1, 2]));
    }

    #[test]
    fn trailing_commas_are_removed() {
        let out = extract_json(r#"{"sdgs": [1, 2, ], "name": "A",}"#).unwrap();
        assert_eq!(parse(&out)["name"], "A");
        assert!(out.repairs.contains(&"Removed 2 trailing comma(s)".to_string()));
    }

    #[test]
    fn stray_closers_are_skipped() {
        let out = extract_json(r#"{"sdgs": [1]], "name": "A"}"#).unwrap();
        assert_eq!(parse(&out)["name"], "A");
        assert!(out
            .repairs
            .contains(&"Skipped 1 unmatched closing bracket(s)".to_string()));
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let out = extract_json("Here is the data: {\"name\": \"A\"} thanks!").unwrap();
        assert_eq!(parse(&out)["name"], "A");
        assert_eq!(out.repairs.len(), 2);
    }

    #[test]
    fn no_json_at_all() {
        assert!(extract_json("just some words").is_none());
        assert!(extract_json("<p>nothing here</p>").is_none());
    }
}
