/// Extract the first balanced `{...}` object from noisy model output.
///
/// Depth-counting over braces rather than a regex, so nested objects are
/// handled correctly. Returns `None` when there is no opening brace or the
/// first object never closes.
pub fn first_json_object(text: &str) -> Option<&str> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    // Fast path: already looks like a lone JSON object.
    if s.starts_with('{') && s.ends_with('}') {
        return Some(s);
    }

    let start = s.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in s[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + offset + ch.len_utf8()].trim());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_object_in_noise() {
        let text = "noise {\"a\":{\"b\":1}} trailing";
        assert_eq!(first_json_object(text), Some("{\"a\":{\"b\":1}}"));
    }

    #[test]
    fn unbalanced_input_yields_none() {
        assert_eq!(first_json_object("{ {"), None);
        assert_eq!(first_json_object("prefix { \"open\": true"), None);
    }

    #[test]
    fn fast_path_returns_whole_object() {
        let text = "  {\"intent\":\"faq\",\"reply\":\"x\"}  ";
        assert_eq!(
            first_json_object(text),
            Some("{\"intent\":\"faq\",\"reply\":\"x\"}")
        );
    }

    #[test]
    fn no_braces_yields_none() {
        assert_eq!(first_json_object("plain prose, no json here"), None);
        assert_eq!(first_json_object(""), None);
        assert_eq!(first_json_object("   "), None);
    }

    #[test]
    fn multibyte_text_around_object() {
        let text = "Ево одговора: {\"reply\":\"Zdravo, čao\"} крај";
        assert_eq!(first_json_object(text), Some("{\"reply\":\"Zdravo, čao\"}"));
    }
}
