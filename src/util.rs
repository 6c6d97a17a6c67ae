//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// First `max` characters of `s` (char-boundary safe).
pub fn excerpt(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

/// Pull the outermost JSON array out of a model reply.
/// Models sometimes wrap JSON in ```json fences or a sentence of prose.
pub fn extract_json_array(text: &str) -> Option<&str> {
  let start = text.find('[')?;
  let end = text.rfind(']')?;
  if end < start { None } else { Some(&text[start..=end]) }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let head = excerpt(s, max);
  if head.len() == s.len() { s.to_string() } else { format!("{}… ({} bytes total)", head, s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_all_occurrences() {
    assert_eq!(fill_template("{a}-{b}-{a}", &[("a", "x"), ("b", "y")]), "x-y-x");
  }

  #[test]
  fn extracts_fenced_array() {
    let reply = "Here you go:\n```json\n[\"Federalism\", \"Judiciary\"]\n```";
    assert_eq!(extract_json_array(reply), Some("[\"Federalism\", \"Judiciary\"]"));
    assert_eq!(extract_json_array("no json here"), None);
  }

  #[test]
  fn excerpt_respects_char_boundaries() {
    assert_eq!(excerpt("भारत का संविधान", 4), "भारत");
    assert_eq!(excerpt("short", 100), "short");
    assert!(trunc_for_log("abcdef", 3).starts_with("abc…"));
  }
}
