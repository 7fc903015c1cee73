//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values in a
/// single pass; substituted values are never scanned again.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let value = after
      .find('}')
      .and_then(|close| pairs.iter().find(|(k, _)| *k == &after[..close]).map(|(k, v)| (k.len(), *v)));
    match value {
      Some((key_len, v)) => {
        out.push_str(v);
        rest = &after[key_len + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Strip markdown code fences (```json ... ```) a model may wrap around JSON.
/// Falls back to the outermost `{ ... }` span when other prose surrounds it.
pub fn strip_code_fences(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix("```") {
    // Drop the language tag line, if any.
    s = match rest.find('\n') {
      Some(nl) => &rest[nl + 1..],
      None => rest,
    };
    s = s.trim_end();
    s = s.strip_suffix("```").unwrap_or(s).trim();
  }
  if s.starts_with('{') || s.starts_with('[') {
    return s;
  }
  match (s.find('{'), s.rfind('}')) {
    (Some(start), Some(end)) if start < end => &s[start..=end],
    _ => s,
  }
}

/// Char-boundary-safe prefix of at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  let head = truncate_chars(s, max);
  if head.len() == s.len() { s.to_string() } else { format!("{}… ({} bytes total)", head, s.len()) }
}
