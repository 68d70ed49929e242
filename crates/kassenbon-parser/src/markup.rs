//! Span-level scanning over raw receipt HTML.
//!
//! The printed receipt is a flat soup of `<span>` elements with `data-*`
//! attributes and `<br>` line breaks; there is no nesting beyond spans inside
//! spans. These helpers extract exactly what the higher modules need —
//! fragments by class, attribute values, rendered text — without a DOM.
//! Manual scanning keeps the matching rules explicit and cheap.

/// One `<span>` element: its raw attribute string and its inner HTML.
pub(crate) struct SpanFragment<'a> {
    pub attrs: &'a str,
    pub inner: &'a str,
}

/// Returns every `<span>` in document order, nested spans included.
pub(crate) fn spans(html: &str) -> Vec<SpanFragment<'_>> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while let Some(rel) = html[i..].find("<span") {
        let open = i + rel;
        let after_name = open + "<span".len();
        // Reject lookalike tags; the element name must end here.
        let boundary_ok = html[after_name..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/');
        if !boundary_ok {
            i = after_name;
            continue;
        }
        let Some(gt_rel) = html[after_name..].find('>') else {
            break;
        };
        let tag_end = after_name + gt_rel;
        let attrs = &html[after_name..tag_end];
        if attrs.trim_end().ends_with('/') {
            out.push(SpanFragment { attrs, inner: "" });
            i = tag_end + 1;
            continue;
        }
        let inner_start = tag_end + 1;
        let inner_end = matching_close(html, inner_start);
        out.push(SpanFragment {
            attrs,
            inner: &html[inner_start..inner_end],
        });
        // Resume just past the open tag so nested spans are reported too.
        i = inner_start;
    }
    out
}

/// Finds the byte offset of the `</span>` matching an open tag whose body
/// starts at `from`, accounting for nested spans. An unbalanced document
/// closes at the end of input.
fn matching_close(html: &str, from: usize) -> usize {
    let mut depth = 1usize;
    let mut j = from;
    loop {
        let next_open = html[j..].find("<span").map(|r| j + r);
        let next_close = html[j..].find("</span").map(|r| j + r);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                j = o + "<span".len();
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return c;
                }
                j = c + "</span".len();
            }
            _ => return html.len(),
        }
    }
}

/// Looks up an attribute value in a raw attribute string.
///
/// Handles double-quoted, single-quoted, and bare values; the returned value
/// is entity-decoded. Attribute-name matching requires a token boundary so
/// `id` does not match inside `data-art-id`.
pub(crate) fn attr(attrs: &str, name: &str) -> Option<String> {
    let mut search = 0usize;
    while let Some(rel) = attrs[search..].find(name) {
        let pos = search + rel;
        search = pos + 1;
        let before_ok = pos == 0
            || !attrs[..pos]
                .chars()
                .last()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !before_ok {
            continue;
        }
        let rest = attrs[pos + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        return match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let value = &rest[1..];
                let end = value.find(q)?;
                Some(decode_entities(&value[..end]))
            }
            Some(_) => {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                Some(decode_entities(&rest[..end]))
            }
            None => None,
        };
    }
    None
}

/// Returns `true` if the `class` attribute contains `class_name` as a
/// whitespace-separated token.
pub(crate) fn has_class(attrs: &str, class_name: &str) -> bool {
    attr(attrs, "class").is_some_and(|v| v.split_whitespace().any(|c| c == class_name))
}

/// Strips tags from an HTML fragment, turning `<br>` into a newline so the
/// printed line structure survives, and decodes entities.
pub(crate) fn text_content(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = after[..gt].trim().trim_start_matches('/').trim_end_matches('/');
        let name = tag
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or(tag);
        if name.eq_ignore_ascii_case("br") {
            out.push('\n');
        }
        rest = &after[gt + 1..];
    }
    out.push_str(rest);
    decode_entities(&out)
}

/// Decodes the handful of entities the portal markup actually uses.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
