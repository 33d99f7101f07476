use std::borrow::Cow;

use super::rhai_bridge::rhai_function_symbol;

/// Native function standing in for the host function reachable at `path` when
/// its option object is a trailing variable.
pub(crate) fn options_alias(path: &str) -> String {
    format!("sr_options_{}", rhai_function_symbol(path))
}

/// Rewrites `path(a, ..., opts)` into `alias(opts, a, ..., opts)` when the last
/// argument is a plain variable. Rhai passes only the first argument of a call by
/// reference, so the alias can store the updated object back into `opts`.
///
/// Only the callee text changes; line structure is kept so reported lines match
/// what the user typed.
pub(crate) fn route_option_calls<'a>(source: &'a str, paths: &[String]) -> Cow<'a, str> {
    if paths.is_empty() {
        return Cow::Borrowed(source);
    }
    let bytes = source.as_bytes();
    let mut out = String::new();
    let mut copied = 0;
    let mut index = 0;

    while index < bytes.len() {
        if let Some(next) = skip_literal(bytes, index) {
            index = next;
            continue;
        }
        let byte = bytes[index];
        if byte.is_ascii_digit() {
            index = word_end(bytes, index);
            continue;
        }
        if !is_word_start(byte) {
            index += 1;
            continue;
        }

        let end = chain_end(bytes, index);
        let chain = &source[index..end];
        let rewrite = paths
            .iter()
            .any(|path| path == chain)
            .then(|| call_site(source, index, end))
            .flatten();
        match rewrite {
            Some((open, options)) => {
                out.push_str(&source[copied..index]);
                out.push_str(&options_alias(chain));
                out.push('(');
                out.push_str(options);
                out.push_str(", ");
                copied = open + 1;
                index = open + 1;
            }
            None => index = end,
        }
    }

    if copied == 0 {
        return Cow::Borrowed(source);
    }
    out.push_str(&source[copied..]);
    Cow::Owned(out)
}

/// Position of the opening parenthesis and the trailing variable name, when the
/// chain at `start..end` is a free call ending in a plain variable.
fn call_site(source: &str, start: usize, end: usize) -> Option<(usize, &str)> {
    let bytes = source.as_bytes();
    let before = source[..start].trim_end();
    if before.ends_with('.') || before.ends_with(':') || ends_with_word(before, "fn") {
        return None;
    }

    let open = end + (bytes[end..].iter().take_while(|b| b.is_ascii_whitespace()).count());
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let (last_comma, close) = call_arguments(bytes, open)?;
    let last = source[last_comma.unwrap_or(open) + 1..close].trim();
    let is_variable = !last.is_empty()
        && last.bytes().next().is_some_and(is_word_start)
        && last.bytes().all(is_word_byte)
        && !matches!(last, "true" | "false" | "this");
    is_variable.then_some((open, last))
}

/// Last top-level comma and the matching closing parenthesis.
fn call_arguments(bytes: &[u8], open: usize) -> Option<(Option<usize>, usize)> {
    let mut depth = 0usize;
    let mut last_comma = None;
    let mut index = open + 1;
    while index < bytes.len() {
        if let Some(next) = skip_literal(bytes, index) {
            index = next;
            continue;
        }
        match bytes[index] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' if depth == 0 => return Some((last_comma, index)),
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => last_comma = Some(index),
            _ => {}
        }
        index += 1;
    }
    None
}

/// End of a comment or string literal starting at `index`.
fn skip_literal(bytes: &[u8], index: usize) -> Option<usize> {
    match (bytes[index], bytes.get(index + 1)) {
        (b'/', Some(b'/')) => Some(
            bytes[index..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |offset| index + offset),
        ),
        (b'/', Some(b'*')) => Some(block_comment_end(bytes, index + 2)),
        (b'"' | b'\'' | b'`', _) => Some(quoted_end(bytes, index)),
        _ => None,
    }
}

// Block comments nest.
fn block_comment_end(bytes: &[u8], mut index: usize) -> usize {
    let mut depth = 1usize;
    while index < bytes.len() {
        match (bytes[index], bytes.get(index + 1)) {
            (b'*', Some(b'/')) => {
                depth -= 1;
                index += 2;
                if depth == 0 {
                    return index;
                }
            }
            (b'/', Some(b'*')) => {
                depth += 1;
                index += 2;
            }
            _ => index += 1,
        }
    }
    bytes.len()
}

fn quoted_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' if quote != b'`' => index += 2,
            byte if byte == quote => return index + 1,
            _ => index += 1,
        }
    }
    bytes.len()
}

fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    start + bytes[start..].iter().take_while(|&&b| is_word_byte(b)).count()
}

/// Identifiers joined by dots, without whitespace: `sr.engine.runCommand`.
fn chain_end(bytes: &[u8], start: usize) -> usize {
    let mut end = word_end(bytes, start);
    while bytes.get(end) == Some(&b'.') && bytes.get(end + 1).copied().is_some_and(is_word_start) {
        end = word_end(bytes, end + 1);
    }
    end
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word).is_some_and(|rest| {
        !rest
            .bytes()
            .next_back()
            .is_some_and(is_word_byte)
    })
}

#[cfg(test)]
mod options_call_tests {
    use super::*;

    fn route(source: &str) -> String {
        let paths = vec!["run".to_string(), "sr.engine.run".to_string()];
        route_option_calls(source, &paths).into_owned()
    }

    #[test]
    fn trailing_variables_become_the_first_argument() {
        assert_eq!(route("run(\"ls\", o)"), "sr_options_run(o, \"ls\", o)");
        assert_eq!(route("run(o);"), "sr_options_run(o, o);");
        assert_eq!(
            route("let s = sr.engine.run(\"ls\", \"-l\", opts);"),
            "let s = sr_options_sr_engine_run(opts, \"ls\", \"-l\", opts);"
        );
    }

    #[test]
    fn other_calls_are_left_alone() {
        for source in [
            "run(\"ls\", #{ output: \"\" })",
            "run(\"ls\", opts.inner)",
            "run(\"ls\", true)",
            "x.run(\"ls\", o)",
            "fn run(a, o) { a }",
            "rerun(\"ls\", o)",
            "print(\"run(1, o)\") // run(2, o)",
            "run(\"ls\", o",
        ] {
            assert_eq!(route(source), source);
        }
        assert!(matches!(
            route_option_calls("run(o)", &[]),
            Cow::Borrowed("run(o)")
        ));
    }

    #[test]
    fn nested_and_multi_line_calls_keep_their_lines() {
        assert_eq!(
            route("run(\"a\",\n  run(\"b\", inner),\n  outer)"),
            "sr_options_run(outer, \"a\",\n  sr_options_run(inner, \"b\", inner),\n  outer)"
        );
        assert_eq!(route("/* run(o) */ run (o)"), "/* run(o) */ sr_options_run(o, o)");
    }
}
