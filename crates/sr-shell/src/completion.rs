use sr_core::{CompletionResult, Property, ScriptValue};

const RESERVED_LITERALS: [&str; 4] = ["this", "true", "false", "null"];

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Completes the dotted expression at the end of `expression` against `context`.
///
/// `enumerate` lists the own properties of a value and must not run script code.
pub fn complete_expression(
    context: &ScriptValue,
    expression: &str,
    enumerate: &dyn Fn(&ScriptValue) -> Vec<Property>,
) -> CompletionResult {
    let chars = expression.chars().collect::<Vec<_>>();

    let mut start = chars.len();
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    let name = chars[start..].iter().collect::<String>();
    let insertion_offset = start;

    let mut path = Vec::new();
    let mut cursor = start.checked_sub(1);
    while let Some(dot) = cursor.filter(|&index| chars[index] == '.') {
        let mut begin = dot;
        while begin > 0 && is_identifier_char(chars[begin - 1]) {
            begin -= 1;
        }
        path.insert(0, chars[begin..dot].iter().collect::<String>());
        cursor = begin.checked_sub(1);
    }

    let target = resolve_path(context, &path);
    let (mut candidates, common_suffix) = find_candidates(&target, path.is_empty(), &name, enumerate);
    candidates.sort();
    candidates.dedup();

    CompletionResult {
        path,
        candidates,
        insertion_offset,
        common_suffix,
    }
}

fn resolve_path(context: &ScriptValue, path: &[String]) -> ScriptValue {
    let segments = match path.first() {
        Some(first) if first == "this" => &path[1..],
        _ => path,
    };
    let mut value = context.clone();
    for segment in segments {
        if value.is_null_or_undefined() {
            break;
        }
        value = value.property(segment);
    }
    value
}

fn find_candidates(
    target: &ScriptValue,
    top_level: bool,
    name: &str,
    enumerate: &dyn Fn(&ScriptValue) -> Vec<Property>,
) -> (Vec<String>, String) {
    let properties = if target.is_null_or_undefined() {
        Vec::new()
    } else {
        enumerate(target)
    };

    let mut candidates = Vec::new();
    let mut common: Option<String> = None;
    for property in properties {
        if !property.name.starts_with(name) {
            continue;
        }
        common = Some(match common {
            None => property.name.clone(),
            Some(prefix) => common_prefix(&prefix, &property.name),
        });
        candidates.push(property.name);
    }
    if top_level {
        candidates.extend(
            RESERVED_LITERALS
                .iter()
                .filter(|word| word.starts_with(name))
                .map(|word| word.to_string()),
        );
    }

    let common_suffix = match common {
        Some(prefix) if !name.is_empty() => prefix.chars().skip(name.chars().count()).collect(),
        _ => String::new(),
    };
    (candidates, common_suffix)
}

fn common_prefix(left: &str, right: &str) -> String {
    left.chars()
        .zip(right.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect()
}

#[cfg(test)]
mod completion_tests {
    use super::*;
    use sr_core::ScriptObject;

    fn own(value: &ScriptValue) -> Vec<Property> {
        value.own_properties()
    }

    fn context() -> ScriptValue {
        let b = ScriptObject::new()
            .with("foo", 1i64)
            .with("bar", 2i64)
            .with("baz", 3i64);
        let a = ScriptObject::new().with("b", b);
        ScriptValue::Object(ScriptObject::new().with("a", a).with("total", 0i64))
    }

    #[test]
    fn trailing_dot_lists_every_property_sorted() {
        let result = complete_expression(&context(), "a.b.", &own);
        assert_eq!(result.path, vec!["a", "b"]);
        assert_eq!(result.candidates, vec!["bar", "baz", "foo"]);
        assert_eq!(result.insertion_offset, 4);
        assert_eq!(result.common_suffix, "");
    }

    #[test]
    fn partial_name_filters_by_prefix() {
        let result = complete_expression(&context(), "a.b.ba", &own);
        assert_eq!(result.candidates, vec!["bar", "baz"]);
        assert_eq!(result.insertion_offset, 4);
        assert_eq!(result.common_suffix, "");

        let result = complete_expression(&context(), "print(a.b.f", &own);
        assert_eq!(result.candidates, vec!["foo"]);
        assert_eq!(result.common_suffix, "oo");
        assert_eq!(result.insertion_offset, 10);
    }

    #[test]
    fn top_level_adds_reserved_literals() {
        let result = complete_expression(&context(), "", &own);
        assert_eq!(
            result.candidates,
            vec!["a", "false", "null", "this", "total", "true"]
        );
        assert_eq!(result.insertion_offset, 0);

        let result = complete_expression(&context(), "t", &own);
        assert_eq!(result.candidates, vec!["this", "total", "true"]);
        assert_eq!(result.common_suffix, "otal");
    }

    #[test]
    fn leading_this_is_skipped() {
        let result = complete_expression(&context(), "this.a.", &own);
        assert_eq!(result.path, vec!["this", "a"]);
        assert_eq!(result.candidates, vec!["b"]);
    }

    #[test]
    fn unknown_paths_have_no_candidates() {
        let result = complete_expression(&context(), "missing.x", &own);
        assert!(result.candidates.is_empty());
        assert_eq!(result.common_suffix, "");
    }

    #[test]
    fn empty_path_segments_are_kept() {
        let result = complete_expression(&context(), "x..", &own);
        assert_eq!(result.path, vec!["x", ""]);
        assert!(result.candidates.is_empty());

        let result = complete_expression(&context(), ".to", &own);
        assert_eq!(result.path, vec![""]);
        assert!(result.candidates.is_empty());
        assert_eq!(result.insertion_offset, 1);
    }
}
