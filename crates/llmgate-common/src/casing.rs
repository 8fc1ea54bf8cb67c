use serde_json::Value;

/// `snake_case` / `kebab-case` to `camelCase`. Keys that are already camel
/// case pass through unchanged.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `camelCase` to `kebab-case`; used to derive header names from field
/// names. Uppercase runs stay one segment (`KMSKeyId` -> `kms-key-id`).
pub fn to_kebab_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let run_ends = i > 0
                && chars[i - 1].is_ascii_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_ascii_lowercase();
            if after_lower || run_ends {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(*ch);
        }
    }
    out
}

/// Recursively camelCase every object key, except keys listed in
/// `exclusions`: those keep their authored spelling and their values are left
/// untouched all the way down.
pub fn camel_case_keys(value: Value, exclusions: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                if exclusions.contains(&key.as_str()) {
                    out.insert(key, inner);
                } else {
                    out.insert(to_camel_case(&key), camel_case_keys(inner, exclusions));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| camel_case_keys(item, exclusions))
                .collect(),
        ),
        other => other,
    }
}
