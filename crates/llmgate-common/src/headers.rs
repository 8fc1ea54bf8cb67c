/// Ordered header list. Lookups are ASCII-case-insensitive; the stored name
/// keeps the spelling it was inserted with.
pub type Headers = Vec<(String, String)>;

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    if let Some((_, v)) = headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case(&name))
    {
        *v = value;
        return;
    }
    headers.push((name, value));
}

/// Push without deduplication; callers that want repeated names (e.g. multiple
/// `set-cookie` entries) use this instead of [`header_set`].
pub fn header_append(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    headers.push((name.into(), value.into()));
}

pub fn header_remove(headers: &mut Headers, name: &str) -> Option<String> {
    let idx = headers
        .iter()
        .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
    Some(headers.remove(idx).1)
}

pub fn header_contains(headers: &Headers, name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

/// Copy every entry of `from` into `headers`, overwriting case-insensitive
/// duplicates. Later sources win.
pub fn header_merge(headers: &mut Headers, from: &Headers) {
    for (name, value) in from {
        header_set(headers, name.clone(), value.clone());
    }
}

/// Lossy conversion from the front-end's typed header map; non-UTF-8 values
/// are dropped.
pub fn headers_from_http(map: &http::HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            out.push((name.as_str().to_string(), value.to_string()));
        }
    }
    out
}
