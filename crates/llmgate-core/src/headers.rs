//! Outgoing header composition: base, provider-mapped, forward-listed, and
//! proxy-passthrough sources, merged in that order, then post-processed.

use llmgate_common::{
    Headers, endpoints, header_get, header_remove, header_set,
};
use llmgate_config::{HEADER_FILE_PURPOSE, HEADER_PREFIX};

/// Client headers never forwarded in proxy mode, on top of the configured
/// ignore set.
const ALWAYS_IGNORED: &[&str] = &["expect", "content-length"];

pub struct HeaderContext<'a> {
    pub client_headers: &'a Headers,
    pub endpoint: &'a str,
    pub method: &'a str,
    pub forward_headers: &'a [String],
    pub ignored_proxy_headers: &'a [String],
}

pub fn build_final_headers(provider_headers: &Headers, ctx: &HeaderContext<'_>) -> Headers {
    let mut headers = Headers::new();

    // base
    header_set(&mut headers, "content-type", "application/json");
    if let Some(encoding) = header_get(ctx.client_headers, "accept-encoding") {
        header_set(&mut headers, "accept-encoding", encoding);
    }

    // provider-mapped
    for (name, value) in provider_headers {
        header_set(&mut headers, name.to_ascii_lowercase(), value.clone());
    }

    // forward list
    for name in ctx.forward_headers {
        if let Some(value) = header_get(ctx.client_headers, name) {
            header_set(&mut headers, name.to_ascii_lowercase(), value.to_string());
        }
    }

    // proxy passthrough
    if ctx.endpoint == endpoints::PROXY {
        for (name, value) in ctx.client_headers {
            if name.to_ascii_lowercase().starts_with(HEADER_PREFIX) {
                continue;
            }
            if ALWAYS_IGNORED
                .iter()
                .any(|ignored| name.eq_ignore_ascii_case(ignored))
            {
                continue;
            }
            if ctx
                .ignored_proxy_headers
                .iter()
                .any(|ignored| name.eq_ignore_ascii_case(ignored))
            {
                continue;
            }
            header_set(&mut headers, name.to_ascii_lowercase(), value.clone());
        }
    }

    post_process_headers(&mut headers, ctx);
    headers
}

/// Method/content-type post-rules. Idempotent: applying twice yields the
/// same header set.
pub fn post_process_headers(headers: &mut Headers, ctx: &HeaderContext<'_>) {
    let is_multipart = header_get(headers, "content-type")
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    if ctx.method.eq_ignore_ascii_case("GET") || is_multipart {
        header_remove(headers, "content-type");
    }

    if ctx.endpoint == endpoints::UPLOAD_FILE {
        if let Some(content_type) = header_get(ctx.client_headers, "content-type") {
            let content_type = content_type.to_string();
            header_remove(headers, "content-type");
            header_set(&mut *headers, "Content-Type", content_type);
        }
        if let Some(purpose) = header_get(ctx.client_headers, HEADER_FILE_PURPOSE) {
            header_set(&mut *headers, HEADER_FILE_PURPOSE, purpose.to_string());
        }
    }
}
