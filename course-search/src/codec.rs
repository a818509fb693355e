//! Mapping between the browsable query string and [`SearchParams`].

use crate::config::SearchConfig;
use crate::proto::FIRST_OFFSET;
use crate::proto::LIMIT_KEY;
use crate::proto::OFFSET_KEY;
use crate::proto::ParamValue;
use crate::proto::SearchParams;
use crate::proto::is_reserved_key;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use std::collections::BTreeMap;
use tracing::warn;

/// Everything except RFC 3986 unreserved characters is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Parses a query string into search parameters.
///
/// A leading `?` and a trailing fragment are ignored. Repeated keys become
/// lists, single occurrences scalars, and unknown keys are kept as filters.
/// `limit` and `offset` are always present in the result.
pub fn decode(query: &str, config: &SearchConfig) -> SearchParams {
    let query = strip_fragment(query);
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        let value = decode_component(raw_value);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        grouped.entry(key).or_default().push(value);
    }

    let mut params: SearchParams = grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if is_reserved_key(&key) || values.len() == 1 {
                ParamValue::Scalar(values.swap_remove(0))
            } else {
                ParamValue::List(values)
            };
            (key, value)
        })
        .collect();

    let limit = canonical_count(&params, LIMIT_KEY).unwrap_or(config.default_limit);
    params.insert(LIMIT_KEY, limit.to_string());
    match canonical_count(&params, OFFSET_KEY) {
        Some(offset) => params.set_offset(offset),
        None => params.insert(OFFSET_KEY, FIRST_OFFSET),
    }
    params
}

/// Builds the canonical query string (without the leading `?`).
///
/// Keys are emitted in alphabetical order, lists as repeated pairs in list
/// order. Empty scalars and empty lists do not appear at all.
pub fn encode(params: &SearchParams) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        for item in value.values().iter().filter(|item| !item.is_empty()) {
            pairs.push(format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(item, QUERY_COMPONENT)
            ));
        }
    }
    pairs.join("&")
}

/// Splits a location into its path and query string, dropping any fragment.
pub fn split_url(url: &str) -> (&str, &str) {
    let url = strip_fragment(url);
    url.split_once('?').unwrap_or((url, ""))
}

/// Location of the search page for the given parameters.
pub fn search_url(search_path: &str, params: &SearchParams) -> String {
    let query = encode(params);
    if query.is_empty() {
        search_path.to_string()
    } else {
        format!("{search_path}?{query}")
    }
}

fn strip_fragment(raw: &str) -> &str {
    raw.split_once('#').map_or(raw, |(before, _)| before)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Reads a reserved numeric key, normalizing `"007"` to `7`.
fn canonical_count(params: &SearchParams, key: &str) -> Option<u64> {
    let raw = params.get(key).and_then(ParamValue::single)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = raw, "discarding non-numeric pagination value: {err}");
            None
        }
    }
}
