use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::collections::btree_map;

pub const LIMIT_KEY: &str = "limit";
pub const OFFSET_KEY: &str = "offset";
pub const QUERY_KEY: &str = "query";
pub const RESERVED_KEYS: [&str; 3] = [LIMIT_KEY, OFFSET_KEY, QUERY_KEY];

/// Name of the history state namespace owned by the search page.
pub const HISTORY_STATE_NAME: &str = "courseSearch";

pub const FIRST_OFFSET: &str = "0";

/// A single parameter value. Filters holding one selection may travel as a
/// scalar; the reducer stores non-drilldown selections as lists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    /// All selected values, whatever the shape.
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Scalar(value) => std::slice::from_ref(value),
            ParamValue::List(values) => values,
        }
    }

    /// The value when exactly one is selected, as a scalar or a one-element list.
    pub fn single(&self) -> Option<&str> {
        match self.values() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.values().iter().any(|value| value == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(String::is_empty)
    }

    /// Drops empty strings and collapses one-element lists into scalars.
    /// Returns `None` when nothing is left.
    pub fn normalized(&self) -> Option<ParamValue> {
        let mut kept: Vec<String> = self
            .values()
            .iter()
            .filter(|value| !value.is_empty())
            .cloned()
            .collect();
        match kept.len() {
            0 => None,
            1 => kept.pop().map(ParamValue::Scalar),
            _ => Some(ParamValue::List(kept)),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Search and filter parameters, keyed by filter name.
///
/// `limit`, `offset` and `query` are reserved scalar keys; every other key is a
/// filter name. Keys are kept sorted so iteration order matches the encoded
/// query string.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SearchParams {
    entries: BTreeMap<String, ParamValue>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &ParamValue) -> bool) {
        self.entries.retain(|key, value| keep(key, value));
    }

    pub fn limit(&self) -> Option<&str> {
        self.scalar(LIMIT_KEY)
    }

    pub fn offset(&self) -> Option<&str> {
        self.scalar(OFFSET_KEY)
    }

    pub fn query(&self) -> Option<&str> {
        self.scalar(QUERY_KEY)
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.insert(OFFSET_KEY, offset.to_string());
    }

    /// Selected values of a filter; empty when the filter is unset.
    pub fn selected(&self, filter_name: &str) -> &[String] {
        self.get(filter_name).map(ParamValue::values).unwrap_or(&[])
    }

    /// Filter entries, i.e. every key that is not reserved.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Same parameters with empty values dropped and one-element lists
    /// collapsed into scalars.
    pub fn normalized(&self) -> SearchParams {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.normalized().map(|value| (key.clone(), value)))
            .collect()
    }

    /// Equality after normalization on both sides.
    pub fn is_equivalent(&self, other: &SearchParams) -> bool {
        self.normalized() == other.normalized()
    }

    fn scalar(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(ParamValue::single)
    }
}

impl FromIterator<(String, ParamValue)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, ParamValue); N]> for SearchParams {
    fn from(pairs: [(&str, ParamValue); N]) -> Self {
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

impl<'a> IntoIterator for &'a SearchParams {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilterDefinition {
    pub name: String,
    pub human_name: String,
    #[serde(default)]
    pub is_drilldown: bool,
    #[serde(default)]
    pub is_searchable: bool,
    #[serde(default)]
    pub is_autocompletable: bool,
    #[serde(default)]
    pub base_path: Option<String>,
}

impl FilterDefinition {
    /// A toggleable multi-value facet.
    pub fn multi(name: impl Into<String>, human_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            human_name: human_name.into(),
            is_drilldown: false,
            is_searchable: false,
            is_autocompletable: false,
            base_path: None,
        }
    }

    /// A radio-like facet holding at most one value.
    pub fn drilldown(name: impl Into<String>, human_name: impl Into<String>) -> Self {
        Self {
            is_drilldown: true,
            ..Self::multi(name, human_name)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FilterValue {
    pub key: String,
    pub human_name: String,
    #[serde(default)]
    pub count: u64,
}

/// A discrete user interaction against the search parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    PageChange {
        offset: u64,
    },
    QueryUpdate {
        query: String,
    },
    FilterAdd {
        filter: FilterDefinition,
        payload: String,
    },
    FilterRemove {
        filter: FilterDefinition,
        payload: String,
    },
    FilterReset,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::PageChange { .. } => "PAGE_CHANGE",
            Action::QueryUpdate { .. } => "QUERY_UPDATE",
            Action::FilterAdd { .. } => "FILTER_ADD",
            Action::FilterRemove { .. } => "FILTER_REMOVE",
            Action::FilterReset => "FILTER_RESET",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchData {
    pub params: SearchParams,
    pub last_dispatch_actions: Option<Vec<Action>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryState {
    pub name: String,
    pub data: DispatchData,
}

impl HistoryState {
    pub fn course_search(params: SearchParams, actions: Option<Vec<Action>>) -> Self {
        Self {
            name: HISTORY_STATE_NAME.to_string(),
            data: DispatchData {
                params,
                last_dispatch_actions: actions,
            },
        }
    }

    pub fn is_course_search(&self) -> bool {
        self.name == HISTORY_STATE_NAME
    }
}

/// One navigation entry as written to the host history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: Option<HistoryState>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn params_serialize_as_plain_object() {
        let params = SearchParams::from([
            ("limit", "10".into()),
            ("organizations", vec!["L-1", "L-2"].into()),
        ]);
        let value = serde_json::to_value(&params).expect("serialize params");
        assert_eq!(value, json!({"limit": "10", "organizations": ["L-1", "L-2"]}));
        let back: SearchParams = serde_json::from_value(value).expect("deserialize params");
        assert_eq!(back, params);
    }

    #[test]
    fn normalized_collapses_singletons_and_drops_empty() {
        let params = SearchParams::from([
            ("level", vec!["L-1"].into()),
            ("subjects", ParamValue::List(Vec::new())),
            ("query", "".into()),
        ]);
        assert_eq!(params.normalized(), SearchParams::from([("level", "L-1".into())]));
        assert!(params.is_equivalent(&SearchParams::from([("level", "L-1".into())])));
    }

    #[test]
    fn filters_skip_reserved_keys() {
        let params = SearchParams::from([
            ("limit", "10".into()),
            ("offset", "0".into()),
            ("query", "rust".into()),
            ("level", "L-1".into()),
        ]);
        let names: Vec<&str> = params.filters().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["level"]);
        assert_eq!(params.selected("level"), ["L-1".to_string()]);
        assert!(params.selected("subjects").is_empty());
    }

    #[test]
    fn actions_use_screaming_type_tags() {
        let action = Action::FilterAdd {
            filter: FilterDefinition::multi("organizations", "Organizations"),
            payload: "L-3".to_string(),
        };
        let value = serde_json::to_value(&action).expect("serialize action");
        assert_eq!(value["type"], json!("FILTER_ADD"));
        assert_eq!(value["payload"], json!("L-3"));
        assert_eq!(value["filter"]["name"], json!("organizations"));

        let reset: Action =
            serde_json::from_value(json!({"type": "FILTER_RESET"})).expect("parse reset");
        assert_eq!(reset, Action::FilterReset);
        let page: Action = serde_json::from_value(json!({"type": "PAGE_CHANGE", "offset": 40}))
            .expect("parse page change");
        assert_eq!(page, Action::PageChange { offset: 40 });
    }

    #[test]
    fn history_state_keeps_null_actions() {
        let state = HistoryState::course_search(SearchParams::new(), None);
        let value = serde_json::to_value(&state).expect("serialize state");
        assert_eq!(
            value,
            json!({"name": "courseSearch", "data": {"params": {}, "lastDispatchActions": null}})
        );
    }
}
