//! Read-only view over the filter catalog served alongside search results.

use crate::proto::Action;
use crate::proto::FilterDefinition;
use crate::proto::FilterValue;
use crate::proto::SearchParams;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// A filter definition together with its current values and facet counts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facet {
    #[serde(flatten)]
    pub definition: FilterDefinition,
    #[serde(default)]
    pub values: Vec<FilterValue>,
}

impl Facet {
    pub fn value(&self, key: &str) -> Option<&FilterValue> {
        self.values.iter().find(|value| value.key == key)
    }
}

/// Supplies filter definitions and values by filter name.
pub trait FilterCatalog {
    fn facet(&self, name: &str) -> Option<&Facet>;

    fn facets(&self) -> Vec<&Facet>;
}

/// Catalog held in memory, deserializable from the facet payload of the
/// search API (`{ "<name>": { "name": ..., "values": [...] } }`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct StaticFilterCatalog {
    facets: BTreeMap<String, Facet>,
}

impl StaticFilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facet(mut self, definition: FilterDefinition, values: Vec<FilterValue>) -> Self {
        self.insert(Facet { definition, values });
        self
    }

    pub fn insert(&mut self, facet: Facet) {
        self.facets.insert(facet.definition.name.clone(), facet);
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl FilterCatalog for StaticFilterCatalog {
    fn facet(&self, name: &str) -> Option<&Facet> {
        self.facets.get(name)
    }

    fn facets(&self) -> Vec<&Facet> {
        self.facets.values().collect()
    }
}

/// One selected value, labelled for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActiveSelection {
    pub filter: FilterDefinition,
    pub key: String,
    pub human_name: String,
}

impl ActiveSelection {
    /// The action that deselects this value.
    pub fn remove_action(&self) -> Action {
        Action::FilterRemove {
            filter: self.filter.clone(),
            payload: self.key.clone(),
        }
    }
}

/// Selected values of every filter the catalog knows, in filter-name order.
///
/// Keys missing from the catalog values keep their raw key as label.
pub fn active_selections(
    params: &SearchParams,
    catalog: &impl FilterCatalog,
) -> Vec<ActiveSelection> {
    let mut selections = Vec::new();
    for (name, value) in params.filters() {
        let Some(facet) = catalog.facet(name) else {
            continue;
        };
        for key in value.values().iter().filter(|key| !key.is_empty()) {
            let human_name = facet
                .value(key)
                .map_or_else(|| key.clone(), |known| known.human_name.clone());
            selections.push(ActiveSelection {
                filter: facet.definition.clone(),
                key: key.clone(),
                human_name,
            });
        }
    }
    selections
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub filter: FilterDefinition,
    pub value: FilterValue,
}

impl Suggestion {
    /// The action that selects this suggestion.
    pub fn add_action(&self) -> Action {
        Action::FilterAdd {
            filter: self.filter.clone(),
            payload: self.value.key.clone(),
        }
    }
}

/// Values of autocompletable filters whose label contains `needle`, most
/// frequent first.
pub fn autocomplete(catalog: &impl FilterCatalog, needle: &str, limit: usize) -> Vec<Suggestion> {
    let lowered = needle.trim().to_lowercase();
    let needle = lowered.as_str();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }
    let mut suggestions: Vec<Suggestion> = catalog
        .facets()
        .into_iter()
        .filter(|facet| facet.definition.is_autocompletable)
        .flat_map(move |facet| {
            facet
                .values
                .iter()
                .filter(move |value| value.human_name.to_lowercase().contains(needle))
                .map(move |value| Suggestion {
                    filter: facet.definition.clone(),
                    value: value.clone(),
                })
        })
        .collect();
    suggestions.sort_by(|a, b| {
        b.value
            .count
            .cmp(&a.value.count)
            .then_with(|| a.value.key.cmp(&b.value.key))
    });
    suggestions.truncate(limit);
    suggestions
}
