//! Pure state transitions over [`SearchParams`].

use crate::path_key::resolve_on_add;
use crate::proto::Action;
use crate::proto::FIRST_OFFSET;
use crate::proto::FilterDefinition;
use crate::proto::LIMIT_KEY;
use crate::proto::OFFSET_KEY;
use crate::proto::ParamValue;
use crate::proto::QUERY_KEY;
use crate::proto::SearchParams;
use std::borrow::Cow;
use tracing::debug;

/// Applies a dispatch batch left to right and returns the resulting params.
///
/// Every action sees the output of the previous one. Effective filter, query
/// and reset actions send the listing back to its first page, unless a later
/// `PAGE_CHANGE` in the same batch picks an explicit offset. A batch made only
/// of no-ops returns `params` unchanged.
pub fn reduce(params: SearchParams, actions: &[Action]) -> SearchParams {
    let mut reduction = Reduction {
        params,
        reset_offset: false,
    };
    for action in actions {
        let effective = reduction.apply(action);
        debug!(action = action.kind(), effective, "applied search action");
    }
    reduction.finish()
}

struct Reduction {
    params: SearchParams,
    reset_offset: bool,
}

impl Reduction {
    fn apply(&mut self, action: &Action) -> bool {
        match action {
            Action::PageChange { offset } => {
                self.params.set_offset(*offset);
                self.reset_offset = false;
                true
            }
            Action::QueryUpdate { query } => {
                if query.is_empty() {
                    self.params.remove(QUERY_KEY);
                } else {
                    self.params.insert(QUERY_KEY, query.as_str());
                }
                self.reset_offset = true;
                true
            }
            Action::FilterAdd { filter, payload } => {
                let effective = self.add(filter, payload);
                self.mark(effective)
            }
            Action::FilterRemove { filter, payload } => {
                let effective = self.remove(filter, payload);
                self.mark(effective)
            }
            Action::FilterReset => {
                self.params.retain(|key, _| key == LIMIT_KEY);
                self.reset_offset = true;
                true
            }
        }
    }

    fn mark(&mut self, effective: bool) -> bool {
        if effective {
            self.reset_offset = true;
        }
        effective
    }

    fn add(&mut self, filter: &FilterDefinition, payload: &str) -> bool {
        if filter.is_drilldown {
            let current = self.params.get(&filter.name).and_then(ParamValue::single);
            if current == Some(payload) {
                return false;
            }
            self.params.insert(filter.name.as_str(), payload);
            return true;
        }
        let next = match resolve_on_add(self.params.selected(&filter.name), payload) {
            Cow::Borrowed(_) => return false,
            Cow::Owned(next) => next,
        };
        self.params.insert(filter.name.as_str(), next);
        true
    }

    fn remove(&mut self, filter: &FilterDefinition, payload: &str) -> bool {
        let Some(current) = self.params.get(&filter.name) else {
            return false;
        };
        if filter.is_drilldown {
            if current.single() != Some(payload) {
                return false;
            }
            self.params.remove(&filter.name);
            return true;
        }
        if !current.contains(payload) {
            return false;
        }
        let remaining: Vec<String> = current
            .values()
            .iter()
            .filter(|value| value.as_str() != payload)
            .cloned()
            .collect();
        if remaining.is_empty() {
            self.params.remove(&filter.name);
        } else {
            self.params.insert(filter.name.as_str(), remaining);
        }
        true
    }

    fn finish(mut self) -> SearchParams {
        if self.reset_offset {
            self.params.insert(OFFSET_KEY, FIRST_OFFSET);
        }
        self.params
    }
}
