use crate::codec::decode;
use crate::codec::encode;
use crate::codec::search_url;
use crate::codec::split_url;
use crate::config::SearchConfig;
use crate::error::HistoryError;
use crate::proto::Action;
use crate::proto::HistoryEntry;
use crate::proto::HistoryState;
use crate::proto::SearchParams;
use crate::reducer::reduce;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

/// Navigation history owned by the host (a browser, a persisted stack...).
pub trait HistoryPort {
    /// Location of the current entry, path and query string included.
    fn current_url(&self) -> Result<String, HistoryError>;

    fn push(&mut self, entry: HistoryEntry) -> Result<(), HistoryError>;

    fn replace(&mut self, entry: HistoryEntry) -> Result<(), HistoryError>;
}

impl<P: HistoryPort + ?Sized> HistoryPort for &mut P {
    fn current_url(&self) -> Result<String, HistoryError> {
        (**self).current_url()
    }

    fn push(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        (**self).push(entry)
    }

    fn replace(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        (**self).replace(entry)
    }
}

/// What a bridge operation wrote to the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWrite {
    Nothing,
    Push,
    Replace,
}

/// Keeps the search parameters and the navigation history in step.
///
/// Each effective dispatch pushes exactly one entry; a dispatch that leaves the
/// parameters untouched writes nothing. Mounting only ever replaces.
#[derive(Debug)]
pub struct HistoryBridge<P> {
    port: P,
    config: SearchConfig,
    search_path: String,
    params: SearchParams,
    last_dispatch_actions: Option<Vec<Action>>,
}

impl<P: HistoryPort> HistoryBridge<P> {
    /// Reads the current location and, when it is not in canonical form,
    /// replaces the current entry with the canonical one.
    ///
    /// Entries are written under the path of the mounted location, falling
    /// back to the configured search path when it has none.
    pub fn mount(port: P, config: SearchConfig) -> Result<(Self, HistoryWrite), HistoryError> {
        let (mut bridge, url) = Self::open(port, config)?;
        let (_, query) = split_url(&url);
        if encode(&bridge.params) == query {
            debug!(url = %url, "search location already canonical");
            return Ok((bridge, HistoryWrite::Nothing));
        }
        let entry = bridge.entry(bridge.params.clone(), None);
        info!(from = %url, to = %entry.url, "normalizing search location");
        bridge.port.replace(entry)?;
        Ok((bridge, HistoryWrite::Replace))
    }

    /// Builds a bridge on the current location without touching the history.
    ///
    /// Used by hosts that only need [`HistoryBridge::restore`] after a
    /// back/forward move.
    pub fn attach(port: P, config: SearchConfig) -> Result<Self, HistoryError> {
        Self::open(port, config).map(|(bridge, _)| bridge)
    }

    fn open(port: P, config: SearchConfig) -> Result<(Self, String), HistoryError> {
        let url = port.current_url()?;
        let (path, query) = split_url(&url);
        let search_path = if path.is_empty() {
            config.search_path.clone()
        } else {
            path.to_string()
        };
        let params = decode(query, &config);
        let bridge = Self {
            port,
            config,
            search_path,
            params,
            last_dispatch_actions: None,
        };
        Ok((bridge, url))
    }

    /// Applies a dispatch batch, pushing one entry when the parameters change.
    ///
    /// A failing port leaves the bridge on its previous parameters.
    pub fn dispatch(&mut self, actions: Vec<Action>) -> Result<HistoryWrite, HistoryError> {
        let next = reduce(self.params.clone(), &actions);
        if next == self.params {
            debug!(actions = actions.len(), "dispatch left search params unchanged");
            return Ok(HistoryWrite::Nothing);
        }
        let entry = self.entry(next.clone(), Some(actions.clone()));
        info!(url = %entry.url, actions = actions.len(), "pushing course search entry");
        self.port.push(entry)?;
        self.params = next;
        self.last_dispatch_actions = Some(actions);
        Ok(HistoryWrite::Push)
    }

    /// Adopts an entry the host restored on back/forward navigation.
    ///
    /// State from another namespace, or no state at all, falls back to the URL.
    pub fn restore(&mut self, entry: &HistoryEntry) -> &SearchParams {
        match entry.state.as_ref().filter(|state| state.is_course_search()) {
            Some(state) => {
                debug!(url = %entry.url, "restoring search params from entry state");
                self.params = state.data.params.clone();
                self.last_dispatch_actions = state.data.last_dispatch_actions.clone();
            }
            None => {
                debug!(url = %entry.url, "restoring search params from url");
                let (_, query) = split_url(&entry.url);
                self.params = decode(query, &self.config);
                self.last_dispatch_actions = None;
            }
        }
        &self.params
    }

    pub fn current_params(&self) -> &SearchParams {
        &self.params
    }

    pub fn last_dispatch_actions(&self) -> Option<&[Action]> {
        self.last_dispatch_actions.as_deref()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    fn entry(&self, params: SearchParams, actions: Option<Vec<Action>>) -> HistoryEntry {
        HistoryEntry {
            url: search_url(&self.search_path, &params),
            title: String::new(),
            state: Some(HistoryState::course_search(params, actions)),
        }
    }
}

/// A history stack kept in memory, with browser-like cursor semantics.
///
/// Pushing drops every entry ahead of the cursor. A deserialized stack whose
/// cursor does not point at an entry is rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredHistory")]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

#[derive(Deserialize)]
struct StoredHistory {
    entries: Vec<HistoryEntry>,
    #[serde(default)]
    cursor: usize,
}

impl TryFrom<StoredHistory> for MemoryHistory {
    type Error = String;

    fn try_from(stored: StoredHistory) -> Result<Self, Self::Error> {
        let StoredHistory { entries, cursor } = stored;
        let in_range = cursor < entries.len() || (entries.is_empty() && cursor == 0);
        if !in_range {
            return Err(format!(
                "history cursor {cursor} is out of range for {} entries",
                entries.len()
            ));
        }
        Ok(Self { entries, cursor })
    }
}

impl MemoryHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                url: initial_url.into(),
                title: String::new(),
                state: None,
            }],
            cursor: 0,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    /// Moves one entry back and returns it, or `None` at the oldest entry.
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        let previous = self.cursor.checked_sub(1)?;
        self.entries.get(previous)?;
        self.cursor = previous;
        self.current()
    }

    /// Moves one entry forward and returns it, or `None` at the newest entry.
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        let next = self.cursor.checked_add(1)?;
        self.entries.get(next)?;
        self.cursor = next;
        self.current()
    }
}

impl HistoryPort for MemoryHistory {
    fn current_url(&self) -> Result<String, HistoryError> {
        self.current()
            .map(|entry| entry.url.clone())
            .ok_or_else(|| HistoryError::Rejected("history has no current entry".to_string()))
    }

    fn push(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        Ok(())
    }

    fn replace(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        match self.entries.get_mut(self.cursor) {
            Some(current) => *current = entry,
            None => {
                self.entries.push(entry);
                self.cursor = self.entries.len() - 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::FilterDefinition;
    use pretty_assertions::assert_eq;

    fn organizations_add(payload: &str) -> Action {
        Action::FilterAdd {
            filter: FilterDefinition::multi("organizations", "Organizations"),
            payload: payload.to_string(),
        }
    }

    /// Port whose writes always fail.
    struct ReadOnlyHistory;

    impl HistoryPort for ReadOnlyHistory {
        fn current_url(&self) -> Result<String, HistoryError> {
            Ok("/search?limit=20&offset=0".to_string())
        }

        fn push(&mut self, _entry: HistoryEntry) -> Result<(), HistoryError> {
            Err(HistoryError::Rejected("read-only".to_string()))
        }

        fn replace(&mut self, _entry: HistoryEntry) -> Result<(), HistoryError> {
            Err(HistoryError::Rejected("read-only".to_string()))
        }
    }

    #[test]
    fn mount_replaces_implicit_defaults() {
        let mut history = MemoryHistory::new("/search?organizations=L-1");
        let (bridge, write) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        assert_eq!(write, HistoryWrite::Replace);
        assert_eq!(bridge.current_params().limit(), Some("20"));
        assert!(bridge.last_dispatch_actions().is_none());

        assert_eq!(history.len(), 1);
        let entry = history.current().expect("current entry");
        assert_eq!(entry.url, "/search?limit=20&offset=0&organizations=L-1");
        let state = entry.state.as_ref().expect("state");
        assert!(state.is_course_search());
        assert_eq!(state.data.last_dispatch_actions, None);
    }

    #[test]
    fn mount_leaves_canonical_location_alone() {
        let mut history = MemoryHistory::new("/search?limit=20&offset=0");
        let before = history.clone();
        let (_, write) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        assert_eq!(write, HistoryWrite::Nothing);
        assert_eq!(history, before);
    }

    #[test]
    fn dispatch_pushes_entry_with_actions() {
        let mut history = MemoryHistory::new("/search?limit=20&offset=0");
        let (mut bridge, _) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        let actions = vec![organizations_add("L-1")];
        let write = bridge.dispatch(actions.clone()).expect("dispatch");
        assert_eq!(write, HistoryWrite::Push);
        assert_eq!(bridge.last_dispatch_actions(), Some(actions.as_slice()));

        assert_eq!(history.len(), 2);
        let entry = history.current().expect("current entry");
        assert_eq!(entry.url, "/search?limit=20&offset=0&organizations=L-1");
        let state = entry.state.as_ref().expect("state");
        assert_eq!(state.data.last_dispatch_actions, Some(actions));
    }

    #[test]
    fn noop_dispatch_writes_nothing() {
        let mut history = MemoryHistory::new("/search?limit=20&offset=0&organizations=L-1");
        let (mut bridge, _) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        let write = bridge
            .dispatch(vec![organizations_add("L-1")])
            .expect("dispatch");
        assert_eq!(write, HistoryWrite::Nothing);
        assert!(bridge.last_dispatch_actions().is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn restore_prefers_entry_state() {
        let mut history = MemoryHistory::new("/search?limit=20&offset=0");
        let (mut bridge, _) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        let stored = SearchParams::from([("limit", "5".into()), ("offset", "10".into())]);
        let entry = HistoryEntry {
            url: "/search?limit=99".to_string(),
            title: String::new(),
            state: Some(HistoryState::course_search(
                stored.clone(),
                Some(vec![Action::PageChange { offset: 10 }]),
            )),
        };
        assert_eq!(bridge.restore(&entry), &stored);
        assert_eq!(
            bridge.last_dispatch_actions(),
            Some([Action::PageChange { offset: 10 }].as_slice())
        );
    }

    #[test]
    fn restore_falls_back_to_url_for_foreign_state() {
        let mut history = MemoryHistory::new("/search?limit=20&offset=0");
        let (mut bridge, _) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        let mut foreign = HistoryState::course_search(SearchParams::new(), None);
        foreign.name = "courseDetail".to_string();
        let entry = HistoryEntry {
            url: "/search?limit=5&level=L-1".to_string(),
            title: String::new(),
            state: Some(foreign),
        };
        let restored = bridge.restore(&entry).clone();
        assert_eq!(
            restored,
            SearchParams::from([
                ("level", "L-1".into()),
                ("limit", "5".into()),
                ("offset", "0".into()),
            ])
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn port_failure_is_surfaced_and_state_kept() {
        let (mut bridge, write) =
            HistoryBridge::mount(ReadOnlyHistory, SearchConfig::default()).expect("mount");
        assert_eq!(write, HistoryWrite::Nothing);
        let before = bridge.current_params().clone();
        let err = bridge
            .dispatch(vec![organizations_add("L-1")])
            .expect_err("push must fail");
        assert!(matches!(err, HistoryError::Rejected(_)));
        assert_eq!(bridge.current_params(), &before);
    }

    #[test]
    fn memory_history_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new("/a");
        history
            .push(HistoryEntry {
                url: "/b".to_string(),
                title: String::new(),
                state: None,
            })
            .unwrap();
        assert_eq!(history.back().map(|entry| entry.url.as_str()), Some("/a"));
        assert!(history.back().is_none());
        history
            .push(HistoryEntry {
                url: "/c".to_string(),
                title: String::new(),
                state: None,
            })
            .unwrap();
        let urls: Vec<&str> = history.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["/a", "/c"]);
        assert!(history.forward().is_none());
        assert_eq!(history.current_url().unwrap(), "/c");
    }

    #[test]
    fn stored_cursor_must_point_at_an_entry() {
        let stored = serde_json::json!({
            "entries": [{"url": "/search"}],
            "cursor": u64::MAX,
        });
        let err = serde_json::from_value::<MemoryHistory>(stored).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let stored = serde_json::json!({"entries": [{"url": "/a"}, {"url": "/b"}], "cursor": 1});
        let mut history: MemoryHistory = serde_json::from_value(stored).unwrap();
        assert!(history.forward().is_none());
        assert_eq!(history.back().map(|entry| entry.url.as_str()), Some("/a"));
        assert!(history.back().is_none());
    }

    #[test]
    fn attach_reads_location_without_writing() {
        let mut history = MemoryHistory::new("/search?level=L-1");
        let before = history.clone();
        let mut bridge =
            HistoryBridge::attach(&mut history, SearchConfig::default()).expect("attach");
        assert_eq!(bridge.current_params().selected("level"), ["L-1".to_string()]);
        let entry = HistoryEntry {
            url: "/search?level=L-2".to_string(),
            title: String::new(),
            state: None,
        };
        assert_eq!(bridge.restore(&entry).selected("level"), ["L-2".to_string()]);
        assert_eq!(history, before);
    }

    #[test]
    fn mount_keeps_location_path() {
        let mut history = MemoryHistory::new("/fr/cours?level=L-1");
        let (mut bridge, write) =
            HistoryBridge::mount(&mut history, SearchConfig::default()).expect("mount");
        assert_eq!(write, HistoryWrite::Replace);
        bridge
            .dispatch(vec![organizations_add("L-2")])
            .expect("dispatch");
        let urls: Vec<&str> = history.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/fr/cours?level=L-1&limit=20&offset=0",
                "/fr/cours?level=L-1&limit=20&offset=0&organizations=L-2",
            ]
        );

        let mut bare = MemoryHistory::new("?level=L-1");
        HistoryBridge::mount(&mut bare, SearchConfig::default()).expect("mount");
        assert_eq!(
            bare.current_url().unwrap(),
            "/search?level=L-1&limit=20&offset=0"
        );
    }
}
