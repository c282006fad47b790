//! The set of open PaperCuts and their on-disk form.

use crate::error::SessionError;
use crate::id::{IdGenerator, UuidIdGen};
use crate::record::WordRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub content: Vec<WordRecord>,
    /// Content offsets that start a block regardless of speaker.
    #[serde(default)]
    pub splits: Vec<usize>,
}

impl Tab {
    /// The split offsets as one flag per content item.
    pub fn split_flags(&self) -> Vec<bool> {
        let mut flags = vec![false; self.content.len()];
        for &offset in &self.splits {
            if let Some(flag) = flags.get_mut(offset) {
                *flag = true;
            }
        }
        flags
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    tabs: Vec<Tab>,
}

pub struct Session {
    tabs: Vec<Tab>,
    ids: Box<dyn IdGenerator>,
    created: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_ids(Box::new(UuidIdGen))
    }

    pub fn with_ids(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            tabs: Vec::new(),
            ids,
            created: 0,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Opens a new empty tab and returns its id. Without a name the tab is
    /// called `PaperCut N`, with `N` past every number already in use.
    pub fn create_tab(&mut self, name: Option<&str>) -> String {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.next_default_name(),
        };
        let id = self.ids.next_id();
        self.tabs.push(Tab {
            id: id.clone(),
            name,
            content: Vec::new(),
            splits: Vec::new(),
        });
        id
    }

    fn next_default_name(&mut self) -> String {
        self.created = self.created.max(highest_default_number(&self.tabs));
        loop {
            self.created += 1;
            let name = format!("PaperCut {}", self.created);
            if !self.tabs.iter().any(|tab| tab.name == name) {
                return name;
            }
        }
    }

    pub fn close_tab(&mut self, id: &str) -> Result<Tab, SessionError> {
        let idx = self.index(id)?;
        Ok(self.tabs.remove(idx))
    }

    pub fn rename_tab(&mut self, id: &str, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidTab {
                tab: id.to_string(),
                reason: "name is empty".to_string(),
            });
        }
        let idx = self.index(id)?;
        self.tabs[idx].name = name.to_string();
        Ok(())
    }

    /// Moves tab `id` in front of `before`, or to the end when `before` is
    /// `None`.
    pub fn move_tab(&mut self, id: &str, before: Option<&str>) -> Result<(), SessionError> {
        let idx = self.index(id)?;
        if let Some(before) = before {
            self.index(before)?;
        }
        let tab = self.tabs.remove(idx);
        let at = match before {
            Some(before) => self.position(before).unwrap_or(self.tabs.len()),
            None => self.tabs.len(),
        };
        self.tabs.insert(at, tab);
        Ok(())
    }

    pub fn get_content(&self, id: &str) -> Result<&[WordRecord], SessionError> {
        let idx = self.index(id)?;
        Ok(&self.tabs[idx].content)
    }

    /// Replaces a tab's content and split offsets. Returns whether anything
    /// changed.
    pub fn set_content(
        &mut self,
        id: &str,
        content: Vec<WordRecord>,
        splits: Vec<usize>,
    ) -> Result<bool, SessionError> {
        let idx = self.index(id)?;
        let tab = &mut self.tabs[idx];
        let splits: Vec<usize> = splits.into_iter().filter(|&s| s < content.len()).collect();
        let changed = tab.content != content || tab.splits != splits;
        tab.content = content;
        tab.splits = splits;
        Ok(changed)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        let file = SessionFile {
            version: SESSION_VERSION,
            tabs: self.tabs.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str, ids: Box<dyn IdGenerator>) -> Result<Self, SessionError> {
        let file: SessionFile = serde_json::from_str(json)?;
        if file.version != SESSION_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found: file.version,
                expected: SESSION_VERSION,
            });
        }
        validate(&file.tabs)?;
        let created = highest_default_number(&file.tabs);
        Ok(Self {
            tabs: file.tabs,
            ids,
            created,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        info!(path = %path.display(), tabs = self.tabs.len(), "saved session");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let session = Self::from_json(&json, Box::new(UuidIdGen))?;
        info!(path = %path.display(), tabs = session.tabs.len(), "loaded session");
        Ok(session)
    }

    fn index(&self, id: &str) -> Result<usize, SessionError> {
        self.position(id)
            .ok_or_else(|| SessionError::UnknownTab(id.to_string()))
    }
}

fn validate(tabs: &[Tab]) -> Result<(), SessionError> {
    let mut seen = HashSet::new();
    for tab in tabs {
        if !seen.insert(tab.id.as_str()) {
            return Err(SessionError::DuplicateTab(tab.id.clone()));
        }
        let invalid = |reason: String| SessionError::InvalidTab {
            tab: tab.id.clone(),
            reason,
        };
        if let Some(&offset) = tab.splits.iter().find(|&&s| s >= tab.content.len()) {
            return Err(invalid(format!(
                "split offset {offset} is past {} words",
                tab.content.len()
            )));
        }
        if let Some(idx) = tab.content.iter().position(|item| !item.is_finite()) {
            return Err(invalid(format!("word {idx} has a non-finite time")));
        }
    }
    Ok(())
}

fn highest_default_number(tabs: &[Tab]) -> usize {
    tabs.iter()
        .filter_map(|tab| tab.name.strip_prefix("PaperCut "))
        .filter_map(|n| n.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{Session, SESSION_VERSION};
    use crate::error::SessionError;
    use crate::id::SequentialIdGen;
    use crate::record::WordRecord;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn session() -> Session {
        Session::with_ids(Box::new(SequentialIdGen::new("tab")))
    }

    fn names(session: &Session) -> Vec<&str> {
        session.tabs().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn creates_numbered_tabs() {
        let mut session = session();
        let first = session.create_tab(None);
        session.create_tab(Some("Intro"));
        session.create_tab(Some("  "));
        assert_eq!(first, "tab-0");
        assert_eq!(names(&session), ["PaperCut 1", "Intro", "PaperCut 2"]);
    }

    #[test]
    fn default_names_skip_numbers_in_use() {
        let json = r#"{"version":1,"tabs":[
            {"id":"t1","name":"Intro","content":[]},
            {"id":"t2","name":"PaperCut 2","content":[]}]}"#;
        let mut loaded = Session::from_json(json, Box::new(SequentialIdGen::default())).expect("load");
        let id = loaded.create_tab(None);
        assert_eq!(loaded.tab(&id).map(|t| t.name.as_str()), Some("PaperCut 3"));

        let mut session = session();
        let a = session.create_tab(None);
        session.rename_tab(&a, "PaperCut 2").expect("rename");
        session.create_tab(None);
        assert_eq!(names(&session), ["PaperCut 2", "PaperCut 3"]);
    }

    #[test]
    fn rename_move_and_close() {
        let mut session = session();
        let a = session.create_tab(None);
        let b = session.create_tab(None);
        let c = session.create_tab(None);
        session.rename_tab(&b, "Middle").expect("rename");
        session.move_tab(&c, Some(&a)).expect("move");
        assert_eq!(names(&session), ["PaperCut 3", "PaperCut 1", "Middle"]);
        session.move_tab(&c, None).expect("move to end");
        assert_eq!(names(&session), ["PaperCut 1", "Middle", "PaperCut 3"]);
        let closed = session.close_tab(&a).expect("close");
        assert_eq!(closed.name, "PaperCut 1");
        assert!(matches!(session.close_tab(&a), Err(SessionError::UnknownTab(_))));
        assert!(session.rename_tab(&b, " ").is_err());
    }

    #[test]
    fn content_round_trips_through_tabs() {
        let mut session = session();
        let id = session.create_tab(None);
        let content = vec![WordRecord::new("Hi", "A"), WordRecord::new("you", "A")];
        assert!(session.set_content(&id, content.clone(), vec![1, 9]).expect("set"));
        assert!(!session.set_content(&id, content.clone(), vec![1]).expect("set"));
        assert_eq!(session.get_content(&id).expect("get"), content.as_slice());
        assert_eq!(session.tab(&id).map(|t| t.split_flags()), Some(vec![false, true]));
    }

    #[test]
    fn json_round_trip_and_validation() {
        let mut session = session();
        let id = session.create_tab(Some("Cut"));
        session
            .set_content(&id, vec![WordRecord::new("Hi", "A").with_times(1.0, 1.5)], vec![])
            .expect("set");
        let json = session.to_json().expect("json");
        let loaded = Session::from_json(&json, Box::new(SequentialIdGen::default())).expect("load");
        assert_eq!(loaded.tabs(), session.tabs());

        let future = json.replace(
            &format!("\"version\": {SESSION_VERSION}"),
            "\"version\": 99",
        );
        assert!(matches!(
            Session::from_json(&future, Box::new(SequentialIdGen::default())),
            Err(SessionError::UnsupportedVersion { found: 99, .. })
        ));

        let bad_split = r#"{"version":1,"tabs":[{"id":"t","name":"x","content":[],"splits":[0]}]}"#;
        assert!(matches!(
            Session::from_json(bad_split, Box::new(SequentialIdGen::default())),
            Err(SessionError::InvalidTab { .. })
        ));

        let duplicate = r#"{"version":1,"tabs":[
            {"id":"t","name":"x","content":[]},
            {"id":"t","name":"y","content":[]}]}"#;
        assert!(matches!(
            Session::from_json(duplicate, Box::new(SequentialIdGen::default())),
            Err(SessionError::DuplicateTab(_))
        ));
    }

    #[test]
    fn save_and_load_from_disk() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("papercut-session-{now}"));
        let path = dir.join("session.json");

        let mut session = session();
        let id = session.create_tab(None);
        session
            .set_content(&id, vec![WordRecord::new("Hi", "A")], vec![])
            .expect("set");
        session.save(&path).expect("save");

        let loaded = Session::load(&path).expect("load");
        assert_eq!(loaded.tabs(), session.tabs());
        assert!(matches!(
            Session::load(&dir.join("missing.json")),
            Err(SessionError::Io { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
