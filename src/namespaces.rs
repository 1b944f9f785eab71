//! Client-side namespace selection, name filtering and favourite namespaces.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NamespaceFilter {
    #[default]
    All,
    Only(String),
}

impl NamespaceFilter {
    pub fn from_option(ns: Option<String>) -> Self {
        ns.map_or(NamespaceFilter::All, NamespaceFilter::Only)
    }

    pub fn as_query(&self) -> Option<&str> {
        match self {
            NamespaceFilter::All => None,
            NamespaceFilter::Only(ns) => Some(ns),
        }
    }

    pub fn matches(&self, meta: &ObjectMeta) -> bool {
        match self {
            NamespaceFilter::All => true,
            NamespaceFilter::Only(ns) => meta.namespace.as_deref() == Some(ns.as_str()),
        }
    }

    /// Steps through `All` followed by each known namespace, wrapping around.
    pub fn cycle(&self, known: &[String]) -> Self {
        match self {
            NamespaceFilter::All => known.first().cloned().map_or(NamespaceFilter::All, NamespaceFilter::Only),
            NamespaceFilter::Only(current) => {
                let next = known.iter().position(|n| n == current).and_then(|i| known.get(i + 1));
                next.cloned().map_or(NamespaceFilter::All, NamespaceFilter::Only)
            }
        }
    }
}

impl fmt::Display for NamespaceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceFilter::All => f.write_str("all namespaces"),
            NamespaceFilter::Only(ns) => f.write_str(ns),
        }
    }
}

/// Keeps objects in the selected namespace whose name matches `pattern`.
pub fn filter_objects<T, F>(items: Vec<T>, ns: &NamespaceFilter, pattern: Option<&Regex>, meta: F) -> Vec<T>
where
    F: Fn(&T) -> &ObjectMeta,
{
    items
        .into_iter()
        .filter(|item| {
            let m = meta(item);
            let name = m.name.as_deref().unwrap_or_default();
            ns.matches(m) && pattern.is_none_or(|re| re.is_match(name))
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode favourites")]
    Encode(#[from] serde_json::Error),
}

/// Favourite namespaces, persisted as a JSON array of names.
#[derive(Debug)]
pub struct Favorites {
    path: Option<PathBuf>,
    names: Vec<String>,
}

impl Favorites {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kdash").join("favorites.json"))
    }

    /// Missing or unreadable files yield an empty list; never an error.
    pub fn load(path: Option<PathBuf>) -> Self {
        let names = path.as_deref().map(read_names).unwrap_or_default();
        Self { path, names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, ns: &str) -> bool {
        self.names.iter().any(|n| n == ns)
    }

    /// Returns whether `ns` is a favourite afterwards.
    pub fn toggle(&mut self, ns: &str) -> bool {
        if let Some(i) = self.names.iter().position(|n| n == ns) {
            self.names.remove(i);
            false
        } else {
            self.names.push(ns.to_string());
            self.names.sort();
            true
        }
    }

    pub fn save(&self) -> Result<(), PrefsError> {
        let Some(path) = &self.path else { return Ok(()) };
        let json = serde_json::to_string_pretty(&self.names)?;
        let write = |p: &Path| -> std::io::Result<()> {
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(p, json)
        };
        write(path).map_err(|source| PrefsError::Write { path: path.clone(), source })
    }
}

fn read_names(path: &Path) -> Vec<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read favourite namespaces");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(mut names) => {
            names.retain(|n| !n.trim().is_empty());
            names.sort();
            names.dedup();
            names
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupt favourite namespaces");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, ns: &str) -> ObjectMeta {
        ObjectMeta { name: Some(name.into()), namespace: Some(ns.into()), ..ObjectMeta::default() }
    }

    #[test]
    fn filter_by_namespace_and_name() {
        let items = vec![meta("web-1", "shop"), meta("db-0", "shop"), meta("web-1", "blog")];
        let re = Regex::new("^web").unwrap();
        let kept = filter_objects(items, &NamespaceFilter::Only("shop".into()), Some(&re), |m| m);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name.as_deref(), Some("web-1"));
        assert_eq!(kept[0].namespace.as_deref(), Some("shop"));
    }

    #[test]
    fn all_namespaces_keeps_everything() {
        let items = vec![meta("a", "x"), meta("b", "y")];
        assert_eq!(filter_objects(items, &NamespaceFilter::All, None, |m| m).len(), 2);
    }

    #[test]
    fn cycling_wraps_back_to_all() {
        let known = vec!["a".to_string(), "b".to_string()];
        let step1 = NamespaceFilter::All.cycle(&known);
        assert_eq!(step1, NamespaceFilter::Only("a".into()));
        let step2 = step1.cycle(&known);
        assert_eq!(step2, NamespaceFilter::Only("b".into()));
        assert_eq!(step2.cycle(&known), NamespaceFilter::All);
        assert_eq!(NamespaceFilter::Only("gone".into()).cycle(&known), NamespaceFilter::All);
    }

    #[test]
    fn favorites_survive_a_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("favorites.json");

        let mut favs = Favorites::load(Some(path.clone()));
        assert!(favs.names().is_empty());
        assert!(favs.toggle("shop"));
        assert!(favs.toggle("blog"));
        favs.save().unwrap();

        let reloaded = Favorites::load(Some(path));
        assert_eq!(reloaded.names(), ["blog", "shop"]);
        assert!(reloaded.contains("shop"));
    }

    #[test]
    fn toggling_twice_removes() {
        let mut favs = Favorites::load(None);
        assert!(favs.toggle("shop"));
        assert!(!favs.toggle("shop"));
        assert!(!favs.contains("shop"));
        favs.save().unwrap();
    }

    #[test]
    fn corrupt_favorites_fall_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{\"not\": \"a list\"").unwrap();
        assert!(Favorites::load(Some(path)).names().is_empty());
    }

    #[test]
    fn blank_and_duplicate_names_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, r#"["shop", "", "shop", "  "]"#).unwrap();
        assert_eq!(Favorites::load(Some(path)).names(), ["shop"]);
    }
}
