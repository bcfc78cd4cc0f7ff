//! URL pattern routing.
//!
//! Patterns come in four shapes, matched in precedence order:
//!
//! 1. exact, e.g: `/status`
//! 2. longest path prefix, e.g: `/api/*`
//! 3. extension, e.g: `*.html`
//! 4. default, `/`
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::error::RouteError;
use crate::filter::Handler;


/// A parsed URL pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches the path itself and any path below it.
    Prefix(String),
    /// Matches any path whose final segment carries the extension.
    Extension(String),
    /// Matches when nothing else does.
    Default,
}

impl RoutePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> RoutePattern {
        if pattern == "/" {
            RoutePattern::Default
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            RoutePattern::Prefix(prefix.to_owned())
        } else if let Some(ext) = pattern.strip_prefix("*.") {
            RoutePattern::Extension(ext.to_owned())
        } else if pattern.is_empty() {
            RoutePattern::Exact("/".to_owned())
        } else {
            RoutePattern::Exact(pattern.to_owned())
        }
    }
}

/// A registered handler with its id.
#[derive(Clone)]
pub(crate) struct Entry {
    id: Arc<str>,
    handler: Arc<dyn Handler>,
}

/// Result of matching a request path against the table.
pub(crate) enum RouteDecision {
    /// A handler matched.
    Match { handler: Arc<dyn Handler>, handler_id: Arc<str> },
    /// The path named the context root without its trailing slash.
    RedirectRoot,
    /// Nothing matched and no default handler is registered.
    NotFound,
}

/// Immutable snapshot of registered routes.
#[derive(Clone, Default)]
pub(crate) struct RouteTable {
    context_path: String,
    exact: HashMap<String, Entry>,
    prefix: Vec<(String, Entry)>,
    extension: HashMap<String, Entry>,
    default: Option<Entry>,
}

impl RouteTable {
    pub(crate) fn new(context_path: String) -> RouteTable {
        RouteTable { context_path, ..Default::default() }
    }

    /// Register a handler under a pattern.
    ///
    /// Re-registering a pattern is rejected.
    pub(crate) fn register(
        &mut self,
        pattern: &str,
        id: impl Into<Arc<str>>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let duplicate = || RouteError::DuplicatePattern(pattern.to_owned());
        let entry = Entry { id: id.into(), handler };
        match RoutePattern::parse(pattern) {
            RoutePattern::Exact(path) => {
                if self.exact.contains_key(&path) {
                    return Err(duplicate());
                }
                self.exact.insert(path, entry);
            }
            RoutePattern::Prefix(prefix) => {
                if self.prefix.iter().any(|(p, _)| *p == prefix) {
                    return Err(duplicate());
                }
                self.prefix.push((prefix, entry));
            }
            RoutePattern::Extension(ext) => {
                if self.extension.contains_key(&ext) {
                    return Err(duplicate());
                }
                self.extension.insert(ext, entry);
            }
            RoutePattern::Default => {
                if self.default.is_some() {
                    return Err(duplicate());
                }
                self.default = Some(entry);
            }
        }
        Ok(())
    }

    /// Match a request path, query excluded.
    pub(crate) fn resolve(&self, path: &str) -> RouteDecision {
        let path = path.split('?').next().unwrap_or(path);

        let rel = if self.context_path.is_empty() {
            path
        } else {
            match path.strip_prefix(self.context_path.as_str()) {
                Some(rel) if rel.is_empty() || rel.starts_with('/') => rel,
                _ => return RouteDecision::NotFound,
            }
        };

        // a request for the bare context path is sent back to the root
        if rel.is_empty() && !self.context_path.is_empty() {
            return RouteDecision::RedirectRoot;
        }
        let rel = if rel.is_empty() { "/" } else { rel };

        if let Some(entry) = self.exact.get(rel) {
            return entry.decision();
        }

        let mut best: Option<(&str, &Entry)> = None;
        for (prefix, entry) in &self.prefix {
            if prefix_matches(prefix, rel)
                && best.is_none_or(|(longest, _)| prefix.len() > longest.len())
            {
                best = Some((prefix, entry));
            }
        }
        if let Some((_, entry)) = best {
            return entry.decision();
        }

        if let Some(ext) = extension_of(rel) {
            if let Some(entry) = self.extension.get(ext) {
                return entry.decision();
            }
        }

        match &self.default {
            Some(entry) => entry.decision(),
            None => RouteDecision::NotFound,
        }
    }

    #[inline]
    pub(crate) fn context_path(&self) -> &str {
        &self.context_path
    }
}

impl Entry {
    fn decision(&self) -> RouteDecision {
        RouteDecision::Match { handler: self.handler.clone(), handler_id: self.id.clone() }
    }
}

/// A prefix pattern `<prefix>/*` matches the prefix path itself and anything
/// below it. The empty prefix, from the `/*` pattern, matches everything.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}

/// Extension of the final path segment, e.g: `/docs/page.html` yields `html`.
fn extension_of(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

// ===== Routes =====

/// Swappable route table supporting registration at runtime.
///
/// Lookups read a lock free snapshot, writers clone the table, mutate it and
/// swap the snapshot in.
pub(crate) struct Routes {
    table: ArcSwap<RouteTable>,
    write: Mutex<()>,
}

impl Routes {
    pub(crate) fn new(table: RouteTable) -> Routes {
        Routes { table: ArcSwap::from_pointee(table), write: Mutex::new(()) }
    }

    pub(crate) fn load(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    pub(crate) fn register(
        &self,
        pattern: &str,
        id: impl Into<Arc<str>>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouteError> {
        let _guard = self.write.lock().unwrap_or_else(|e| e.into_inner());
        let mut table = RouteTable::clone(&self.table.load());
        table.register(pattern, id, handler)?;
        self.table.store(Arc::new(table));
        Ok(())
    }
}

impl std::fmt::Debug for Routes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let table = self.table.load();
        f.debug_struct("Routes")
            .field("context_path", &table.context_path)
            .field("exact", &table.exact.len())
            .field("prefix", &table.prefix.len())
            .field("extension", &table.extension.len())
            .field("default", &table.default.is_some())
            .finish()
    }
}
