//! Route permission map: which dashboard screen needs which permission.
//!
//! Patterns are `/`-separated; a segment starting with `:` matches any single
//! non-empty segment. Routes not listed here are open to any signed-in
//! operator.

use crate::permissions::catalog::*;
use crate::Permission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub page_access_permission: Option<Permission>,
}

const fn open(path: &'static str) -> RouteEntry {
    RouteEntry {
        path,
        page_access_permission: None,
    }
}

const fn guarded(path: &'static str, permission: Permission) -> RouteEntry {
    RouteEntry {
        path,
        page_access_permission: Some(permission),
    }
}

/// The dashboard's navigation table.
pub const ROUTES: &[RouteEntry] = &[
    guarded("/", VIEW_DASHBOARD),
    open("/profile"),
    open("/profile/password"),
    guarded("/campaigns", VIEW_CAMPAIGNS),
    guarded("/campaigns/create", CREATE_CAMPAIGN),
    guarded("/campaigns/:id", VIEW_CAMPAIGNS),
    guarded("/campaigns/:id/edit", EDIT_CAMPAIGN),
    guarded("/screens", VIEW_SCREENS),
    guarded("/screens/create", CREATE_SCREEN),
    guarded("/screens/:id", VIEW_SCREENS),
    guarded("/screens/:id/edit", EDIT_SCREEN),
    guarded("/events", VIEW_EVENTS),
    guarded("/events/create", CREATE_EVENT),
    guarded("/events/:id", VIEW_EVENTS),
    guarded("/events/:id/edit", EDIT_EVENT),
    guarded("/roles", VIEW_ROLES),
    guarded("/roles/create", CREATE_ROLE),
    guarded("/roles/:id", VIEW_ROLES),
    guarded("/roles/:id/edit", EDIT_ROLE),
    guarded("/roles/:id/permissions", ASSIGN_PERMISSIONS),
    guarded("/users", VIEW_USERS),
    guarded("/users/create", CREATE_USER),
    guarded("/users/:id", VIEW_USERS),
    guarded("/users/:id/edit", EDIT_USER),
    guarded("/media", VIEW_MEDIA),
    guarded("/media/upload", UPLOAD_MEDIA),
    guarded("/permissions", VIEW_PERMISSIONS),
];

/// Immutable lookup over a route table.
#[derive(Debug, Clone, Copy)]
pub struct RouteMap {
    entries: &'static [RouteEntry],
}

impl Default for RouteMap {
    fn default() -> Self {
        Self::new(ROUTES)
    }
}

impl RouteMap {
    pub const fn new(entries: &'static [RouteEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [RouteEntry] {
        self.entries
    }

    /// Find the entry for a concrete path.
    ///
    /// Query string, fragment and trailing slashes are ignored. When several
    /// patterns match, the one with the most literal segments wins, so
    /// `/events/create` beats `/events/:id`.
    pub fn lookup(&self, path: &str) -> Option<&'static RouteEntry> {
        let path = normalize(path);
        let segments: Vec<&str> = split(path).collect();

        self.entries
            .iter()
            .filter_map(|entry| match_score(entry.path, &segments).map(|score| (score, entry)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, entry)| entry)
    }

    /// The permission needed to open `path`, `None` when the route is open or unmapped.
    pub fn required_permission(&self, path: &str) -> Option<&'static Permission> {
        self.lookup(path).and_then(|e| e.page_access_permission.as_ref())
    }
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Number of literal segments matched, or `None` if the pattern does not apply.
fn match_score(pattern: &str, segments: &[&str]) -> Option<usize> {
    let mut literal = 0;
    let mut pattern_segments = split(pattern);

    for segment in segments {
        let expected = pattern_segments.next()?;
        if expected.starts_with(':') {
            continue;
        }
        if expected != *segment {
            return None;
        }
        literal += 1;
    }

    match pattern_segments.next() {
        Some(_) => None,
        None => Some(literal),
    }
}
