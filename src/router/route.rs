//! Locations and the route table.
//!
//! A [`Location`] is a path plus ordered query pairs. Its `full_path` form is
//! what gets embedded as the `redirect` parameter on the login page, so
//! rendering percent-encodes keys and values and parsing decodes them.

use std::fmt;

pub const HOME_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";
pub const FORBIDDEN_PATH: &str = "/403";

/// Query key carrying the originally requested location on the login page.
pub const REDIRECT_PARAM: &str = "redirect";

// =============================================================================
// LOCATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self { path: normalize_path(path), query: Vec::new() }
    }

    /// Parse `"/users?page=2"` style input. Undecodable pairs are kept raw.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(key), decode(value))
            })
            .collect();
        Self { path: normalize_path(path), query }
    }

    /// `/login?redirect=<target>`.
    #[must_use]
    pub fn login_redirect(target: &str) -> Self {
        Self::new(LOGIN_PATH).with_query(REDIRECT_PARAM, target)
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return HOME_PATH.to_owned();
    }
    let with_slash = if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") };
    if with_slash.len() > 1 {
        with_slash.trim_end_matches('/').to_owned()
    } else {
        with_slash
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| raw.to_owned(), std::borrow::Cow::into_owned)
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

/// One entry of the route table. Only the metadata the guard and front ends
/// need is kept: title, required permission code, static redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub title: String,
    pub permission: Option<String>,
    pub redirect: Option<String>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: &str, name: &str, title: &str) -> Self {
        Self {
            path: path.to_owned(),
            name: name.to_owned(),
            title: title.to_owned(),
            permission: None,
            redirect: None,
        }
    }

    #[must_use]
    pub fn requires(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_owned());
        self
    }

    #[must_use]
    pub fn redirect_to(mut self, target: &str) -> Self {
        self.redirect = Some(target.to_owned());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    /// The console's pages and the permission each one requires.
    #[must_use]
    pub fn admin_default() -> Self {
        Self::new(vec![
            RouteRecord::new(LOGIN_PATH, "Login", "Login"),
            RouteRecord::new(FORBIDDEN_PATH, "403", "403"),
            RouteRecord::new(HOME_PATH, "Home", "Home").redirect_to(DASHBOARD_PATH),
            RouteRecord::new(DASHBOARD_PATH, "Dashboard", "Dashboard"),
            RouteRecord::new("/menus", "MenuList", "Menus").requires("system:menu"),
            RouteRecord::new("/users", "UserList", "Users").requires("system:user"),
            RouteRecord::new("/roles", "RoleList", "Roles").requires("system:role"),
            RouteRecord::new("/permissions", "PermissionList", "Permissions").requires("system:permission"),
            RouteRecord::new("/operation-logs", "OperationLogList", "Operation logs").requires("system:log"),
            RouteRecord::new("/profile", "Profile", "Profile").requires("system:profile"),
        ])
    }

    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteRecord> {
        self.routes.iter()
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
