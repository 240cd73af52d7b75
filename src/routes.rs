//! Screens of the point-of-sale and their paths

use std::fmt;

/// One screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Tables,
    Menus,
    MenuCategories,
    Orders,
    CreateOrder { table_id: i64 },
    EditOrder { order_id: i64 },
    Warehouse,
    Printer,
    Dashboard,
}

impl Route {
    /// Where signed-in users land
    pub const DEFAULT: Route = Route::Tables;

    /// Match a path, ignoring a query string and a trailing slash
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["tables"] => Route::Tables,
            ["menus"] => Route::Menus,
            ["menus", "categories"] => Route::MenuCategories,
            ["orders"] => Route::Orders,
            ["orders", "create", id] => Route::CreateOrder {
                table_id: id.parse().ok()?,
            },
            ["orders", "edit", id] => Route::EditOrder {
                order_id: id.parse().ok()?,
            },
            ["almacen"] => Route::Warehouse,
            ["printer"] => Route::Printer,
            ["dashboard"] => Route::Dashboard,
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Tables => "/tables".to_string(),
            Route::Menus => "/menus".to_string(),
            Route::MenuCategories => "/menus/categories".to_string(),
            Route::Orders => "/orders".to_string(),
            Route::CreateOrder { table_id } => format!("/orders/create/{}", table_id),
            Route::EditOrder { order_id } => format!("/orders/edit/{}", order_id),
            Route::Warehouse => "/almacen".to_string(),
            Route::Printer => "/printer".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Screen actually shown: protected screens send signed-out users to the
    /// login, and the login sends signed-in users on.
    pub fn resolve(self, signed_in: bool) -> Route {
        match (self, signed_in) {
            (Route::Login, true) => Route::DEFAULT,
            (route, false) if route.requires_auth() => Route::Login,
            (route, _) => route,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
