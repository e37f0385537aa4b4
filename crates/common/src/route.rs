//! Application views and navigation targets

use serde::{Deserialize, Serialize};

/// A view of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    About,
    Login,
    Register,
    ForgotPassword,
    RecoverPassword,
    ChangePassword,
    Dashboard,
    Blast,
    Profile,
    Credits,
    Success,
    Cancelled,
    Error,
}

impl Route {
    pub const ALL: [Route; 14] = [
        Route::Home,
        Route::About,
        Route::Login,
        Route::Register,
        Route::ForgotPassword,
        Route::RecoverPassword,
        Route::ChangePassword,
        Route::Dashboard,
        Route::Blast,
        Route::Profile,
        Route::Credits,
        Route::Success,
        Route::Cancelled,
        Route::Error,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::About => "/about",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::RecoverPassword => "/recover-password",
            Route::ChangePassword => "/change-password",
            Route::Dashboard => "/dashboard",
            Route::Blast => "/blast",
            Route::Profile => "/profile",
            Route::Credits => "/credits",
            Route::Success => "/success",
            Route::Cancelled => "/cancelled",
            Route::Error => "/error",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split('?').next().unwrap_or(path);
        Route::ALL.iter().copied().find(|r| r.path() == path)
    }

    /// Views that require an authenticated session
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Blast | Route::Profile | Route::Credits | Route::ChangePassword
        )
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/recover-password?token=abc"), Some(Route::RecoverPassword));
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn test_protected_routes() {
        assert!(Route::Dashboard.is_protected());
        assert!(Route::ChangePassword.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(!Route::Success.is_protected());
    }
}
