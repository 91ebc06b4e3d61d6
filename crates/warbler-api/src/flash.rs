//! One-shot notices carried across a redirect in the `warbler_flash` cookie.
//! The cookie holds a short code; the text is rendered server-side.

use tower_cookies::{Cookie, Cookies};

pub const FLASH_COOKIE: &str = "warbler_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Unauthorized,
    Welcome,
    LoggedOut,
    AccountDeleted,
    MessageDeleted,
    ProfileUpdated,
}

impl Flash {
    const ALL: [Flash; 6] = [
        Flash::Unauthorized,
        Flash::Welcome,
        Flash::LoggedOut,
        Flash::AccountDeleted,
        Flash::MessageDeleted,
        Flash::ProfileUpdated,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Flash::Unauthorized => "unauthorized",
            Flash::Welcome => "welcome",
            Flash::LoggedOut => "logged-out",
            Flash::AccountDeleted => "account-deleted",
            Flash::MessageDeleted => "message-deleted",
            Flash::ProfileUpdated => "profile-updated",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Bootstrap alert class suffix.
    pub fn category(self) -> &'static str {
        match self {
            Flash::Unauthorized => "danger",
            Flash::AccountDeleted | Flash::LoggedOut => "info",
            _ => "success",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Flash::Unauthorized => "Access unauthorized.",
            Flash::Welcome => "Welcome back!",
            Flash::LoggedOut => "You have been logged out.",
            Flash::AccountDeleted => "Your account has been deleted.",
            Flash::MessageDeleted => "Message deleted.",
            Flash::ProfileUpdated => "Profile updated.",
        }
    }
}

pub fn set(cookies: &Cookies, flash: Flash) {
    let mut cookie = Cookie::new(FLASH_COOKIE, flash.code());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
}

/// Reads and clears the pending notice, if any.
pub fn take(cookies: &Cookies) -> Option<Flash> {
    let code = cookies.get(FLASH_COOKIE)?.value().to_string();
    let mut removal = Cookie::from(FLASH_COOKIE);
    removal.set_path("/");
    cookies.remove(removal);
    Flash::from_code(&code)
}
