//! Caller identity and one-shot flash notices.
//!
//! The browser holds a signed cookie with an opaque session id; the
//! [`CurrentUser`] extractor resolves it to an [`Identity`] through the
//! engine. Notices travel in a plain cookie holding a [`Notice`] code and
//! are consumed by the next page view.

use api_types::{
    Page,
    notice::{self, NoticeLevel},
};
use axum::{
    Json,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::{
    CookieJar, SignedCookieJar,
    cookie::{Cookie, SameSite},
};
use engine::Identity;

use crate::{ServerError, server::ServerState};

pub const SESSION_COOKIE: &str = "discounts_session";
pub const NOTICE_COOKIE: &str = "discounts_notice";

/// The session identity of a request, anonymous when `None`.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    /// Identity for page handlers; anonymous callers are sent to `/login`.
    pub fn page_user(&self) -> Result<&Identity, ServerError> {
        self.0.as_ref().ok_or(ServerError::LoginRequired)
    }

    /// Identity for JSON handlers; anonymous callers get a 401.
    pub fn api_user(&self) -> Result<&Identity, ServerError> {
        self.0.as_ref().ok_or(ServerError::Unauthorized)
    }

    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.username.as_str())
    }
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.key.clone());
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let identity = state.engine.identity(cookie.value()).await?;
        if identity.is_none() {
            tracing::debug!("stale session cookie ignored");
        }
        Ok(Self(identity))
    }
}

pub(crate) fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn session_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Every message the pages can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    VoteThanks,
    ReviewEmpty,
    ReviewAdded,
    AllFieldsRequired,
    UsernameTaken,
    EmailTaken,
    Registered,
    Welcome,
    InvalidCredentials,
    LoggedOut,
}

impl Notice {
    const ALL: [Notice; 11] = [
        Self::LoginRequired,
        Self::VoteThanks,
        Self::ReviewEmpty,
        Self::ReviewAdded,
        Self::AllFieldsRequired,
        Self::UsernameTaken,
        Self::EmailTaken,
        Self::Registered,
        Self::Welcome,
        Self::InvalidCredentials,
        Self::LoggedOut,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::LoginRequired => "login_required",
            Self::VoteThanks => "vote_thanks",
            Self::ReviewEmpty => "review_empty",
            Self::ReviewAdded => "review_added",
            Self::AllFieldsRequired => "all_fields_required",
            Self::UsernameTaken => "username_taken",
            Self::EmailTaken => "email_taken",
            Self::Registered => "registered",
            Self::Welcome => "welcome",
            Self::InvalidCredentials => "invalid_credentials",
            Self::LoggedOut => "logged_out",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|notice| notice.code() == code)
    }

    pub fn level(self) -> NoticeLevel {
        match self {
            Self::LoginRequired => NoticeLevel::Warning,
            Self::VoteThanks | Self::ReviewAdded | Self::Registered | Self::Welcome => {
                NoticeLevel::Success
            }
            Self::ReviewEmpty
            | Self::AllFieldsRequired
            | Self::UsernameTaken
            | Self::EmailTaken
            | Self::InvalidCredentials => NoticeLevel::Error,
            Self::LoggedOut => NoticeLevel::Info,
        }
    }

    /// Text shown to `username`, the viewer of the page if logged in.
    pub fn message(self, username: Option<&str>) -> String {
        let text = match self {
            Self::LoginRequired => "Необходимо войти в систему",
            Self::VoteThanks => "Спасибо за ваш ответ!",
            Self::ReviewEmpty => "Отзыв не может быть пустым",
            Self::ReviewAdded => "Отзыв успешно добавлен!",
            Self::AllFieldsRequired => "Все поля обязательны для заполнения",
            Self::UsernameTaken => "Пользователь с таким именем уже существует",
            Self::EmailTaken => "Пользователь с таким email уже существует",
            Self::Registered => "Регистрация успешна! Войдите в систему",
            Self::Welcome => {
                return match username {
                    Some(username) => format!("Добро пожаловать, {username}!"),
                    None => "Добро пожаловать!".to_string(),
                };
            }
            Self::InvalidCredentials => "Неверное имя пользователя или пароль",
            Self::LoggedOut => "Вы вышли из системы",
        };
        text.to_string()
    }

    pub fn view(self, username: Option<&str>) -> notice::Notice {
        notice::Notice {
            level: self.level(),
            message: self.message(username),
        }
    }

    pub fn cookie(self) -> Cookie<'static> {
        Cookie::build((NOTICE_COOKIE, self.code()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

/// Render a page, consuming the pending notice from `jar`.
pub(crate) fn page<T>(jar: CookieJar, user: &CurrentUser, body: T) -> (CookieJar, Json<Page<T>>) {
    let pending = jar
        .get(NOTICE_COOKIE)
        .and_then(|cookie| Notice::from_code(cookie.value()));
    let jar = match pending {
        Some(_) => jar.remove(Cookie::build(NOTICE_COOKIE).path("/")),
        None => jar,
    };
    (jar, Json(page_with(user, pending, body)))
}

/// Render a page with an explicit notice, leaving cookies alone.
pub(crate) fn page_with<T>(user: &CurrentUser, notice: Option<Notice>, body: T) -> Page<T> {
    let username = user.username();
    Page {
        current_user: username.map(str::to_string),
        notice: notice.map(|notice| notice.view(username)),
        body,
    }
}

/// `303 See Other` to `to`, showing `notice` there.
pub(crate) fn redirect_with(jar: CookieJar, to: &str, notice: Notice) -> (CookieJar, Redirect) {
    (jar.add(notice.cookie()), Redirect::to(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for notice in Notice::ALL {
            assert_eq!(Notice::from_code(notice.code()), Some(notice));
        }
        assert_eq!(Notice::from_code("bogus"), None);
    }

    #[test]
    fn welcome_greets_the_viewer() {
        assert_eq!(
            Notice::Welcome.message(Some("alice")),
            "Добро пожаловать, alice!"
        );
    }

    #[test]
    fn page_consumes_the_pending_notice() {
        let jar = CookieJar::new().add(Notice::ReviewAdded.cookie());
        let (jar, Json(page)) = page(jar, &CurrentUser::default(), ());

        let notice = page.notice.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Отзыв успешно добавлен!");
        assert!(jar.get(NOTICE_COOKIE).is_none());
    }

    #[test]
    fn anonymous_user_is_rejected() {
        let user = CurrentUser::default();
        assert!(matches!(user.page_user(), Err(ServerError::LoginRequired)));
        assert!(matches!(user.api_user(), Err(ServerError::Unauthorized)));
    }
}
