// KnownUser Infrastructure - Cookie Adapter
// Implements: StateRepository on top of a CookieJar

mod cookie_jar;
mod cookie_value;
mod state_cookie_repository;

pub use cookie_jar::{CookieJar, InMemoryCookieJar};
pub use cookie_value::{CookieValueError, StateCookieValue};
pub use state_cookie_repository::{cookie_key, StateCookieRepository};
