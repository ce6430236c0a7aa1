mod cookie;
mod local;
mod session_store;

pub use cookie::{CookieJar, HeaderCookieJar, MemoryCookieJar, NoCookies};
pub use local::{
    KeyValueStore, LocalStorage, NoStorage, StorageEvent, TabId, TabStorage, TabStorageEvents,
};
pub use session_store::{PersistentSessionStore, SessionStore};
