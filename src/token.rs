// Client-side storage for the backend bearer token

use parking_lot::RwLock;

pub trait TokenStore: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        self.token.write().take();
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        // blank tokens count as logged out
        self.token
            .read()
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token(), None);

        store.set("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.clear();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let store = MemoryTokenStore::with_token("   ");
        assert_eq!(store.token(), None);
    }
}
