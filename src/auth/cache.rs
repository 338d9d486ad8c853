//! Short-lived cache of validated OAuth tokens.
//!
//! Avoids a userinfo round trip for every session creation with the
//! same token. Entries expire after a fixed five minutes; the map is
//! capacity-bounded so a churn of distinct tokens cannot grow it
//! without limit.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::UserContext;

/// Fixed validation-result lifetime.
const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

pub struct TokenCache {
    capacity: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    user_context: UserContext,
    expires_at: Instant,
}

impl TokenCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A hit is only honored while the entry is still fresh; expired
    /// entries count as misses and get overwritten on revalidation.
    pub fn get(&self, token: &str) -> Option<UserContext> {
        let entries = self.entries.read().unwrap();
        entries
            .get(token)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.user_context.clone())
    }

    pub fn insert(&self, token: String, user_context: UserContext) {
        self.insert_with_ttl(token, user_context, TOKEN_TTL);
    }

    fn insert_with_ttl(&self, token: String, user_context: UserContext, ttl: Duration) {
        let mut entries = self.entries.write().unwrap();

        if !entries.contains_key(&token) && entries.len() >= self.capacity {
            let now = Instant::now();
            entries.retain(|_, entry| now < entry.expires_at);

            // Still full after dropping expired entries: evict whatever
            // is closest to expiring anyway.
            if entries.len() >= self.capacity {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(key, _)| key.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            token,
            CacheEntry {
                user_context,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}
