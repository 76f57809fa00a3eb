use crate::domain::{PersonId, SessionToken};
use crate::ports::{Result, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{InMemoryStore, SessionEntry};

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn open_session(
        &self,
        person_id: PersonId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken> {
        let token = SessionToken::new();
        let mut state = self.state()?;
        state.sessions.retain(|_, s| s.expires_at > issued_at);
        state.sessions.insert(
            token,
            SessionEntry {
                person_id,
                expires_at,
            },
        );
        Ok(token)
    }

    async fn resolve_session(
        &self,
        token: SessionToken,
        at: DateTime<Utc>,
    ) -> Result<Option<PersonId>> {
        Ok(self
            .state()?
            .sessions
            .get(&token)
            .filter(|s| s.expires_at > at)
            .map(|s| s.person_id))
    }

    async fn close_session(&self, token: SessionToken) -> Result<()> {
        self.state()?.sessions.remove(&token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_session_expires_at_its_deadline() {
        let store = InMemoryStore::new();
        let person = PersonId::from_i64(1);
        let token = store
            .open_session(person, at(1), at(1) + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(
            store.resolve_session(token, at(1)).await.unwrap(),
            Some(person)
        );
        assert_eq!(store.resolve_session(token, at(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_opening_a_session_purges_expired_ones() {
        let store = InMemoryStore::new();
        let person = PersonId::from_i64(1);
        store.open_session(person, at(1), at(2)).await.unwrap();
        let live = store.open_session(person, at(1), at(10)).await.unwrap();
        assert_eq!(store.state().unwrap().sessions.len(), 2);

        store.open_session(person, at(5), at(6)).await.unwrap();

        let state = store.state().unwrap();
        assert_eq!(state.sessions.len(), 2);
        assert!(state.sessions.contains_key(&live));
    }
}
