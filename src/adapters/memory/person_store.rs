use crate::domain::{BookingEvent, Person, PersonDraft, PersonId, Role};
use crate::ports::{PersonStore, Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::InMemoryStore;

#[async_trait]
impl PersonStore for InMemoryStore {
    async fn insert_person(&self, draft: PersonDraft) -> Result<Person> {
        let mut state = self.state()?;
        if state.persons.values().any(|p| p.email == draft.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let person = Person {
            person_id: PersonId::from_i64(state.next_id()),
            first_name: draft.first_name,
            surname: draft.surname,
            email: draft.email,
            role: draft.role,
            password_hash: draft.password_hash,
            created_at: draft.created_at,
        };
        state.persons.insert(person.person_id, person.clone());
        Ok(person)
    }

    async fn get_person(&self, person_id: PersonId) -> Result<Option<Person>> {
        Ok(self.state()?.persons.get(&person_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>> {
        Ok(self
            .state()?
            .persons
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn list_persons(&self) -> Result<Vec<Person>> {
        Ok(self.state()?.persons.values().cloned().collect())
    }

    async fn update_role(&self, person_id: PersonId, role: Role) -> Result<Person> {
        let mut state = self.state()?;
        let person = state
            .persons
            .get_mut(&person_id)
            .ok_or(StoreError::NotFound)?;
        person.role = Some(role);
        Ok(person.clone())
    }

    async fn update_profile(
        &self,
        person_id: PersonId,
        first_name: &str,
        surname: &str,
        email: &str,
    ) -> Result<Person> {
        let mut state = self.state()?;
        if state
            .persons
            .values()
            .any(|p| p.person_id != person_id && p.email == email)
        {
            return Err(StoreError::DuplicateEmail);
        }

        let person = state
            .persons
            .get_mut(&person_id)
            .ok_or(StoreError::NotFound)?;
        person.first_name = first_name.to_string();
        person.surname = surname.to_string();
        person.email = email.to_string();
        Ok(person.clone())
    }

    async fn delete_person(
        &self,
        person_id: PersonId,
        deleted_by: PersonId,
        deleted_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state()?;
        state
            .persons
            .remove(&person_id)
            .ok_or(StoreError::NotFound)?;
        state.cancel_reservations_where(deleted_by, deleted_at, |r| r.person_id == person_id);

        let (dropped, kept): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut state.loans)
            .into_iter()
            .partition(|(_, l)| l.person_id == person_id);
        state.loans = kept;
        for loan in dropped.values() {
            state
                .events
                .push(BookingEvent::loan_returned(loan, deleted_by, deleted_at));
        }

        state.memberships.retain(|(p, _)| *p != person_id);
        state.sessions.retain(|_, s| s.person_id != person_id);
        Ok(())
    }
}
