use crate::domain::{
    AtelierId, BookingEvent, EquipmentId, Loan, LoanDraft, LoanId, PersonId, Reservation,
    ReservationDraft, ReservationId, check_availability,
};
use crate::ports::{BookingStore, Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{InMemoryStore, State};

impl State {
    fn reservations_where(&self, pred: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        self.reservations.values().filter(|r| pred(r)).cloned().collect()
    }

    fn loans_where(&self, pred: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        self.loans.values().filter(|l| pred(l)).cloned().collect()
    }

    fn equipment_atelier(&self, equipment_id: EquipmentId) -> Option<AtelierId> {
        self.equipment.get(&equipment_id).map(|e| e.atelier_id)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn reservations_for_equipment(
        &self,
        equipment_id: EquipmentId,
    ) -> Result<Vec<Reservation>> {
        Ok(self.state()?.reservations_where(|r| r.equipment_id == equipment_id))
    }

    async fn loans_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<Loan>> {
        Ok(self.state()?.loans_where(|l| l.equipment_id == equipment_id))
    }

    async fn get_reservation(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.state()?.reservations.get(&reservation_id).cloned())
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.state()?.loans.get(&loan_id).cloned())
    }

    async fn reservations_for_person(&self, person_id: PersonId) -> Result<Vec<Reservation>> {
        Ok(self.state()?.reservations_where(|r| r.person_id == person_id))
    }

    async fn loans_for_person(&self, person_id: PersonId) -> Result<Vec<Loan>> {
        Ok(self.state()?.loans_where(|l| l.person_id == person_id))
    }

    async fn reservations_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Reservation>> {
        let state = self.state()?;
        Ok(state.reservations_where(|r| {
            state
                .equipment_atelier(r.equipment_id)
                .is_some_and(|a| ateliers.contains(&a))
        }))
    }

    async fn loans_for_ateliers(&self, ateliers: &[AtelierId]) -> Result<Vec<Loan>> {
        Ok(self.state()?.loans_where(|l| ateliers.contains(&l.atelier_id)))
    }

    async fn all_reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.state()?.reservations.values().cloned().collect())
    }

    async fn all_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.state()?.loans.values().cloned().collect())
    }

    async fn insert_reservation(&self, draft: ReservationDraft) -> Result<Reservation> {
        let mut state = self.state()?;

        if !state.equipment.contains_key(&draft.equipment_id) {
            return Err(StoreError::NotFound);
        }

        let reservations = state.reservations_where(|r| r.equipment_id == draft.equipment_id);
        let loans = state.loans_where(|l| l.equipment_id == draft.equipment_id);
        check_availability(&draft.window, &reservations, &loans, None)
            .map_err(StoreError::Overlap)?;

        let reservation = Reservation {
            reservation_id: ReservationId::from_i64(state.next_id()),
            equipment_id: draft.equipment_id,
            person_id: draft.person_id,
            window: draft.window,
            created_at: draft.created_at,
        };
        state
            .reservations
            .insert(reservation.reservation_id, reservation.clone());
        state
            .events
            .push(BookingEvent::reservation_requested(&reservation));

        Ok(reservation)
    }

    async fn promote_reservation(
        &self,
        reservation_id: ReservationId,
        draft: LoanDraft,
        accepted_by: PersonId,
    ) -> Result<Loan> {
        let mut state = self.state()?;

        if !state.reservations.contains_key(&reservation_id) {
            return Err(StoreError::NotFound);
        }

        let reservations = state.reservations_where(|r| r.equipment_id == draft.equipment_id);
        let loans = state.loans_where(|l| l.equipment_id == draft.equipment_id);
        check_availability(&draft.window, &reservations, &loans, Some(reservation_id))
            .map_err(StoreError::Overlap)?;

        state.reservations.remove(&reservation_id);
        let loan = Loan {
            loan_id: LoanId::from_i64(state.next_id()),
            equipment_id: draft.equipment_id,
            person_id: draft.person_id,
            atelier_id: draft.atelier_id,
            window: draft.window,
            status: draft.status,
        };
        state.loans.insert(loan.loan_id, loan.clone());
        state.events.push(BookingEvent::reservation_accepted(
            reservation_id,
            &loan,
            accepted_by,
        ));

        Ok(loan)
    }

    async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        cancelled_by: PersonId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut state = self.state()?;
        let reservation = state
            .reservations
            .remove(&reservation_id)
            .ok_or(StoreError::NotFound)?;
        state.events.push(BookingEvent::reservation_cancelled(
            &reservation,
            cancelled_by,
            cancelled_at,
        ));
        Ok(reservation)
    }

    async fn return_loan(
        &self,
        loan_id: LoanId,
        returned_by: PersonId,
        returned_at: DateTime<Utc>,
    ) -> Result<Loan> {
        let mut state = self.state()?;
        let loan = state.loans.remove(&loan_id).ok_or(StoreError::NotFound)?;
        state
            .events
            .push(BookingEvent::loan_returned(&loan, returned_by, returned_at));
        Ok(loan)
    }

    async fn history_for_equipment(&self, equipment_id: EquipmentId) -> Result<Vec<BookingEvent>> {
        Ok(self
            .state()?
            .events
            .iter()
            .filter(|e| e.equipment_id() == equipment_id)
            .cloned()
            .collect())
    }
}
