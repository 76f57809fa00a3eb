//! 機材カレンダー（予約・貸出の表示用イベント）

use crate::application::ServiceDependencies;
use crate::application::booking::{BookingError, Result};
use crate::domain::{Equipment, EquipmentId, Loan, Person, PersonId, Reservation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarEventKind {
    Reservation,
    Loan,
}

/// カレンダーの1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub kind: CalendarEventKind,
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 純粋関数：予約・貸出をカレンダーイベントに射影する
///
/// 予約が先、貸出が後。それぞれ開始時刻順。
pub fn project_calendar(
    equipment: &Equipment,
    reservations: &[Reservation],
    loans: &[Loan],
    persons: &HashMap<PersonId, Person>,
) -> Vec<CalendarEvent> {
    let borrower = |person_id: PersonId| {
        persons
            .get(&person_id)
            .map(Person::full_name)
            .unwrap_or_else(|| format!("person #{}", person_id))
    };

    let mut reservation_events: Vec<CalendarEvent> = reservations
        .iter()
        .map(|r| CalendarEvent {
            kind: CalendarEventKind::Reservation,
            label: format!("Reservation of {} - {}", equipment.name, borrower(r.person_id)),
            start: r.window.start(),
            end: r.window.end(),
        })
        .collect();
    reservation_events.sort_by_key(|e| e.start);

    let mut loan_events: Vec<CalendarEvent> = loans
        .iter()
        .map(|l| CalendarEvent {
            kind: CalendarEventKind::Loan,
            label: format!("Loan of {} - {}", equipment.name, borrower(l.person_id)),
            start: l.window.start(),
            end: l.window.end(),
        })
        .collect();
    loan_events.sort_by_key(|e| e.start);

    reservation_events.extend(loan_events);
    reservation_events
}

/// 機材のカレンダーを取得する
pub async fn equipment_calendar(
    deps: &ServiceDependencies,
    equipment_id: EquipmentId,
) -> Result<Vec<CalendarEvent>> {
    let equipment = deps
        .inventory_store
        .get_equipment(equipment_id)
        .await?
        .ok_or(BookingError::EquipmentNotFound)?;

    let (reservations, loans) = futures::try_join!(
        deps.booking_store.reservations_for_equipment(equipment_id),
        deps.booking_store.loans_for_equipment(equipment_id),
    )?;

    let mut persons = HashMap::new();
    let person_ids = reservations
        .iter()
        .map(|r| r.person_id)
        .chain(loans.iter().map(|l| l.person_id));
    for person_id in person_ids {
        if persons.contains_key(&person_id) {
            continue;
        }
        if let Some(person) = deps.person_store.get_person(person_id).await? {
            persons.insert(person_id, person);
        }
    }

    Ok(project_calendar(&equipment, &reservations, &loans, &persons))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AtelierId, EquipmentTypeId, LoanId, LoanStatus, ReservationId, Role, TimeWindow,
    };
    use chrono::{NaiveDate, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn easel() -> Equipment {
        Equipment {
            equipment_id: EquipmentId::from_i64(1),
            name: "Easel".to_string(),
            atelier_id: AtelierId::from_i64(1),
            type_id: EquipmentTypeId::from_i64(1),
            manufacture_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            purchase_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            max_loan_duration_days: 7,
        }
    }

    fn ada() -> Person {
        Person {
            person_id: PersonId::from_i64(7),
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: "ada@school.example".to_string(),
            role: Some(Role::User),
            password_hash: String::new(),
            created_at: at(1, 0),
        }
    }

    #[test]
    fn test_labels_name_equipment_and_borrower() {
        let reservation = Reservation {
            reservation_id: ReservationId::from_i64(1),
            equipment_id: EquipmentId::from_i64(1),
            person_id: PersonId::from_i64(7),
            window: TimeWindow::new(at(5, 9), at(6, 9)).unwrap(),
            created_at: at(1, 0),
        };
        let loan = Loan {
            loan_id: LoanId::from_i64(1),
            equipment_id: EquipmentId::from_i64(1),
            person_id: PersonId::from_i64(7),
            atelier_id: AtelierId::from_i64(1),
            window: TimeWindow::new(at(2, 9), at(3, 9)).unwrap(),
            status: LoanStatus::Active,
        };
        let persons = HashMap::from([(PersonId::from_i64(7), ada())]);

        let events = project_calendar(&easel(), &[reservation], &[loan], &persons);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, CalendarEventKind::Reservation);
        assert_eq!(events[0].label, "Reservation of Easel - Ada Lovelace");
        assert_eq!(events[1].kind, CalendarEventKind::Loan);
        assert_eq!(events[1].label, "Loan of Easel - Ada Lovelace");
        assert_eq!(events[1].start, at(2, 9));
    }

    #[test]
    fn test_unknown_borrower_is_labelled_by_id() {
        let reservation = Reservation {
            reservation_id: ReservationId::from_i64(1),
            equipment_id: EquipmentId::from_i64(1),
            person_id: PersonId::from_i64(99),
            window: TimeWindow::new(at(5, 9), at(6, 9)).unwrap(),
            created_at: at(1, 0),
        };

        let events = project_calendar(&easel(), &[reservation], &[], &HashMap::new());
        assert_eq!(events[0].label, "Reservation of Easel - person #99");
    }
}
