use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AtelierId, EquipmentField, EquipmentId, EquipmentTypeId, EquipmentValidationError};

/// 最大貸出日数の上限
pub const MAX_LOAN_DURATION_LIMIT_DAYS: i32 = 365;

/// アトリエ - 機材を所有し、メンバーを持つ作業場
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atelier {
    pub atelier_id: AtelierId,
    pub name: String,
}

/// 機材種別
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentType {
    pub type_id: EquipmentTypeId,
    pub name: String,
}

/// 機材 - 貸出対象の物品
///
/// 不変条件：manufacture_date <= purchase_date <= 今日
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub equipment_id: EquipmentId,
    pub name: String,
    pub atelier_id: AtelierId,
    pub type_id: EquipmentTypeId,
    pub manufacture_date: NaiveDate,
    pub purchase_date: NaiveDate,
    /// 1回の予約で借りられる最大日数
    pub max_loan_duration_days: i32,
}

/// 採番前の機材
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentDraft {
    pub name: String,
    pub atelier_id: AtelierId,
    pub type_id: EquipmentTypeId,
    pub manufacture_date: NaiveDate,
    pub purchase_date: NaiveDate,
    pub max_loan_duration_days: i32,
}

/// 純粋関数：機材の登録内容を検証する
///
/// 項目ごとの違反をすべて集めて返す。
pub fn validate_equipment(
    draft: &EquipmentDraft,
    today: NaiveDate,
) -> Result<(), Vec<EquipmentValidationError>> {
    let mut errors = Vec::new();

    let name_len = draft.name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        errors.push(EquipmentValidationError::new(
            EquipmentField::Name,
            "name must be between 2 and 100 characters",
        ));
    }

    if draft.manufacture_date > draft.purchase_date {
        errors.push(EquipmentValidationError::new(
            EquipmentField::ManufactureDate,
            "manufacture date cannot be later than purchase date",
        ));
    }

    if draft.manufacture_date > today {
        errors.push(EquipmentValidationError::new(
            EquipmentField::ManufactureDate,
            "manufacture date must be in the past",
        ));
    }

    if draft.purchase_date > today {
        errors.push(EquipmentValidationError::new(
            EquipmentField::PurchaseDate,
            "purchase date must be in the past",
        ));
    }

    if !(1..=MAX_LOAN_DURATION_LIMIT_DAYS).contains(&draft.max_loan_duration_days) {
        errors.push(EquipmentValidationError::new(
            EquipmentField::MaxLoanDurationDays,
            "maximum loan duration must be between 1 and 365 days",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// 純粋関数：アトリエ名・種別名を検証する
pub fn validate_label(name: &str, max_len: usize) -> bool {
    let len = name.trim().chars().count();
    len >= 1 && len <= max_len
}
