use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// ストアが採番する整数IDの値オブジェクトを定義する
///
/// エンティティ種別ごとに別の型にすることで、
/// 予約IDを貸出IDとして渡すような取り違えをコンパイル時に防ぐ。
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn from_i64(value: i64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// 利用者ID（学生・教員・管理者すべて）
    PersonId
);
entity_id!(
    /// アトリエID - 機材の所属場所
    AtelierId
);
entity_id!(
    /// 機材種別ID
    EquipmentTypeId
);
entity_id!(
    /// 機材ID
    EquipmentId
);
entity_id!(
    /// 予約ID
    ReservationId
);
entity_id!(
    /// 貸出ID
    LoanId
);

/// セッショントークン - 認証済み利用者を識別する不透明な値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// 予約時間帯のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindowError {
    /// 終了が開始以前（長さ0の区間を含む）
    EndNotAfterStart,
}

/// 半開区間 `[start, end)` の時間帯
///
/// 不変条件：start < end
/// 長さ0の区間はここで拒否されるため、重複判定には到達しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = String;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
            .map_err(|_| format!("invalid time window: {} .. {}", raw.start, raw.end))
    }
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeWindowError> {
        if start >= end {
            return Err(TimeWindowError::EndNotAfterStart);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// 半開区間の重複判定
    ///
    /// 端点が接しているだけの区間は重複しない。
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 区間の長さ（日数、端数切り捨て）
    pub fn whole_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
