use serde::Serialize;

/// アプリケーション層エラーの分類
///
/// API層はこの分類でHTTPステータスを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 参照先が存在しない
    NotFound,
    /// 既存の予約・貸出と時間帯が重なる、または一意制約違反
    Conflict,
    /// 業務ルール違反（過去開始、期間超過、日付の順序など）
    PolicyViolation,
    /// 入力の形式不正
    InvalidInput,
    /// 有効なセッションがない
    Unauthenticated,
    /// 権限がない
    Forbidden,
    /// 永続化の失敗
    PersistenceFailure,
}
