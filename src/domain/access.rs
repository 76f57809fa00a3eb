use serde::{Deserialize, Serialize};

use super::{AtelierId, PersonId};

/// 利用者ロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    AtelierManager,
    Teacher,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::AtelierManager => "atelier_manager",
            Role::Teacher => "teacher",
            Role::User => "user",
        }
    }

    /// 保存された文字列からロールを復元する
    ///
    /// 未知の値は`None`（ロールなし）として扱う。
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "atelier_manager" => Some(Role::AtelierManager),
            "teacher" => Some(Role::Teacher),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// 職員ロール（予約承認・貸出返却を扱える）か
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::AtelierManager | Role::Teacher)
    }
}

/// ロールごとの遷移先ページ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingPage {
    AdminPage,
    AtelierManagerPage,
    TeacherPage,
    UserPage,
    LoginPage,
}

impl LandingPage {
    pub fn path(&self) -> &'static str {
        match self {
            LandingPage::AdminPage => "/admin",
            LandingPage::AtelierManagerPage => "/atelier-manager",
            LandingPage::TeacherPage => "/teacher",
            LandingPage::UserPage => "/user",
            LandingPage::LoginPage => "/login",
        }
    }
}

/// ロールから遷移先ページを決める純粋関数
///
/// ロールなし・未知のロールはログインページへ。
pub fn landing_page(role: Option<Role>) -> LandingPage {
    match role {
        Some(Role::Admin) => LandingPage::AdminPage,
        Some(Role::AtelierManager) => LandingPage::AtelierManagerPage,
        Some(Role::Teacher) => LandingPage::TeacherPage,
        Some(Role::User) => LandingPage::UserPage,
        None => LandingPage::LoginPage,
    }
}

/// 操作の呼び出し元
///
/// セッションから解決され、すべてのユースケースに明示的に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub person_id: PersonId,
    pub role: Role,
    /// 所属アトリエ
    pub ateliers: Vec<AtelierId>,
}

impl Caller {
    pub fn is_member_of(&self, atelier_id: AtelierId) -> bool {
        self.ateliers.contains(&atelier_id)
    }
}

/// 職員が予約・貸出を操作できる範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationScope {
    /// どの職員もすべてのアトリエの予約・貸出を操作できる
    #[default]
    AnyAtelier,
    /// 職員は所属アトリエの機材に限る（管理者は全体）
    OwnAteliers,
}

impl std::str::FromStr for AuthorizationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any_atelier" => Ok(AuthorizationScope::AnyAtelier),
            "own_ateliers" => Ok(AuthorizationScope::OwnAteliers),
            _ => Err(format!("Invalid authorization scope: {}", s)),
        }
    }
}

/// 予約の承認・貸出の返却ができるか
pub fn can_manage_booking(caller: &Caller, atelier_id: AtelierId, scope: AuthorizationScope) -> bool {
    if !caller.role.is_staff() {
        return false;
    }
    match scope {
        AuthorizationScope::AnyAtelier => true,
        AuthorizationScope::OwnAteliers => {
            caller.role == Role::Admin || caller.is_member_of(atelier_id)
        }
    }
}

/// 予約を取り消せるか
///
/// 予約者本人、または範囲内の職員。
pub fn can_cancel_reservation(
    caller: &Caller,
    owner: PersonId,
    atelier_id: AtelierId,
    scope: AuthorizationScope,
) -> bool {
    caller.person_id == owner || can_manage_booking(caller, atelier_id, scope)
}

/// 機材を登録・削除できるか
pub fn can_manage_equipment(caller: &Caller, atelier_id: AtelierId) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::AtelierManager | Role::Teacher => caller.is_member_of(atelier_id),
        Role::User => false,
    }
}

/// アトリエのメンバーを追加・削除できるか
pub fn can_manage_members(caller: &Caller, atelier_id: AtelierId) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::AtelierManager => caller.is_member_of(atelier_id),
        Role::Teacher | Role::User => false,
    }
}

/// 他の利用者のロールを変更できるか
///
/// アトリエ管理者は管理者・アトリエ管理者の付与や剥奪はできない。
pub fn can_assign_role(caller: &Caller, current: Option<Role>, requested: Role) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::AtelierManager => {
            let privileged = |role: Role| matches!(role, Role::Admin | Role::AtelierManager);
            !privileged(requested) && !current.is_some_and(privileged)
        }
        Role::Teacher | Role::User => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role, ateliers: &[i64]) -> Caller {
        Caller {
            person_id: PersonId::from_i64(1),
            role,
            ateliers: ateliers.iter().copied().map(AtelierId::from_i64).collect(),
        }
    }

    #[test]
    fn test_landing_page_is_total() {
        assert_eq!(landing_page(Some(Role::Admin)), LandingPage::AdminPage);
        assert_eq!(
            landing_page(Some(Role::AtelierManager)),
            LandingPage::AtelierManagerPage
        );
        assert_eq!(landing_page(Some(Role::Teacher)), LandingPage::TeacherPage);
        assert_eq!(landing_page(Some(Role::User)), LandingPage::UserPage);
        assert_eq!(landing_page(None), LandingPage::LoginPage);
    }

    #[test]
    fn test_unknown_role_falls_back_to_login() {
        assert_eq!(Role::parse("janitor"), None);
        assert_eq!(landing_page(Role::parse("janitor")), LandingPage::LoginPage);
        assert_eq!(landing_page(Role::parse("")), LandingPage::LoginPage);
    }

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [Role::Admin, Role::AtelierManager, Role::Teacher, Role::User] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_students_cannot_manage_bookings() {
        let student = caller(Role::User, &[1]);
        assert!(!can_manage_booking(
            &student,
            AtelierId::from_i64(1),
            AuthorizationScope::AnyAtelier
        ));
    }

    #[test]
    fn test_any_atelier_scope_lets_staff_act_everywhere() {
        let teacher = caller(Role::Teacher, &[1]);
        assert!(can_manage_booking(
            &teacher,
            AtelierId::from_i64(99),
            AuthorizationScope::AnyAtelier
        ));
    }

    #[test]
    fn test_own_ateliers_scope_restricts_non_admin_staff() {
        let teacher = caller(Role::Teacher, &[1]);
        let admin = caller(Role::Admin, &[]);
        let foreign = AtelierId::from_i64(2);

        assert!(!can_manage_booking(&teacher, foreign, AuthorizationScope::OwnAteliers));
        assert!(can_manage_booking(
            &teacher,
            AtelierId::from_i64(1),
            AuthorizationScope::OwnAteliers
        ));
        assert!(can_manage_booking(&admin, foreign, AuthorizationScope::OwnAteliers));
    }

    #[test]
    fn test_owner_can_cancel_own_reservation() {
        let student = caller(Role::User, &[]);
        assert!(can_cancel_reservation(
            &student,
            student.person_id,
            AtelierId::from_i64(5),
            AuthorizationScope::OwnAteliers
        ));
        assert!(!can_cancel_reservation(
            &student,
            PersonId::from_i64(2),
            AtelierId::from_i64(5),
            AuthorizationScope::AnyAtelier
        ));
    }

    #[test]
    fn test_manager_cannot_grant_privileged_roles() {
        let manager = caller(Role::AtelierManager, &[1]);
        assert!(can_assign_role(&manager, Some(Role::User), Role::Teacher));
        assert!(!can_assign_role(&manager, Some(Role::User), Role::Admin));
        assert!(!can_assign_role(&manager, Some(Role::Admin), Role::User));
        assert!(can_assign_role(&caller(Role::Admin, &[]), None, Role::Admin));
        assert!(!can_assign_role(&caller(Role::Teacher, &[1]), None, Role::User));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(
            "own_ateliers".parse::<AuthorizationScope>(),
            Ok(AuthorizationScope::OwnAteliers)
        );
        assert!("everyone".parse::<AuthorizationScope>().is_err());
    }
}
