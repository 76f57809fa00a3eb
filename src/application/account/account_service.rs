use crate::application::ServiceDependencies;
use crate::domain::{
    self, Caller, LandingPage, Person, PersonDraft, PersonId, Role, SessionToken, commands::*,
};
use crate::ports::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::{AccountError, Result};
use super::password::{hash_password_blocking, verify_password_blocking};

/// ログイン・登録の結果
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    pub token: SessionToken,
    pub person: Person,
    pub landing_page: LandingPage,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 利用者を登録し、そのままログインさせる
///
/// 新規登録者のロールは常に`user`。
pub async fn register(deps: &ServiceDependencies, cmd: RegisterPerson) -> Result<SessionGrant> {
    domain::validate_registration(&cmd.first_name, &cmd.surname, &cmd.email, &cmd.password)
        .map_err(AccountError::InvalidRegistration)?;

    let draft = PersonDraft {
        first_name: cmd.first_name.trim().to_string(),
        surname: cmd.surname.trim().to_string(),
        email: normalize_email(&cmd.email),
        role: Some(Role::User),
        password_hash: hash_password_blocking(cmd.password).await?,
        created_at: cmd.registered_at,
    };

    let person = deps.person_store.insert_person(draft).await?;
    let token = deps
        .session_store
        .open_session(
            person.person_id,
            cmd.registered_at,
            cmd.registered_at + deps.session_ttl,
        )
        .await?;

    tracing::info!(person_id = %person.person_id, "person registered");

    Ok(SessionGrant {
        token,
        landing_page: domain::landing_page(person.role),
        person,
    })
}

/// メールアドレスとパスワードでログインする
///
/// 利用者が存在しない場合とパスワード不一致は区別しない。
pub async fn login(
    deps: &ServiceDependencies,
    email: &str,
    password: &str,
    logged_in_at: DateTime<Utc>,
) -> Result<SessionGrant> {
    let person = deps
        .person_store
        .find_by_email(&normalize_email(email))
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    if !verify_password_blocking(password.to_string(), person.password_hash.clone()).await? {
        tracing::warn!(person_id = %person.person_id, "login rejected");
        return Err(AccountError::InvalidCredentials);
    }

    let token = deps
        .session_store
        .open_session(
            person.person_id,
            logged_in_at,
            logged_in_at + deps.session_ttl,
        )
        .await?;

    Ok(SessionGrant {
        token,
        landing_page: domain::landing_page(person.role),
        person,
    })
}

/// セッションを破棄する
pub async fn logout(deps: &ServiceDependencies, token: SessionToken) -> Result<()> {
    deps.session_store.close_session(token).await?;
    Ok(())
}

/// セッショントークンから呼び出し元を解決する
///
/// セッションが無効・期限切れ、利用者が削除済み、ロールが未設定のいずれも`Unauthenticated`。
pub async fn resolve_caller(
    deps: &ServiceDependencies,
    token: SessionToken,
    at: DateTime<Utc>,
) -> Result<Caller> {
    let person_id = deps
        .session_store
        .resolve_session(token, at)
        .await?
        .ok_or(AccountError::Unauthenticated)?;

    let person = deps
        .person_store
        .get_person(person_id)
        .await?
        .ok_or(AccountError::Unauthenticated)?;

    let role = person.role.ok_or(AccountError::Unauthenticated)?;
    let ateliers = deps.inventory_store.ateliers_of(person_id).await?;

    Ok(Caller {
        person_id,
        role,
        ateliers,
    })
}

/// トークンの持ち主の遷移先ページ
///
/// トークンなし・無効なトークンはログインページ。
pub async fn landing_for(
    deps: &ServiceDependencies,
    token: Option<SessionToken>,
    at: DateTime<Utc>,
) -> Result<LandingPage> {
    let Some(token) = token else {
        return Ok(LandingPage::LoginPage);
    };

    let Some(person_id) = deps.session_store.resolve_session(token, at).await? else {
        return Ok(LandingPage::LoginPage);
    };

    let role = deps
        .person_store
        .get_person(person_id)
        .await?
        .and_then(|person| person.role);

    Ok(domain::landing_page(role))
}

/// 自分の氏名とメールアドレスを更新する
///
/// 変更がなければ何もせずに現在の内容を返す。
pub async fn update_profile(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: UpdateProfile,
) -> Result<Person> {
    domain::validate_profile(&cmd.first_name, &cmd.surname, &cmd.email)
        .map_err(AccountError::InvalidRegistration)?;

    let current = deps
        .person_store
        .get_person(caller.person_id)
        .await?
        .ok_or(AccountError::PersonNotFound)?;

    let first_name = cmd.first_name.trim();
    let surname = cmd.surname.trim();
    let email = normalize_email(&cmd.email);
    if current.first_name == first_name && current.surname == surname && current.email == email {
        return Ok(current);
    }

    let person = deps
        .person_store
        .update_profile(caller.person_id, first_name, surname, &email)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AccountError::PersonNotFound,
            other => other.into(),
        })?;

    tracing::info!(person_id = %person.person_id, "profile updated");

    Ok(person)
}

/// 利用者のロールを変更する
///
/// ビジネスルール：
/// - 管理者はどのロールでも付与できる
/// - アトリエ管理者は自分のアトリエのメンバーに限り、管理者・アトリエ管理者以外を付与できる
pub async fn change_role(
    deps: &ServiceDependencies,
    caller: &Caller,
    cmd: ChangeRole,
) -> Result<Person> {
    let target = deps
        .person_store
        .get_person(cmd.person_id)
        .await?
        .ok_or(AccountError::PersonNotFound)?;

    if !domain::can_assign_role(caller, target.role, cmd.role) {
        return Err(AccountError::Forbidden("role change not permitted"));
    }

    if caller.role == Role::AtelierManager {
        let target_ateliers = deps.inventory_store.ateliers_of(target.person_id).await?;
        if !target_ateliers.iter().any(|a| caller.is_member_of(*a)) {
            return Err(AccountError::Forbidden(
                "person is not a member of your ateliers",
            ));
        }
    }

    let person = deps
        .person_store
        .update_role(cmd.person_id, cmd.role)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AccountError::PersonNotFound,
            other => other.into(),
        })?;

    tracing::info!(
        person_id = %person.person_id,
        role = cmd.role.as_str(),
        changed_by = %caller.person_id,
        "role changed"
    );

    Ok(person)
}

/// 利用者を削除する（管理者のみ）
///
/// 予約・貸出・所属・セッションも削除される。予約・貸出の履歴は残る。
pub async fn delete_person(
    deps: &ServiceDependencies,
    caller: &Caller,
    person_id: PersonId,
    deleted_at: DateTime<Utc>,
) -> Result<()> {
    if caller.role != Role::Admin {
        return Err(AccountError::Forbidden("only administrators may delete persons"));
    }

    deps.person_store
        .delete_person(person_id, caller.person_id, deleted_at)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AccountError::PersonNotFound,
            other => other.into(),
        })?;

    tracing::info!(person_id = %person_id, deleted_by = %caller.person_id, "person deleted");

    Ok(())
}
