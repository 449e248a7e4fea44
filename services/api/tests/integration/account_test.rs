use chrono::{Duration, Utc};

use moodzic_api::error::ApiError;
use moodzic_api::usecase::account::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase, RequestPasswordResetUseCase,
    ResetPasswordInput, ResetPasswordUseCase, VerifyUseCase,
};
use moodzic_api::usecase::credential::verify_password;
use moodzic_auth_types::token::validate_access_token;
use moodzic_domain::id::UserId;
use moodzic_domain::user::UserRole;

use crate::helpers::{MockUserRepo, TEST_JWT_SECRET, TEST_PASSWORD, test_user, with_reset_code};

// ── RegisterUseCase ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_user_with_default_role_and_hashed_password() {
    let repo = MockUserRepo::empty();
    let usecase = RegisterUseCase {
        users: repo.clone(),
    };

    let id = usecase
        .execute(RegisterInput {
            email: "new@moodzic.dev".into(),
            password: "s3cret".into(),
        })
        .await
        .unwrap();

    let stored = repo.get(id).unwrap();
    assert_eq!(stored.email, "new@moodzic.dev");
    assert_eq!(stored.role, UserRole::User);
    assert_ne!(stored.password_hash, "s3cret");
    assert!(!stored.salt.is_empty());
    assert!(verify_password("s3cret", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn should_reject_duplicate_email_without_second_row() {
    let repo = MockUserRepo::new(vec![test_user("taken@moodzic.dev", UserRole::User)]);
    let usecase = RegisterUseCase {
        users: repo.clone(),
    };

    let result = usecase
        .execute(RegisterInput {
            email: "taken@moodzic.dev".into(),
            password: "other".into(),
        })
        .await;

    assert!(
        matches!(result, Err(ApiError::UserAlreadyExists)),
        "expected UserAlreadyExists, got {result:?}"
    );
    assert_eq!(repo.users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_blank_registration_fields() {
    let usecase = RegisterUseCase {
        users: MockUserRepo::empty(),
    };
    let result = usecase
        .execute(RegisterInput {
            email: "".into(),
            password: "pw".into(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

// ── LoginUseCase ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_login_and_issue_token_with_user_id_and_role() {
    let user = test_user("admin@moodzic.dev", UserRole::Admin);
    let repo = MockUserRepo::new(vec![user.clone()]);
    let usecase = LoginUseCase {
        users: repo.clone(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };

    let out = usecase
        .execute(LoginInput {
            email: user.email.clone(),
            password: TEST_PASSWORD.into(),
        })
        .await
        .unwrap();

    assert_eq!(out.user.id, user.id);
    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.user_role, UserRole::Admin);
    assert_eq!(info.access_token_exp, out.access_token_exp);

    let now = Utc::now().timestamp() as u64;
    assert!(out.access_token_exp > now + 3500 && out.access_token_exp <= now + 3600);

    assert!(repo.get(user.id).unwrap().last_login.is_some());
}

#[tokio::test]
async fn should_return_not_found_for_unknown_email() {
    let usecase = LoginUseCase {
        users: MockUserRepo::empty(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = usecase
        .execute(LoginInput {
            email: "ghost@moodzic.dev".into(),
            password: "pw".into(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::UserNotFound)));
}

#[tokio::test]
async fn should_return_invalid_credentials_for_wrong_password() {
    let user = test_user("u@moodzic.dev", UserRole::User);
    let usecase = LoginUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    };
    let result = usecase
        .execute(LoginInput {
            email: user.email,
            password: "wrong".into(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidCredentials)));
}

// ── RequestPasswordResetUseCase ──────────────────────────────────────────────

#[tokio::test]
async fn should_store_six_digit_code_and_outbox_event() {
    let user = test_user("u@moodzic.dev", UserRole::User);
    let repo = MockUserRepo::new(vec![user.clone()]);
    let usecase = RequestPasswordResetUseCase {
        users: repo.clone(),
    };

    usecase.execute(&user.email).await.unwrap();

    let stored = repo.get(user.id).unwrap();
    let code = stored.reset_code.clone().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let expiry = stored.reset_code_expiry.unwrap();
    let ttl = expiry - Utc::now();
    assert!(ttl > Duration::minutes(59) && ttl <= Duration::hours(1));

    let outbox = repo.outbox.lock().unwrap();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].kind, "password_reset_requested");
    assert_eq!(outbox[0].user_id, user.id);
    assert_eq!(outbox[0].payload["reset_code"], code.as_str());
    assert_eq!(outbox[0].payload["email"], "u@moodzic.dev");
}

#[tokio::test]
async fn should_reveal_unknown_email_on_reset_request() {
    let repo = MockUserRepo::empty();
    let usecase = RequestPasswordResetUseCase {
        users: repo.clone(),
    };
    let result = usecase.execute("ghost@moodzic.dev").await;
    assert!(matches!(result, Err(ApiError::UserNotFound)));
    assert!(repo.outbox.lock().unwrap().is_empty());
}

// ── ResetPasswordUseCase ─────────────────────────────────────────────────────

fn reset_input(email: &str, code: &str, new_password: &str) -> ResetPasswordInput {
    ResetPasswordInput {
        email: email.into(),
        reset_code: code.into(),
        new_password: new_password.into(),
    }
}

#[tokio::test]
async fn should_reset_password_and_clear_code() {
    let user = with_reset_code(
        test_user("u@moodzic.dev", UserRole::User),
        "123456",
        Utc::now() + Duration::minutes(30),
    );
    let old_salt = user.salt.clone();
    let repo = MockUserRepo::new(vec![user.clone()]);
    let usecase = ResetPasswordUseCase {
        users: repo.clone(),
    };

    usecase
        .execute(reset_input(&user.email, "123456", "brand-new"))
        .await
        .unwrap();

    let stored = repo.get(user.id).unwrap();
    assert!(stored.reset_code.is_none());
    assert!(stored.reset_code_expiry.is_none());
    assert_ne!(stored.salt, old_salt);
    assert!(verify_password("brand-new", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn should_not_accept_a_consumed_code_twice() {
    let user = with_reset_code(
        test_user("u@moodzic.dev", UserRole::User),
        "123456",
        Utc::now() + Duration::minutes(30),
    );
    let usecase = ResetPasswordUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
    };

    usecase
        .execute(reset_input(&user.email, "123456", "first"))
        .await
        .unwrap();
    let second = usecase
        .execute(reset_input(&user.email, "123456", "second"))
        .await;
    assert!(
        matches!(second, Err(ApiError::InvalidResetCode)),
        "expected InvalidResetCode, got {second:?}"
    );
}

#[tokio::test]
async fn should_reject_mismatched_code() {
    let user = with_reset_code(
        test_user("u@moodzic.dev", UserRole::User),
        "123456",
        Utc::now() + Duration::minutes(30),
    );
    let usecase = ResetPasswordUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
    };
    let result = usecase
        .execute(reset_input(&user.email, "000000", "pw"))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidResetCode)));
}

#[tokio::test]
async fn should_reject_reset_for_unknown_email() {
    let usecase = ResetPasswordUseCase {
        users: MockUserRepo::empty(),
    };
    let result = usecase
        .execute(reset_input("ghost@moodzic.dev", "123456", "pw"))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidResetCode)));
}

#[tokio::test]
async fn should_reject_expired_code_and_keep_password() {
    let user = with_reset_code(
        test_user("u@moodzic.dev", UserRole::User),
        "123456",
        Utc::now() - Duration::seconds(1),
    );
    let repo = MockUserRepo::new(vec![user.clone()]);
    let usecase = ResetPasswordUseCase {
        users: repo.clone(),
    };

    let result = usecase
        .execute(reset_input(&user.email, "123456", "pw"))
        .await;
    assert!(matches!(result, Err(ApiError::ResetCodeExpired)));
    assert_eq!(repo.get(user.id).unwrap().password_hash, user.password_hash);
}

// ── VerifyUseCase ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_live_profile_for_verify() {
    let mut user = test_user("u@moodzic.dev", UserRole::User);
    user.role = UserRole::Admin;
    let usecase = VerifyUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
    };
    let profile = usecase.execute(user.id).await.unwrap();
    assert_eq!(profile.role, UserRole::Admin);

    let missing = usecase.execute(UserId::generate()).await;
    assert!(matches!(missing, Err(ApiError::UserNotFound)));
}
