//! Integration tests for the authentication service, running against
//! an in-memory SurrealDB-backed user repository.

use chrono::{Duration, Utc};
use leadhub_auth::config::AuthConfig;
use leadhub_auth::reset;
use leadhub_auth::service::{AuthService, ForgotPasswordOutcome, LoginInput, RegisterInput};
use leadhub_auth::token;
use leadhub_core::error::LeadHubError;
use leadhub_core::models::user::{Role, UpdateUser};
use leadhub_core::repository::UserRepository;
use leadhub_db::repository::SurrealUserRepository;
use surrealdb::engine::any::{self, Any};

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-not-for-production".into(),
        jwt_issuer: "leadhub-test".into(),
        ..Default::default()
    }
}

async fn setup() -> (
    AuthService<SurrealUserRepository<Any>>,
    SurrealUserRepository<Any>,
) {
    let db = any::connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leadhub_db::run_migrations(&db).await.unwrap();

    let repo = SurrealUserRepository::new(db);
    (AuthService::new(repo.clone(), test_config()), repo)
}

fn register_input(name: &str, email: &str, role: Option<Role>) -> RegisterInput {
    RegisterInput {
        name: name.into(),
        email: email.into(),
        password: "correct-horse-battery".into(),
        role,
    }
}

#[tokio::test]
async fn first_user_is_promoted_to_superadmin() {
    let (svc, _) = setup().await;

    // Requested role is ignored for the very first account.
    let first = svc
        .register(register_input("Alice", "alice@example.com", Some(Role::Agent)))
        .await
        .unwrap();
    assert_eq!(first.role, Role::Superadmin);

    // Later registrations default to agent.
    let second = svc
        .register(register_input("Bob", "bob@example.com", None))
        .await
        .unwrap();
    assert_eq!(second.role, Role::Agent);
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let (svc, _) = setup().await;

    svc.register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let err = svc
        .register(register_input("Clone", "ALICE@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::AlreadyExists { .. }));
}

#[tokio::test]
async fn short_password_rejected() {
    let (svc, _) = setup().await;

    let err = svc
        .register(RegisterInput {
            name: "Weak".into(),
            email: "weak@example.com".into(),
            password: "short".into(),
            role: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::Validation { .. }));
}

#[tokio::test]
async fn login_happy_path_and_token() {
    let (svc, _) = setup().await;
    let user = svc
        .register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let logged_in = svc
        .login(LoginInput {
            email: "Alice@Example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let bearer = svc.issue_token(&logged_in).unwrap();
    let claims = token::decode_access_token(&bearer, svc.config()).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.iss, "leadhub-test");
}

#[tokio::test]
async fn login_wrong_password_fails() {
    let (svc, _) = setup().await;
    svc.register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let err = svc
        .login(LoginInput {
            email: "alice@example.com".into(),
            password: "wrong-password".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn login_unknown_email_reads_like_bad_password() {
    let (svc, _) = setup().await;

    let err = svc
        .login(LoginInput {
            email: "nobody@example.com".into(),
            password: "irrelevant".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn login_deactivated_account_fails() {
    let (svc, repo) = setup().await;
    let user = svc
        .register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    repo.update(
        user.id,
        UpdateUser {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = svc
        .login(LoginInput {
            email: "alice@example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap_err();

    match &err {
        LeadHubError::AuthenticationFailed { reason } => {
            assert!(
                reason.contains("deactivated"),
                "expected 'deactivated' in reason: {reason}"
            );
        }
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn forgot_password_unknown_email() {
    let (svc, _) = setup().await;

    let outcome = svc.forgot_password("nobody@example.com").await.unwrap();
    assert!(matches!(outcome, ForgotPasswordOutcome::UnknownEmail));
}

#[tokio::test]
async fn forgot_password_stores_hashed_token() {
    let (svc, repo) = setup().await;
    svc.register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let outcome = svc.forgot_password("alice@example.com").await.unwrap();
    let ForgotPasswordOutcome::TokenIssued { user, raw_token } = outcome else {
        panic!("expected TokenIssued");
    };

    let stored = repo.get_by_id(user.id).await.unwrap();
    // Only the one-way transform of the raw token is persisted.
    assert_eq!(
        stored.reset_token_hash.as_deref(),
        Some(reset::hash_reset_token(&raw_token).as_str())
    );
    assert!(stored.reset_token_expires_at.unwrap() > Utc::now());
}

#[tokio::test]
async fn abort_clears_issued_token() {
    let (svc, repo) = setup().await;
    svc.register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let ForgotPasswordOutcome::TokenIssued { user, .. } =
        svc.forgot_password("alice@example.com").await.unwrap()
    else {
        panic!("expected TokenIssued");
    };

    svc.abort_password_reset(&user).await.unwrap();

    let stored = repo.get_by_id(user.id).await.unwrap();
    assert!(stored.reset_token_hash.is_none());
    assert!(stored.reset_token_expires_at.is_none());
}

#[tokio::test]
async fn reset_password_roundtrip_is_single_use() {
    let (svc, _) = setup().await;
    svc.register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let ForgotPasswordOutcome::TokenIssued { raw_token, .. } =
        svc.forgot_password("alice@example.com").await.unwrap()
    else {
        panic!("expected TokenIssued");
    };

    svc.reset_password(&raw_token, "brand-new-password")
        .await
        .unwrap();

    // New password works, old one does not.
    assert!(
        svc.login(LoginInput {
            email: "alice@example.com".into(),
            password: "brand-new-password".into(),
        })
        .await
        .is_ok()
    );
    assert!(
        svc.login(LoginInput {
            email: "alice@example.com".into(),
            password: "correct-horse-battery".into(),
        })
        .await
        .is_err()
    );

    // The token was cleared after use.
    let err = svc
        .reset_password(&raw_token, "another-password")
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::Validation { .. }));
}

#[tokio::test]
async fn expired_reset_token_rejected() {
    let (svc, repo) = setup().await;
    let user = svc
        .register(register_input("Alice", "alice@example.com", None))
        .await
        .unwrap();

    let raw_token = reset::generate_reset_token();
    repo.set_reset_token(
        user.id,
        &reset::hash_reset_token(&raw_token),
        Utc::now() - Duration::minutes(1),
    )
    .await
    .unwrap();

    let err = svc
        .reset_password(&raw_token, "brand-new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, LeadHubError::Validation { .. }));
}
