mod common;

use common::{attrs, create_user, Ctx};
use social_graph::identity::password;
use social_graph::models::User;
use social_graph::AppError;

#[tokio::test]
async fn create_stores_a_verifiable_digest_and_no_plaintext() {
    for ctx in Ctx::all().await {
        let user = create_user(&ctx, "Example User", "user@example.com").await;

        assert!(!user.password_salt.is_empty());
        assert!(!user.password_digest.contains("secret"));
        assert!(password::verify("secret", &user.password_digest));
        assert!(!password::verify("invalid", &user.password_digest));

        let stored = ctx.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored, user);
    }
}

#[tokio::test]
async fn create_rejects_invalid_attributes() {
    for ctx in Ctx::all().await {
        let bad_name = attrs("", "a@b.c");
        assert!(matches!(
            ctx.users.create(bad_name).await,
            Err(AppError::Validation(_))
        ));

        let bad_email = attrs("Example User", "aa@kjkj");
        assert!(matches!(
            ctx.users.create(bad_email).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_password = attrs("Example User", "a@b.c");
        bad_password.password = "x".repeat(5);
        bad_password.password_confirmation = bad_password.password.clone();
        assert!(matches!(
            ctx.users.create(bad_password).await,
            Err(AppError::Validation(_))
        ));

        let mut mismatched = attrs("Example User", "a@b.c");
        mismatched.password_confirmation = "abcd".to_string();
        assert!(matches!(
            ctx.users.create(mismatched).await,
            Err(AppError::Validation(_))
        ));

        // Nothing was persisted along the way.
        assert!(ctx.users.find_by_email("a@b.c").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn duplicate_email_is_rejected_ignoring_case() {
    for ctx in Ctx::all().await {
        create_user(&ctx, "Example User", "user@example.com").await;

        let result = ctx.users.create(attrs("Other User", "USER@EXAMPLE.COM")).await;
        assert!(matches!(result, Err(AppError::DuplicateEmail(_))));
    }
}

#[tokio::test]
async fn storage_unique_index_backs_up_the_precheck() {
    // Straight to storage, bypassing the user store's pre-check, the way a
    // racing second creation would arrive.
    for ctx in Ctx::all().await {
        let first = create_user(&ctx, "Example User", "user@example.com").await;

        let racer = User {
            id: first.id + 1,
            name: "Racer".to_string(),
            email: "User@Example.Com".to_string(),
            password_salt: "salt".to_string(),
            password_digest: "digest".to_string(),
            admin: false,
            created_at: first.created_at,
        };
        assert!(matches!(
            ctx.storage.insert_user(racer).await,
            Err(AppError::DuplicateEmail(_))
        ));
    }
}

#[tokio::test]
async fn authenticate_matches_only_the_right_credentials() {
    for ctx in Ctx::all().await {
        let user = create_user(&ctx, "Example User", "user@example.com").await;

        let wrong_password = ctx
            .users
            .authenticate("user@example.com", "wrong_password")
            .await
            .unwrap();
        assert!(wrong_password.is_none());

        let unknown_email = ctx
            .users
            .authenticate("nobody@example.com", "secret")
            .await
            .unwrap();
        assert!(unknown_email.is_none());

        let matched = ctx
            .users
            .authenticate("user@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(matched, Some(user));
    }
}

#[tokio::test]
async fn authenticate_is_case_insensitive_on_email() {
    for ctx in Ctx::all().await {
        let user = create_user(&ctx, "Example User", "user@example.com").await;

        let matched = ctx
            .users
            .authenticate("USER@example.COM", "secret")
            .await
            .unwrap();
        assert_eq!(matched, Some(user));
    }
}

#[tokio::test]
async fn admin_defaults_false_and_toggles_round_trip() {
    for ctx in Ctx::all().await {
        let user = create_user(&ctx, "Example User", "user@example.com").await;
        assert!(!user.admin);

        let promoted = ctx.users.toggle_admin(user.id).await.unwrap();
        assert!(promoted.admin);

        // Persisted, not just returned.
        assert!(ctx.users.find_by_id(user.id).await.unwrap().unwrap().admin);

        let demoted = ctx.users.toggle_admin(user.id).await.unwrap();
        assert!(!demoted.admin);
    }
}

#[tokio::test]
async fn toggle_admin_on_unknown_user_fails() {
    for ctx in Ctx::all().await {
        assert!(matches!(
            ctx.users.toggle_admin(42).await,
            Err(AppError::UnknownUser(42))
        ));
    }
}

#[tokio::test]
async fn destroy_removes_the_record_and_frees_the_email() {
    for ctx in Ctx::all().await {
        let user = create_user(&ctx, "Example User", "user@example.com").await;

        ctx.users.destroy(user.id).await.unwrap();
        assert!(ctx.users.find_by_id(user.id).await.unwrap().is_none());

        // The email is reusable once the record is gone.
        create_user(&ctx, "Example User", "user@example.com").await;
    }
}

#[tokio::test]
async fn destroy_of_unknown_user_fails() {
    for ctx in Ctx::all().await {
        assert!(matches!(
            ctx.users.destroy(42).await,
            Err(AppError::UnknownUser(42))
        ));
    }
}
