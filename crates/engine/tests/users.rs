mod common;

use chrono::Utc;
use engine::{EngineError, NewUser, Role, UserPatch};
use sea_orm::{ConnectionTrait, SqlErr, Statement};

use common::{ALICE, BOB, ROOT, as_user, engine_with_db};

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Carol".to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn register_then_login() {
    let (engine, _db) = engine_with_db().await;
    let carol = engine
        .register_user(new_user("carol@example.com"))
        .await
        .unwrap();
    assert_eq!(carol.role, Role::User);

    let logged = engine.login("  CAROL@example.com ", "secret").await.unwrap();
    assert_eq!(logged.id, carol.id);

    let err = engine.login("carol@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthenticated(_)));
}

#[tokio::test]
async fn register_rejects_duplicate_email_case_insensitive() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .register_user(new_user("ALICE@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn register_stores_email_lowercased() {
    let (engine, _db) = engine_with_db().await;
    let carol = engine
        .register_user(new_user("  Carol@Example.COM "))
        .await
        .unwrap();
    assert_eq!(carol.email, "carol@example.com");

    let updated = engine
        .update_user(
            &carol.id,
            UserPatch {
                email: Some("C.Lewis@Example.com".to_string()),
                ..UserPatch::default()
            },
            &as_user(&carol.id),
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "c.lewis@example.com");
}

#[tokio::test]
async fn store_refuses_duplicate_email_rows() {
    let (_engine, db) = engine_with_db().await;
    let now = Utc::now();
    let res = db
        .execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT INTO users (id, name, email, password, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            vec![
                "alice-2".into(),
                "Alice".into(),
                "alice@example.com".into(),
                "password".into(),
                "USER".into(),
                now.into(),
                now.into(),
            ],
        ))
        .await;
    let err = res.unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn register_validates_fields() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .register_user(NewUser {
            name: "  ".to_string(),
            ..new_user("dan@example.com")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "name", .. }));

    let err = engine
        .register_user(new_user("not-an-email"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "email", .. }));
}

#[tokio::test]
async fn list_users_is_admin_only() {
    let (engine, _db) = engine_with_db().await;
    let users = engine.list_users(&as_user(ROOT)).await.unwrap();
    assert_eq!(users.len(), 3);

    assert!(matches!(
        engine.list_users(&as_user(ALICE)).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn user_cannot_read_someone_else() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(engine.user(ALICE, &as_user(ALICE)).await.unwrap().id, ALICE);
    assert!(matches!(
        engine.user(ALICE, &as_user(BOB)).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn update_merges_supplied_fields() {
    let (engine, _db) = engine_with_db().await;
    let before = engine.user(ALICE, &as_user(ALICE)).await.unwrap();
    let updated = engine
        .update_user(
            ALICE,
            UserPatch {
                name: Some("Alice Liddell".to_string()),
                ..UserPatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Liddell");
    assert_eq!(updated.email, before.email);
    assert!(updated.updated_at >= before.updated_at);
}

#[tokio::test]
async fn update_refuses_taken_email() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .update_user(
            ALICE,
            UserPatch {
                email: Some("Bob@Example.com".to_string()),
                ..UserPatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn self_promotion_is_forbidden() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .update_user(
            ALICE,
            UserPatch {
                role: Some(Role::Admin),
                ..UserPatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn soft_deleted_user_is_hidden_but_keeps_email() {
    let (engine, _db) = engine_with_db().await;
    engine.delete_user(BOB, &as_user(ROOT)).await.unwrap();

    assert!(matches!(
        engine.user(BOB, &as_user(ROOT)).await,
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(engine.list_users(&as_user(ROOT)).await.unwrap().len(), 2);
    assert!(engine.login("bob@example.com", "password").await.is_err());
    assert!(matches!(
        engine.register_user(new_user("bob@example.com")).await,
        Err(EngineError::Conflict(_))
    ));
}

#[tokio::test]
async fn assign_role_by_email() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine
        .assign_role("BOB@example.com", Role::Admin)
        .await
        .unwrap();
    assert_eq!(bob.role, Role::Admin);

    assert!(matches!(
        engine.assign_role("nobody@example.com", Role::Admin).await,
        Err(EngineError::NotFound(_))
    ));
}
