//! Account administration: creation, advisor assignment, advisee listing.

mod common;

use assert_matches::assert_matches;
use common::{Cast, TestApp, TEST_PASSWORD};
use laurel_api::accounts::{NewAccount, ProfileUpdate};
use laurel_core::error::CoreError;
use laurel_core::roles::Role;
use laurel_db::models::refresh_token::ClientMeta;
use laurel_db::models::user::UserFilter;

fn student(email: &str) -> NewAccount {
    NewAccount {
        name: "Rina".into(),
        email: email.into(),
        password: "secret-pass".into(),
        role: Role::Student,
        student_number: Some("2024-0042".into()),
    }
}

async fn setup() -> (TestApp, Cast) {
    let app = TestApp::new();
    let cast = app.seed_cast().await;
    (app, cast)
}

/// A created account can log in with its password.
#[tokio::test]
async fn admin_creates_account_that_can_login() {
    let (app, cast) = setup().await;

    let user = app
        .state
        .accounts
        .create_user(&cast.admin, student("rina@campus.test"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.student_number.as_deref(), Some("2024-0042"));
    assert!(user.is_active);
    assert_ne!(user.password_hash, "secret-pass");

    let outcome = app
        .state
        .sessions
        .login("rina@campus.test", "secret-pass", &ClientMeta::default())
        .await
        .unwrap();
    assert_eq!(outcome.user.id, user.id);
}

/// Only admins create accounts.
#[tokio::test]
async fn non_admin_cannot_create_account() {
    let (app, cast) = setup().await;
    for actor in [cast.student, cast.advisor] {
        let err = app
            .state
            .accounts
            .create_user(&actor, student("rina@campus.test"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));
    }
}

/// A second account with the same email (any case) conflicts.
#[tokio::test]
async fn duplicate_email_conflicts() {
    let (app, cast) = setup().await;
    let err = app
        .state
        .accounts
        .create_user(&cast.admin, student("SARI@campus.test"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

/// Field checks: email format, password length, student number.
#[tokio::test]
async fn invalid_account_input_is_rejected() {
    let (app, cast) = setup().await;
    let cases = [
        NewAccount { email: "not-an-email".into(), ..student("x@campus.test") },
        NewAccount { password: "short".into(), ..student("y@campus.test") },
        NewAccount { student_number: None, ..student("z@campus.test") },
        NewAccount { name: "  ".into(), ..student("w@campus.test") },
    ];
    for input in cases {
        let err = app
            .state
            .accounts
            .create_user(&cast.admin, input)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }
}

/// Advisors and admins carry no student number.
#[tokio::test]
async fn student_number_is_dropped_for_staff() {
    let (app, cast) = setup().await;
    let advisor = app
        .state
        .accounts
        .create_user(
            &cast.admin,
            NewAccount {
                role: Role::Advisor,
                ..student("lecturer@campus.test")
            },
        )
        .await
        .unwrap();
    assert_eq!(advisor.role, Role::Advisor);
    assert!(advisor.student_number.is_none());
}

/// Assigning an advisor shows up in the advisee list.
#[tokio::test]
async fn assign_advisor_and_list_advisees() {
    let (app, cast) = setup().await;
    let accounts = &app.state.accounts;

    let student = accounts
        .assign_advisor(&cast.admin, cast.student.user_id, cast.advisor.user_id)
        .await
        .unwrap();
    assert_eq!(student.advisor_id, Some(cast.advisor.user_id));

    let advisees = accounts
        .list_advisees(&cast.advisor, cast.advisor.user_id)
        .await
        .unwrap();
    assert_eq!(advisees.len(), 1);
    assert_eq!(advisees[0].id, cast.student.user_id);

    let by_admin = accounts
        .list_advisees(&cast.admin, cast.advisor.user_id)
        .await
        .unwrap();
    assert_eq!(by_admin.len(), 1);
}

/// Only a student can have an advisor, and only an advisor can be one.
#[tokio::test]
async fn advisor_assignment_checks_roles() {
    let (app, cast) = setup().await;
    let accounts = &app.state.accounts;

    assert_matches!(
        accounts
            .assign_advisor(&cast.admin, cast.advisor.user_id, cast.advisor.user_id)
            .await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        accounts
            .assign_advisor(&cast.admin, cast.student.user_id, cast.other_student.user_id)
            .await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        accounts
            .assign_advisor(&cast.admin, cast.student.user_id, 9_999)
            .await,
        Err(CoreError::NotFound { .. })
    );
    assert_matches!(
        accounts
            .assign_advisor(&cast.advisor, cast.student.user_id, cast.advisor.user_id)
            .await,
        Err(CoreError::Forbidden(_))
    );
}

/// An inactive advisor cannot take on students.
#[tokio::test]
async fn inactive_advisor_cannot_be_assigned() {
    let (app, cast) = setup().await;
    app.deactivate(cast.advisor.user_id).await;

    let err = app
        .state
        .accounts
        .assign_advisor(&cast.admin, cast.student.user_id, cast.advisor.user_id)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

/// Another advisor or a student cannot read an advisor's list.
#[tokio::test]
async fn advisees_are_private_to_advisor_and_admin() {
    let (app, cast) = setup().await;
    let other_advisor = app
        .seed_user("lektor", "lektor@campus.test", Role::Advisor)
        .await;

    for actor in [cast.student, other_advisor.actor()] {
        assert_matches!(
            app.state
                .accounts
                .list_advisees(&actor, cast.advisor.user_id)
                .await,
            Err(CoreError::Forbidden(_))
        );
    }
}

/// The profile is the caller's own account.
#[tokio::test]
async fn profile_returns_caller() {
    let (app, cast) = setup().await;
    let me = app.state.accounts.profile(&cast.student).await.unwrap();
    assert_eq!(me.id, cast.student.user_id);
    assert_eq!(me.email, "sari@campus.test");

    // Seeded accounts share one password.
    assert!(app
        .state
        .sessions
        .login(&me.email, TEST_PASSWORD, &ClientMeta::default())
        .await
        .is_ok());
}

/// Emails are stored lowercased so uniqueness and lookup agree on case.
#[tokio::test]
async fn created_email_is_lowercased() {
    let (app, cast) = setup().await;
    let user = app
        .state
        .accounts
        .create_user(&cast.admin, student("  Rina@Campus.TEST "))
        .await
        .unwrap();
    assert_eq!(user.email, "rina@campus.test");

    let err = app
        .state
        .accounts
        .create_user(&cast.admin, student("rina@campus.test"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

/// Deactivation blocks login, ends refresh, and revokes live records.
#[tokio::test]
async fn deactivated_account_loses_sessions() {
    let (app, cast) = setup().await;
    let (_, refresh) = app.login("sari@campus.test").await;

    let user = app
        .state
        .accounts
        .set_active(&cast.admin, cast.student.user_id, false)
        .await
        .unwrap();
    assert!(!user.is_active);

    let records = app.tokens.records().await;
    assert!(records
        .iter()
        .filter(|r| r.user_id == cast.student.user_id)
        .all(|r| r.is_revoked));

    assert_matches!(
        app.state
            .sessions
            .login("sari@campus.test", TEST_PASSWORD, &ClientMeta::default())
            .await,
        Err(CoreError::Forbidden(_))
    );
    assert_matches!(
        app.state
            .sessions
            .refresh(&refresh, &ClientMeta::default())
            .await,
        Err(CoreError::Unauthorized(_))
    );

    app.state
        .accounts
        .set_active(&cast.admin, cast.student.user_id, true)
        .await
        .unwrap();
    assert!(app
        .state
        .sessions
        .login("sari@campus.test", TEST_PASSWORD, &ClientMeta::default())
        .await
        .is_ok());
}

/// Only admins change activation, and never their own.
#[tokio::test]
async fn activation_is_admin_only_and_not_self() {
    let (app, cast) = setup().await;
    for actor in [cast.student, cast.advisor] {
        assert_matches!(
            app.state
                .accounts
                .set_active(&actor, cast.other_student.user_id, false)
                .await,
            Err(CoreError::Forbidden(_))
        );
    }
    assert_matches!(
        app.state
            .accounts
            .set_active(&cast.admin, cast.admin.user_id, false)
            .await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        app.state.accounts.set_active(&cast.admin, 9_999, false).await,
        Err(CoreError::NotFound { .. })
    );
}

/// A deleted account cannot sign in and disappears from listings.
#[tokio::test]
async fn deleted_account_is_gone() {
    let (app, cast) = setup().await;
    let (_, refresh) = app.login("budi@campus.test").await;

    app.state
        .accounts
        .delete_user(&cast.admin, cast.other_student.user_id)
        .await
        .unwrap();

    assert_matches!(
        app.state
            .sessions
            .login("budi@campus.test", TEST_PASSWORD, &ClientMeta::default())
            .await,
        Err(CoreError::Unauthorized(_))
    );
    assert_matches!(
        app.state
            .sessions
            .refresh(&refresh, &ClientMeta::default())
            .await,
        Err(CoreError::Unauthorized(_))
    );
    assert_matches!(
        app.state
            .accounts
            .delete_user(&cast.admin, cast.other_student.user_id)
            .await,
        Err(CoreError::NotFound { .. })
    );

    let listed = app
        .state
        .accounts
        .list_users(&cast.admin, &UserFilter::default())
        .await
        .unwrap();
    assert!(listed.iter().all(|u| u.id != cast.other_student.user_id));
    assert_eq!(listed.len(), 3);
}

/// Admins cannot delete themselves; others cannot delete at all.
#[tokio::test]
async fn delete_is_admin_only_and_not_self() {
    let (app, cast) = setup().await;
    assert_matches!(
        app.state
            .accounts
            .delete_user(&cast.admin, cast.admin.user_id)
            .await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        app.state
            .accounts
            .delete_user(&cast.advisor, cast.student.user_id)
            .await,
        Err(CoreError::Forbidden(_))
    );
}

/// Listing filters by role and search; the advisor list skips inactive ones.
#[tokio::test]
async fn list_users_and_advisors() {
    let (app, cast) = setup().await;
    let lektor = app
        .seed_user("lektor", "lektor@campus.test", Role::Advisor)
        .await;

    let students = app
        .state
        .accounts
        .list_users(
            &cast.admin,
            &UserFilter {
                role: Some(Role::Student),
                ..UserFilter::default()
            },
        )
        .await
        .unwrap();
    let names: Vec<_> = students.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["budi", "sari"]);

    let found = app
        .state
        .accounts
        .list_users(
            &cast.admin,
            &UserFilter {
                search: Some("S-SARI".into()),
                ..UserFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, cast.student.user_id);

    app.deactivate(lektor.id).await;
    let advisors = app.state.accounts.list_advisors(&cast.admin).await.unwrap();
    let ids: Vec<_> = advisors.iter().map(|u| u.id).collect();
    assert_eq!(ids, [cast.advisor.user_id]);

    assert_matches!(
        app.state.accounts.list_users(&cast.student, &UserFilter::default()).await,
        Err(CoreError::Forbidden(_))
    );
}

/// Profile edits apply to the caller; a new password ends other sessions.
#[tokio::test]
async fn update_profile_changes_own_account() {
    let (app, cast) = setup().await;
    let (_, refresh) = app.login("sari@campus.test").await;

    let update = ProfileUpdate {
        name: Some(" Sari Dewi ".into()),
        email: Some("Sari.Dewi@Campus.test".into()),
        password: Some("brand-new-secret".into()),
    };
    let user = app
        .state
        .accounts
        .update_profile(&cast.student, update)
        .await
        .unwrap();
    assert_eq!(user.name, "Sari Dewi");
    assert_eq!(user.email, "sari.dewi@campus.test");

    assert_matches!(
        app.state
            .sessions
            .refresh(&refresh, &ClientMeta::default())
            .await,
        Err(CoreError::Unauthorized(_))
    );
    assert!(app
        .state
        .sessions
        .login("sari.dewi@campus.test", "brand-new-secret", &ClientMeta::default())
        .await
        .is_ok());
}

/// Profile edits are validated and cannot take another account's email.
#[tokio::test]
async fn update_profile_rejects_bad_input() {
    let (app, cast) = setup().await;
    let cases = [
        (
            ProfileUpdate {
                email: Some("BUDI@campus.test".into()),
                ..ProfileUpdate::default()
            },
            "conflict",
        ),
        (
            ProfileUpdate {
                email: Some("not-an-email".into()),
                ..ProfileUpdate::default()
            },
            "validation",
        ),
        (
            ProfileUpdate {
                password: Some("123".into()),
                ..ProfileUpdate::default()
            },
            "validation",
        ),
        (
            ProfileUpdate {
                name: Some("   ".into()),
                ..ProfileUpdate::default()
            },
            "validation",
        ),
    ];
    for (update, expected) in cases {
        let err = app
            .state
            .accounts
            .update_profile(&cast.student, update)
            .await
            .unwrap_err();
        match expected {
            "conflict" => assert_matches!(err, CoreError::Conflict(_)),
            _ => assert_matches!(err, CoreError::Validation(_)),
        }
    }

    // An empty update is a no-op read.
    let me = app
        .state
        .accounts
        .update_profile(&cast.student, ProfileUpdate::default())
        .await
        .unwrap();
    assert_eq!(me.email, "sari@campus.test");
}
