//! Behaviour of the in-memory store adapters.
//!
//! These adapters back every service-level test, so they must honour the
//! same guards as the SQL repositories:
//! - refresh records are classified `NotFound | Revoked | Expired`
//! - revoke is a compare-and-swap that succeeds once
//! - achievement writes only apply when the pre-state matches
//! - soft-deleted rows disappear from reads

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use laurel_core::achievement::AchievementStatus;
use laurel_core::refresh::RefreshRejection;
use laurel_core::roles::Role;
use laurel_core::types::Timestamp;
use laurel_db::memory::{
    MemoryAchievementStore, MemoryAttachmentStore, MemoryRefreshTokenStore, MemoryUserStore,
};
use laurel_db::models::achievement::{CreateAchievement, StatusChange, UpdateAchievement};
use laurel_db::models::attachment::CreateAttachment;
use laurel_db::models::refresh_token::CreateRefreshToken;
use laurel_db::models::user::{CreateUser, UpdateUser, UserFilter};
use laurel_db::store::{AchievementStore, AttachmentStore, RefreshTokenStore, UserStore};
use laurel_db::{LookupError, StoreError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn new_user(email: &str, role: Role) -> CreateUser {
    CreateUser {
        name: format!("User {email}"),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role,
        student_number: (role == Role::Student).then(|| "S-001".to_string()),
    }
}

fn new_token(user_id: i64, hash: &str) -> CreateRefreshToken {
    CreateRefreshToken {
        user_id,
        token_hash: hash.to_string(),
        issued_at: t0(),
        expires_at: t0() + Duration::days(7),
        ip_address: Some("10.0.0.1".to_string()),
        user_agent: None,
    }
}

fn new_achievement(owner_id: i64, title: &str) -> CreateAchievement {
    CreateAchievement {
        owner_id,
        title: title.to_string(),
        description: "Y".to_string(),
        category: "Z".to_string(),
        achievement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Email uniqueness is case-insensitive and reported as a duplicate.
#[tokio::test]
async fn duplicate_email_is_rejected() {
    let store = MemoryUserStore::new();
    store
        .create(&new_user("ana@example.com", Role::Student), t0())
        .await
        .unwrap();

    let err = store
        .create(&new_user("ANA@example.com", Role::Advisor), t0())
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Duplicate(_));
}

/// Soft-deleted users cannot be found by email but remain addressable by id.
#[tokio::test]
async fn deleted_user_is_hidden_from_email_lookup() {
    let store = MemoryUserStore::new();
    let user = store
        .create(&new_user("bo@example.com", Role::Student), t0())
        .await
        .unwrap();
    assert!(store.soft_delete(user.id, t0()).await.unwrap());
    assert!(!store.soft_delete(user.id, t0()).await.unwrap());

    assert!(store.find_by_email("bo@example.com").await.unwrap().is_none());
    let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!by_id.can_sign_in());
}

/// A changed email may not collide with another account, whatever its case.
#[tokio::test]
async fn update_email_respects_case_insensitive_uniqueness() {
    let store = MemoryUserStore::new();
    let ana = store
        .create(&new_user("ana@example.com", Role::Student), t0())
        .await
        .unwrap();
    store
        .create(&new_user("bo@example.com", Role::Student), t0())
        .await
        .unwrap();

    let clash = UpdateUser {
        email: Some("BO@example.com".into()),
        ..UpdateUser::default()
    };
    assert_matches!(
        store.update(ana.id, &clash, t0()).await,
        Err(StoreError::Duplicate(_))
    );

    // Re-casing one's own address is not a collision.
    let own = UpdateUser {
        email: Some("Ana@Example.com".into()),
        ..UpdateUser::default()
    };
    let updated = store.update(ana.id, &own, t0()).await.unwrap().unwrap();
    assert_eq!(updated.email, "Ana@Example.com");
    assert_eq!(updated.name, ana.name);
}

/// Activation and updates skip soft-deleted rows.
#[tokio::test]
async fn deleted_user_cannot_be_reactivated() {
    let store = MemoryUserStore::new();
    let user = store
        .create(&new_user("cy@example.com", Role::Advisor), t0())
        .await
        .unwrap();

    let later = t0() + Duration::hours(1);
    let inactive = store.set_active(user.id, false, later).await.unwrap().unwrap();
    assert!(!inactive.is_active);
    assert_eq!(inactive.updated_at, later);

    assert!(store.soft_delete(user.id, later).await.unwrap());
    assert!(store.set_active(user.id, true, later).await.unwrap().is_none());
    assert!(store
        .update(user.id, &UpdateUser::default(), later)
        .await
        .unwrap()
        .is_none());
}

/// Listing filters by role, search term, and activity, ordered by name.
#[tokio::test]
async fn list_applies_filter() {
    let store = MemoryUserStore::new();
    let mut ids = Vec::new();
    for (name, email, role) in [
        ("Zed", "zed@example.com", Role::Advisor),
        ("Ada", "ada@example.com", Role::Advisor),
        ("Bea", "bea@example.com", Role::Student),
        ("Gone", "gone@example.com", Role::Advisor),
    ] {
        let mut input = new_user(email, role);
        input.name = name.to_string();
        ids.push(store.create(&input, t0()).await.unwrap().id);
    }
    store.set_active(ids[0], false, t0()).await.unwrap();
    store.soft_delete(ids[3], t0()).await.unwrap();

    let names = |users: Vec<laurel_db::models::user::User>| {
        users.into_iter().map(|u| u.name).collect::<Vec<_>>()
    };

    let all = store.list(&UserFilter::default()).await.unwrap();
    assert_eq!(names(all), ["Ada", "Bea", "Zed"]);

    let advisors = UserFilter {
        role: Some(Role::Advisor),
        ..UserFilter::default()
    };
    assert_eq!(names(store.list(&advisors).await.unwrap()), ["Ada", "Zed"]);

    let active_advisors = UserFilter {
        active_only: true,
        ..advisors.clone()
    };
    assert_eq!(names(store.list(&active_advisors).await.unwrap()), ["Ada"]);

    let search = UserFilter {
        search: Some("  BEA@ ".into()),
        ..UserFilter::default()
    };
    assert_eq!(names(store.list(&search).await.unwrap()), ["Bea"]);
}

/// Only students can be pointed at an advisor.
#[tokio::test]
async fn set_advisor_only_applies_to_students() {
    let store = MemoryUserStore::new();
    let student = store
        .create(&new_user("s@example.com", Role::Student), t0())
        .await
        .unwrap();
    let advisor = store
        .create(&new_user("a@example.com", Role::Advisor), t0())
        .await
        .unwrap();

    let updated = store
        .set_advisor(student.id, advisor.id, t0())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.advisor_id, Some(advisor.id));
    assert!(store
        .set_advisor(advisor.id, advisor.id, t0())
        .await
        .unwrap()
        .is_none());

    let advisees = store.list_advisees(advisor.id).await.unwrap();
    assert_eq!(advisees.len(), 1);
    assert_eq!(advisees[0].id, student.id);
}

// ---------------------------------------------------------------------------
// Refresh tokens
// ---------------------------------------------------------------------------

/// `find_valid` distinguishes the three rejection kinds.
#[tokio::test]
async fn find_valid_classifies_records() {
    let store = MemoryRefreshTokenStore::new();
    let record = store.store(&new_token(1, "h1")).await.unwrap();

    let found = store.find_valid("h1", 1, t0()).await.unwrap();
    assert_eq!(found.id, record.id);

    assert_matches!(
        store.find_valid("h1", 2, t0()).await,
        Err(LookupError::Rejected(RefreshRejection::NotFound))
    );
    assert_matches!(
        store.find_valid("h1", 1, t0() + Duration::days(7)).await,
        Err(LookupError::Rejected(RefreshRejection::Expired))
    );

    store.revoke(record.id, t0()).await.unwrap();
    assert_matches!(
        store.find_valid("h1", 1, t0()).await,
        Err(LookupError::Rejected(RefreshRejection::Revoked))
    );
}

/// Revoking twice flips the row once.
#[tokio::test]
async fn revoke_is_compare_and_swap() {
    let store = MemoryRefreshTokenStore::new();
    let record = store.store(&new_token(1, "h1")).await.unwrap();

    assert!(store.revoke(record.id, t0()).await.unwrap());
    assert!(!store.revoke(record.id, t0()).await.unwrap());
    assert!(!store.revoke(999, t0()).await.unwrap());
}

/// Concurrent revokes of one record produce exactly one winner.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_revoke_has_single_winner() {
    let store = Arc::new(MemoryRefreshTokenStore::new());
    let record = store.store(&new_token(1, "h1")).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.revoke(record.id, t0()).await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

/// Bulk revoke only touches the user's live records and reports the count.
#[tokio::test]
async fn revoke_all_counts_only_live_records() {
    let store = MemoryRefreshTokenStore::new();
    let a = store.store(&new_token(1, "a")).await.unwrap();
    store.store(&new_token(1, "b")).await.unwrap();
    store.store(&new_token(2, "c")).await.unwrap();
    store.revoke(a.id, t0()).await.unwrap();

    assert_eq!(store.revoke_all_for_user(1, t0()).await.unwrap(), 1);
    assert!(store.list_active(1, t0()).await.unwrap().is_empty());
    assert_eq!(store.list_active(2, t0()).await.unwrap().len(), 1);
}

/// Touch keeps prior metadata when the new value is absent.
#[tokio::test]
async fn touch_records_usage() {
    let store = MemoryRefreshTokenStore::new();
    let record = store.store(&new_token(1, "h1")).await.unwrap();
    let later = t0() + Duration::hours(1);

    store
        .touch(record.id, later, None, Some("curl/8"))
        .await
        .unwrap();

    let stored = store.find_by_hash("h1", 1).await.unwrap().unwrap();
    assert_eq!(stored.last_used_at, Some(later));
    assert_eq!(stored.ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(stored.user_agent.as_deref(), Some("curl/8"));
}

/// Sweep deletes exactly the records whose expiry has passed.
#[tokio::test]
async fn sweep_deletes_expired_records() {
    let store = MemoryRefreshTokenStore::new();
    store.store(&new_token(1, "old")).await.unwrap();
    let mut fresh = new_token(1, "fresh");
    fresh.expires_at = t0() + Duration::days(30);
    store.store(&fresh).await.unwrap();

    let deleted = store.sweep(t0() + Duration::days(8)).await.unwrap();
    assert_eq!(deleted, 1);
    let remaining = store.records().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token_hash, "fresh");
}

/// An unavailable store surfaces a typed error.
#[tokio::test]
async fn unavailable_store_fails_operations() {
    let store = MemoryRefreshTokenStore::new();
    store.set_unavailable(true);
    assert_matches!(
        store.revoke_all_for_user(1, t0()).await,
        Err(StoreError::Unavailable(_))
    );
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// Transitions apply only from the expected pre-state.
#[tokio::test]
async fn transition_requires_matching_pre_state() {
    let store = MemoryAchievementStore::new();
    let a = store.create(&new_achievement(1, "X"), t0()).await.unwrap();
    assert_eq!(a.status, AchievementStatus::Draft);

    let verify = StatusChange::Verify { verifier_id: 9 };
    assert!(store.transition(a.id, &verify, t0()).await.unwrap().is_none());

    let submitted = store
        .transition(a.id, &StatusChange::Submit, t0())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submitted.status, AchievementStatus::Submitted);
    assert_eq!(submitted.submitted_at, Some(t0()));

    assert!(store
        .transition(a.id, &StatusChange::Submit, t0())
        .await
        .unwrap()
        .is_none());

    let verified = store.transition(a.id, &verify, t0()).await.unwrap().unwrap();
    assert_eq!(verified.verified_by, Some(9));
}

/// Drafts accept patches; anything else does not.
#[tokio::test]
async fn update_only_applies_to_drafts() {
    let store = MemoryAchievementStore::new();
    let a = store.create(&new_achievement(1, "X"), t0()).await.unwrap();
    let patch = UpdateAchievement {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };

    let updated = store.update_draft(a.id, &patch, t0()).await.unwrap().unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.category, "Z");

    store
        .transition(a.id, &StatusChange::Submit, t0())
        .await
        .unwrap();
    assert!(store.update_draft(a.id, &patch, t0()).await.unwrap().is_none());
}

/// Soft-deleted drafts vanish from reads and writes.
#[tokio::test]
async fn soft_deleted_rows_are_invisible() {
    let store = MemoryAchievementStore::new();
    let a = store.create(&new_achievement(1, "X"), t0()).await.unwrap();

    assert!(store.soft_delete_draft(a.id, t0()).await.unwrap());
    assert!(!store.soft_delete_draft(a.id, t0()).await.unwrap());
    assert!(store.find(a.id).await.unwrap().is_none());
    assert!(store.list_by_owner(1).await.unwrap().is_empty());
    assert!(store
        .transition(a.id, &StatusChange::Submit, t0())
        .await
        .unwrap()
        .is_none());
}

/// The pending queue lists submitted records in submission order.
#[tokio::test]
async fn pending_queue_orders_by_submission() {
    let store = MemoryAchievementStore::new();
    let first = store.create(&new_achievement(1, "first"), t0()).await.unwrap();
    let second = store.create(&new_achievement(2, "second"), t0()).await.unwrap();
    store.create(&new_achievement(1, "draft"), t0()).await.unwrap();

    store
        .transition(second.id, &StatusChange::Submit, t0())
        .await
        .unwrap();
    store
        .transition(first.id, &StatusChange::Submit, t0() + Duration::minutes(5))
        .await
        .unwrap();

    let pending = store
        .list_by_status(AchievementStatus::Submitted)
        .await
        .unwrap();
    let ids: Vec<i64> = pending.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(store.list_all().await.unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Attachment lookups are scoped to their achievement.
#[tokio::test]
async fn attachments_are_scoped_to_achievement() {
    let store = MemoryAttachmentStore::new();
    let file = store
        .create(
            &CreateAttachment {
                achievement_id: 1,
                file_name: "cert.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: 10,
                blob_key: "1/abc.pdf".to_string(),
                uploaded_by: 7,
            },
            t0(),
        )
        .await
        .unwrap();

    assert!(store.find(1, file.id).await.unwrap().is_some());
    assert!(store.find(2, file.id).await.unwrap().is_none());
    assert!(!store.delete(2, file.id).await.unwrap());
    assert!(store.delete(1, file.id).await.unwrap());
    assert!(store.list(1).await.unwrap().is_empty());
}
