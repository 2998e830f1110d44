//! End-to-end lifecycle tests against the in-memory ledger and directory

use session_auth::ledger::{Fault, LedgerOp};
use session_auth::{
    ledger_key, Deadline, Identity, IdentityStatus, MemoryIdentityDirectory, MemorySessionLedger,
    Role, SessionConfig, SessionError, SessionLedger, SessionManager, TokenClass, TokenCodec,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const SECRET: &str = "y9K$mP2vRx#TnZ@s4Yw!cGf7Dh&e3Xa6Wq8Lj5BtNu1Zp0MkYhVgCxFbAsSdQwEr";

struct Harness {
    sessions: SessionManager,
    ledger: Arc<MemorySessionLedger>,
    directory: Arc<MemoryIdentityDirectory>,
}

fn harness() -> Harness {
    let codec = Arc::new(TokenCodec::new(SECRET).unwrap());
    let ledger = Arc::new(MemorySessionLedger::new());
    let directory = Arc::new(MemoryIdentityDirectory::new());
    let sessions = SessionManager::new(
        codec,
        ledger.clone(),
        directory.clone(),
        SessionConfig::default(),
    );

    Harness {
        sessions,
        ledger,
        directory,
    }
}

fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

fn register(h: &Harness, role: Role) -> Uuid {
    let id = Uuid::new_v4();
    h.directory.upsert(Identity {
        id,
        role,
        status: IdentityStatus::Active,
    });
    id
}

#[tokio::test]
async fn test_issued_pair_validates_for_each_class() {
    let h = harness();
    let id = register(&h, Role::User);
    let pair = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();

    h.sessions
        .validate(id, &pair.access_token, TokenClass::Access, &deadline())
        .await
        .unwrap();
    h.sessions
        .validate(id, &pair.refresh_token, TokenClass::Refresh, &deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_logout_revokes_both_tokens() {
    let h = harness();
    let id = register(&h, Role::User);
    let pair = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();

    h.sessions.logout(id, &deadline()).await.unwrap();

    let access = h
        .sessions
        .validate(id, &pair.access_token, TokenClass::Access, &deadline())
        .await;
    let refresh = h
        .sessions
        .validate(id, &pair.refresh_token, TokenClass::Refresh, &deadline())
        .await;
    assert_eq!(access, Err(SessionError::Revoked));
    assert_eq!(refresh, Err(SessionError::Revoked));
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let h = harness();
    let id = register(&h, Role::User);
    h.sessions.logout(id, &deadline()).await.unwrap();
}

#[tokio::test]
async fn test_rotation_is_destructive() {
    let h = harness();
    let id = register(&h, Role::User);
    let pair = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();

    h.sessions.rotate(&pair.refresh_token, &deadline()).await.unwrap();

    let replay = h.sessions.rotate(&pair.refresh_token, &deadline()).await;
    assert_eq!(replay, Err(SessionError::Revoked));
    let validate = h
        .sessions
        .validate(id, &pair.refresh_token, TokenClass::Refresh, &deadline())
        .await;
    assert_eq!(validate, Err(SessionError::Revoked));
}

#[tokio::test]
async fn test_superseded_login_token_is_revoked() {
    let h = harness();
    let id = register(&h, Role::User);
    let first = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();
    let second = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();

    // Still correctly signed and unexpired, but no longer the ledger's value
    let stale = h
        .sessions
        .validate(id, &first.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(stale, Err(SessionError::Revoked));

    h.sessions
        .validate(id, &second.access_token, TokenClass::Access, &deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_class_separation_both_ways() {
    let h = harness();
    let id = register(&h, Role::User);
    let pair = h.sessions.issue_pair(id, Role::User, &deadline()).await.unwrap();

    let refresh_as_access = h
        .sessions
        .validate(id, &pair.refresh_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(
        refresh_as_access,
        Err(SessionError::WrongClass {
            expected: TokenClass::Access,
            actual: TokenClass::Refresh,
        })
    );

    let access_as_refresh = h
        .sessions
        .validate(id, &pair.access_token, TokenClass::Refresh, &deadline())
        .await;
    assert_eq!(
        access_as_refresh,
        Err(SessionError::WrongClass {
            expected: TokenClass::Refresh,
            actual: TokenClass::Access,
        })
    );

    let rotate_with_access = h.sessions.rotate(&pair.access_token, &deadline()).await;
    assert!(matches!(
        rotate_with_access,
        Err(SessionError::WrongClass { .. })
    ));
}

#[tokio::test]
async fn test_rotation_scenario() {
    let h = harness();
    let u1 = register(&h, Role::Admin);
    let first = h.sessions.issue_pair(u1, Role::Admin, &deadline()).await.unwrap();

    let second = h.sessions.rotate(&first.refresh_token, &deadline()).await.unwrap();

    assert_ne!(second.access_token, first.access_token);
    assert_ne!(second.refresh_token, first.refresh_token);

    let old = h
        .sessions
        .validate(u1, &first.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(old, Err(SessionError::Revoked));

    let claims = h
        .sessions
        .validate(u1, &second.access_token, TokenClass::Access, &deadline())
        .await
        .unwrap();
    assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn test_deactivated_identity_is_unavailable() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    h.directory.set_status(u1, IdentityStatus::Deactivated);

    let result = h
        .sessions
        .validate(u1, &pair.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(result, Err(SessionError::IdentityUnavailable));

    let rotate = h.sessions.rotate(&pair.refresh_token, &deadline()).await;
    assert_eq!(rotate, Err(SessionError::IdentityUnavailable));
}

#[tokio::test]
async fn test_deleted_identity_is_unavailable() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    h.directory.set_status(u1, IdentityStatus::Deleted);

    let result = h
        .sessions
        .authenticate(&pair.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(result, Err(SessionError::IdentityUnavailable));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rotation_has_single_winner() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    let attempts = (0..8).map(|_| {
        let sessions = h.sessions.clone();
        let refresh = pair.refresh_token.clone();
        tokio::spawn(async move { sessions.rotate(&refresh, &deadline()).await })
    });
    let outcomes: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "outcomes: {outcomes:?}");
    for outcome in outcomes.iter().filter(|o| o.is_err()) {
        assert_eq!(outcome, &Err(SessionError::Revoked));
    }

    let winner = winners[0];
    assert_eq!(
        h.ledger.get(&ledger_key(u1, TokenClass::Access)).await.unwrap(),
        Some(winner.access_token.clone())
    );
    assert_eq!(
        h.ledger.get(&ledger_key(u1, TokenClass::Refresh)).await.unwrap(),
        Some(winner.refresh_token.clone())
    );
    h.sessions
        .validate(u1, &winner.access_token, TokenClass::Access, &deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_two_concurrent_rotations_from_same_token() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    let d = deadline();
    let (a, b) = tokio::join!(
        h.sessions.rotate(&pair.refresh_token, &d),
        h.sessions.rotate(&pair.refresh_token, &d),
    );

    let (winner, loser) = match (a, b) {
        (Ok(pair), Err(err)) | (Err(err), Ok(pair)) => (pair, err),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(loser, SessionError::Revoked);

    h.sessions
        .validate(u1, &winner.refresh_token, TokenClass::Refresh, &deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_access_cleanup_is_surfaced() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    h.ledger.inject(LedgerOp::Delete, ":access", Fault::Fail);
    let result = h.sessions.rotate(&pair.refresh_token, &deadline()).await;
    match result {
        Err(SessionError::LedgerUnavailable(msg)) => {
            assert!(msg.contains("cleanup"), "{msg}");
            assert!(msg.contains(&ledger_key(u1, TokenClass::Access)), "{msg}");
        }
        other => panic!("expected cleanup failure, got {other:?}"),
    }

    // No new pair was written
    assert_eq!(
        h.ledger.get(&ledger_key(u1, TokenClass::Refresh)).await.unwrap(),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn test_access_delete_cut_off_by_deadline_is_cleaned_up() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    // Slower than the caller's deadline, well inside the cleanup grace
    h.ledger
        .inject(LedgerOp::Delete, ":access", Fault::Delay(Duration::from_millis(500)));
    let result = h
        .sessions
        .rotate(&pair.refresh_token, &Deadline::after(Duration::from_millis(100)))
        .await;
    assert_eq!(result, Err(SessionError::DeadlineExceeded));

    h.ledger.clear_faults();
    assert!(h.ledger.is_empty());
    let access = h
        .sessions
        .validate(u1, &pair.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(access, Err(SessionError::Revoked));
}

#[tokio::test]
async fn test_rotation_picks_up_role_change() {
    let h = harness();
    let u1 = register(&h, Role::Admin);
    let pair = h.sessions.issue_pair(u1, Role::Admin, &deadline()).await.unwrap();

    h.directory.upsert(Identity {
        id: u1,
        role: Role::User,
        status: IdentityStatus::Active,
    });

    let rotated = h.sessions.rotate(&pair.refresh_token, &deadline()).await.unwrap();
    let access = h
        .sessions
        .validate(u1, &rotated.access_token, TokenClass::Access, &deadline())
        .await
        .unwrap();
    assert_eq!(access.role, Role::User);
    let refresh = h
        .sessions
        .validate(u1, &rotated.refresh_token, TokenClass::Refresh, &deadline())
        .await
        .unwrap();
    assert_eq!(refresh.role, Role::User);
}

#[tokio::test]
async fn test_refresh_compare_failure_keeps_old_pair() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    h.ledger.inject(LedgerOp::CompareAndDelete, ":refresh", Fault::Fail);
    let result = h.sessions.rotate(&pair.refresh_token, &deadline()).await;
    assert!(matches!(result, Err(SessionError::LedgerUnavailable(_))));

    h.ledger.clear_faults();
    h.sessions
        .validate(u1, &pair.refresh_token, TokenClass::Refresh, &deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ledger_outage_is_transient() {
    let h = harness();
    let u1 = register(&h, Role::User);
    h.ledger.set_offline(true);

    let err = h
        .sessions
        .issue_pair(u1, Role::User, &deadline())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(!err.is_authentication_failure());
}

#[tokio::test(start_paused = true)]
async fn test_ledger_ttl_expiry_is_revocation() {
    let h = harness();
    let u1 = register(&h, Role::User);
    let pair = h.sessions.issue_pair(u1, Role::User, &deadline()).await.unwrap();

    tokio::time::advance(Duration::from_secs(3601)).await;

    // The JWT itself is judged against wall-clock time and still verifies;
    // the lapsed ledger entry alone makes it unusable
    let access = h
        .sessions
        .validate(u1, &pair.access_token, TokenClass::Access, &deadline())
        .await;
    assert_eq!(access, Err(SessionError::Revoked));

    h.sessions
        .validate(u1, &pair.refresh_token, TokenClass::Refresh, &deadline())
        .await
        .unwrap();
}
