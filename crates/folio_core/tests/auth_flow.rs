use folio_core::{
    hash_password, AccessError, ArticleDraft, CredentialPolicy, CredentialVerifier, Folio,
    FolioConfig, JsonUserDirectory, ManualClock, User, DEFAULT_SESSION_TIMEOUT_SECS,
};
use std::path::Path;
use std::sync::Arc;

fn write_users(path: &Path, users: &[(&str, &str)]) {
    let directory = JsonUserDirectory::new(path);
    for (username, password) in users {
        directory
            .upsert_user(User::new(*username, hash_password(password).unwrap()))
            .unwrap();
    }
}

fn config(dir: &Path, policy: CredentialPolicy) -> FolioConfig {
    FolioConfig {
        data_file: dir.join("articles.json"),
        users_file: dir.join("users.json"),
        credential_policy: policy,
        ..FolioConfig::default()
    }
}

#[test]
fn verify_fails_closed_without_directory() {
    let dir = tempfile::tempdir().unwrap();
    let verifier = CredentialVerifier::new(
        JsonUserDirectory::new(dir.path().join("users.json")),
        CredentialPolicy::AnyUser,
    );

    assert!(!verifier.verify("admin", "password"));
    assert!(verifier.check("admin", "password").is_err());
}

#[test]
fn verify_fails_closed_on_corrupt_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(&path, b"[{\"username\": ").unwrap();
    let verifier = CredentialVerifier::new(JsonUserDirectory::new(path), CredentialPolicy::AnyUser);

    assert!(!verifier.verify("admin", "password"));
}

#[test]
fn any_user_policy_accepts_password_of_another_user() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    write_users(&path, &[("admin", "password"), ("editor", "letmein")]);

    let verifier = CredentialVerifier::new(JsonUserDirectory::new(&path), CredentialPolicy::AnyUser);
    assert!(verifier.verify("admin", "password"));
    assert!(verifier.verify("nobody", "letmein"));
    assert!(!verifier.verify("admin", "fakepassword"));

    let strict =
        CredentialVerifier::new(JsonUserDirectory::new(&path), CredentialPolicy::MatchUsername);
    assert!(strict.verify("admin", "password"));
    assert!(!strict.verify("admin", "letmein"));
    assert!(!strict.verify("nobody", "letmein"));
}

#[test]
fn legacy_bcrypt_users_file_still_authenticates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(
        &path,
        r#"[{"username":"admin","password":"$2y$10$.vGA1O9wmRjrwAVXD98HNOgsNpDczlqm3Jq7KnEd1rVAGv3Fykk1a"}]"#,
    )
    .unwrap();

    let verifier =
        CredentialVerifier::new(JsonUserDirectory::new(&path), CredentialPolicy::MatchUsername);
    assert!(verifier.verify("admin", "rasmuslerdorf"));
    assert!(!verifier.verify("admin", "password"));

    write_users(&path, &[("editor", "letmein")]);
    let verifier = CredentialVerifier::new(JsonUserDirectory::new(&path), CredentialPolicy::AnyUser);
    assert!(verifier.verify("admin", "rasmuslerdorf"));
    assert!(verifier.verify("editor", "letmein"));
}

#[test]
fn login_mutate_logout_through_service_root() {
    let dir = tempfile::tempdir().unwrap();
    write_users(&dir.path().join("users.json"), &[("admin", "password")]);
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let folio = Folio::open_with_clock(
        config(dir.path(), CredentialPolicy::MatchUsername),
        Arc::clone(&clock),
    )
    .unwrap();

    let err = folio.auth().login("admin", "wrong").unwrap_err();
    assert!(matches!(err, AccessError::Unauthorized));

    let token = folio.auth().login("admin", "password").unwrap();
    let created = folio
        .gateway()
        .insert_json(
            Some(&token),
            br#"{"title": "Test", "content": "Content", "date": "2025-05-14", "image": "test.jpg"}"#,
        )
        .unwrap();
    assert_eq!(folio.articles().get(created.id).unwrap(), created);
    assert_eq!(folio.articles().paginate_query(Some("1"), Some("2")).unwrap().len(), 1);

    folio.auth().logout(Some(&token));
    let err = folio
        .gateway()
        .insert(Some(&token), ArticleDraft::default())
        .unwrap_err();
    assert!(matches!(err, AccessError::Unauthorized));

    folio.auth().logout(None);
}

#[test]
fn idle_session_is_rejected_through_service_root() {
    let dir = tempfile::tempdir().unwrap();
    write_users(&dir.path().join("users.json"), &[("admin", "password")]);
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let folio =
        Folio::open_with_clock(config(dir.path(), CredentialPolicy::AnyUser), Arc::clone(&clock))
            .unwrap();

    let token = folio.auth().login("admin", "password").unwrap();
    clock.advance(DEFAULT_SESSION_TIMEOUT_SECS);

    let err = folio.gateway().delete(Some(&token), 1).unwrap_err();
    assert!(matches!(err, AccessError::Unauthorized));
}

#[test]
fn login_reports_unreadable_user_directory() {
    let dir = tempfile::tempdir().unwrap();
    let folio = Folio::open(config(dir.path(), CredentialPolicy::AnyUser)).unwrap();

    let err = folio.auth().login("admin", "password").unwrap_err();
    assert!(matches!(err, AccessError::AuthBackendUnavailable(_)));
    assert_eq!(err.http_status(), 500);
    assert_eq!(folio.sessions().active_sessions(), 0);
}

#[test]
fn missing_article_read_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let folio = Folio::open(config(dir.path(), CredentialPolicy::AnyUser)).unwrap();

    let err = folio.articles().get(1).unwrap_err();
    assert!(matches!(err, AccessError::NotFound(1)));
    assert!(folio.articles().paginate_query(None, None).unwrap().is_empty());
}
