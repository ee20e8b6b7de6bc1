//! Integration tests for `VaultClient` over an in-process connection.

use std::fs;
use std::sync::Arc;

use keepvault::client::{LocalConnection, SessionCredentials, VaultClient};
use keepvault::config::Settings;
use keepvault::crypto::Opened;
use keepvault::errors::KeepVaultError;
use keepvault::vault::{RecordType, SecretData, VaultService};
use tempfile::TempDir;

fn test_settings() -> Settings {
    Settings {
        token_secret: "client-test-secret".into(),
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Settings::default()
    }
}

/// Helper: one shared service and a factory for clients attached to it.
struct Harness {
    dir: TempDir,
    service: Arc<VaultService>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let service = VaultService::open(&dir.path().join("data"), &test_settings())
            .expect("open service");
        Self {
            dir,
            service: Arc::new(service),
        }
    }

    fn client(&self) -> VaultClient<LocalConnection> {
        VaultClient::new(LocalConnection::new(self.service.clone()))
    }
}

fn text(data: Opened) -> String {
    match data {
        Opened::Data(bytes) => String::from_utf8(bytes).unwrap(),
        other => panic!("expected data, got {other:?}"),
    }
}

#[test]
fn alice_stores_and_reads_records_across_sessions() {
    let h = Harness::new();

    let first = h.client();
    first
        .register(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap();
    assert!(first.is_logged_in());

    let secret = SecretData::LoginPassword {
        login: "site".into(),
        password: "s3cret".into(),
    };
    let id = first.create_record(&secret, Some("bank")).unwrap();

    let second = h.client();
    second
        .login(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap();

    let listed = second.list_records().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].record_type, RecordType::LoginPassword);
    assert_eq!(listed[0].metadata, "bank");

    assert_eq!(text(second.get_record(&id).unwrap()), "site:s3cret");
}

#[test]
fn wrong_master_key_cannot_open_records() {
    let h = Harness::new();

    let writer = h.client();
    writer
        .register(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap();
    let id = writer
        .create_record(&SecretData::Text("hello".into()), None)
        .unwrap();

    let reader = h.client();
    reader
        .login(&SessionCredentials::new("alice", "pw123", "k2"))
        .unwrap();

    // Listing still works: metadata is not sealed.
    assert_eq!(reader.list_records().unwrap().len(), 1);
    assert!(matches!(
        reader.get_record(&id),
        Err(KeepVaultError::DecryptionFailed)
    ));
}

#[test]
fn operations_before_login_are_rejected() {
    let h = Harness::new();
    let client = h.client();

    assert!(!client.is_logged_in());
    assert!(matches!(
        client.list_records(),
        Err(KeepVaultError::MissingToken)
    ));
    assert!(matches!(
        client.create_record(&SecretData::Text("x".into()), None),
        Err(KeepVaultError::MissingToken)
    ));
}

#[test]
fn empty_master_key_is_rejected_before_any_call() {
    let h = Harness::new();
    let client = h.client();

    let err = client
        .register(&SessionCredentials::new("alice", "pw123", ""))
        .unwrap_err();
    assert!(matches!(err, KeepVaultError::FieldIsEmpty(_)));

    // Nothing was registered.
    assert!(h.client()
        .login(&SessionCredentials::new("alice", "pw123", "k1"))
        .is_err());
}

#[test]
fn server_errors_arrive_as_local_errors() {
    let h = Harness::new();
    h.client()
        .register(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap();

    let err = h
        .client()
        .register(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap_err();
    assert!(matches!(err, KeepVaultError::LoginExists));

    let err = h
        .client()
        .login(&SessionCredentials::new("alice", "bad", "k1"))
        .unwrap_err();
    assert!(matches!(err, KeepVaultError::WrongCredentials));
}

#[test]
fn empty_credentials_over_the_channel_are_invalid_argument() {
    use keepvault::client::VaultConnection;
    use keepvault::errors::ErrorCode;
    use keepvault::vault::Credentials;

    let h = Harness::new();
    let conn = LocalConnection::new(h.service.clone());

    let status = conn.register(&Credentials::new("", "pw123")).unwrap_err();
    assert_eq!(status.code, ErrorCode::InvalidArgument);
    assert!(matches!(
        KeepVaultError::from(status),
        KeepVaultError::FieldIsEmpty("login")
    ));

    let status = conn.login(&Credentials::new("alice", "")).unwrap_err();
    assert_eq!(status.code, ErrorCode::InvalidArgument);
    assert!(matches!(
        KeepVaultError::from(status),
        KeepVaultError::FieldIsEmpty("password")
    ));
}

#[test]
fn file_record_is_restored_to_its_label_path() {
    let h = Harness::new();
    let client = h.client();
    client
        .register(&SessionCredentials::new("alice", "pw123", "k1"))
        .unwrap();

    let source = h.dir.path().join("photo.jpg");
    fs::write(&source, b"\xff\xd8\xff binary").unwrap();
    let restored = h.dir.path().join("restored.jpg");

    let id = client
        .create_record(
            &SecretData::File {
                path: source.clone(),
            },
            Some(restored.to_str().unwrap()),
        )
        .unwrap();

    match client.get_record(&id).unwrap() {
        Opened::SavedFile(message) => assert!(message.contains("restored.jpg")),
        other => panic!("expected saved file, got {other:?}"),
    }
    assert_eq!(fs::read(&restored).unwrap(), b"\xff\xd8\xff binary");

    client.delete_record(&id).unwrap();
    assert!(matches!(
        client.get_record(&id),
        Err(KeepVaultError::RecordNotFound)
    ));
}
