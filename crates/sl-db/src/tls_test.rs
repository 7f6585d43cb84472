use super::*;

fn options(query: &[(&'static str, &'static str)]) -> DbResult<TlsOptions> {
    TlsOptions::from_query(query.iter().copied())
}

fn tls(verify_peer: bool) -> TlsAttempt {
    Some(TlsSettings {
        verify_peer,
        ..TlsSettings::default()
    })
}

#[test]
fn test_default_mode_is_prefer() {
    let opts = options(&[]).unwrap();
    assert_eq!(opts.mode, SslMode::Prefer);
    assert_eq!(opts.attempts().unwrap(), vec![tls(false), None]);
}

#[test]
fn test_disable() {
    let opts = options(&[("sslmode", "disable")]).unwrap();
    assert_eq!(opts.attempts().unwrap(), vec![None]);
}

#[test]
fn test_allow_tries_plain_first() {
    let opts = options(&[("sslmode", "allow")]).unwrap();
    assert_eq!(opts.attempts().unwrap(), vec![None, tls(false)]);
}

#[test]
fn test_require_is_tls_only() {
    let opts = options(&[("sslmode", "require")]).unwrap();
    assert_eq!(opts.attempts().unwrap(), vec![tls(false)]);
}

#[test]
fn test_verify_full_verifies_peer() {
    let opts = options(&[("sslmode", "verify-full"), ("sslrootcert", "/etc/ca.pem")]).unwrap();
    let attempts = opts.attempts().unwrap();
    assert_eq!(attempts.len(), 1);
    let settings = attempts[0].as_ref().unwrap();
    assert!(settings.verify_peer);
    assert_eq!(settings.ca_path.as_deref(), Some("/etc/ca.pem"));
}

#[test]
fn test_verify_ca_not_implemented() {
    let opts = options(&[("sslmode", "verify-ca")]).unwrap();
    assert!(matches!(
        opts.attempts().unwrap_err(),
        DbError::NotImplemented(_)
    ));
}

#[test]
fn test_unknown_mode_rejected() {
    let err = options(&[("sslmode", "sometimes")]).unwrap_err();
    assert!(err.to_string().contains("sometimes"));
}

#[test]
fn test_certificate_paths() {
    let opts = options(&[
        ("sslcert", "client.pem"),
        ("sslkey", "client.key"),
        ("sslrootcert", ""),
        ("consistency", "quorum"),
    ])
    .unwrap();
    assert_eq!(opts.settings.cert_path.as_deref(), Some("client.pem"));
    assert_eq!(opts.settings.key_path.as_deref(), Some("client.key"));
    assert_eq!(opts.settings.ca_path, None);
}

#[tokio::test]
async fn test_fallback_returns_first_success() {
    let attempts = vec![tls(false), None];
    let mut tried = Vec::new();

    let result = connect_with_fallback(&attempts, |attempt| {
        tried.push(attempt.is_some());
        async move {
            match attempt {
                Some(_) => Err(DbError::ConnectionError("handshake failed".to_string())),
                None => Ok("plain"),
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(result, "plain");
    assert_eq!(tried, vec![true, false]);
}

#[tokio::test]
async fn test_fallback_collects_every_failure() {
    let attempts = vec![None, tls(false)];

    let err = connect_with_fallback(&attempts, |_| async {
        Err::<(), _>(DbError::ConnectionError("refused".to_string()))
    })
    .await
    .unwrap_err();

    match err {
        DbError::ConnectionAttempts(errors) => {
            assert_eq!(errors.len(), 2);
            assert!(errors[0].starts_with("Failed to connect without TLS"));
            assert!(errors[1].starts_with("Failed to connect with TLS"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn build_context(settings: &TlsSettings, host: Option<&str>) -> DbResult<openssl::ssl::SslContext> {
    let mut builder = openssl::ssl::SslContext::builder(openssl::ssl::SslMethod::tls())?;
    configure_tls(&mut builder, settings, host)?;
    Ok(builder.build())
}

#[test]
fn test_configure_tls_without_verification() {
    let context = build_context(&TlsSettings::default(), Some("db.internal")).unwrap();
    assert_eq!(context.verify_mode(), SslVerifyMode::NONE);
}

#[test]
fn test_configure_tls_verifies_peer_and_host() {
    let settings = TlsSettings {
        verify_peer: true,
        ..TlsSettings::default()
    };

    let context = build_context(&settings, Some("db.internal")).unwrap();
    assert_eq!(context.verify_mode(), SslVerifyMode::PEER);

    let context = build_context(&settings, Some("10.0.0.7")).unwrap();
    assert_eq!(context.verify_mode(), SslVerifyMode::PEER);

    let context = build_context(&settings, Some("[::1]")).unwrap();
    assert_eq!(context.verify_mode(), SslVerifyMode::PEER);
}

#[test]
fn test_configure_tls_missing_root_certificate() {
    let settings = TlsSettings {
        ca_path: Some("/definitely/not/here/ca.pem".to_string()),
        verify_peer: true,
        ..TlsSettings::default()
    };
    assert!(build_context(&settings, Some("db.internal")).is_err());
}
