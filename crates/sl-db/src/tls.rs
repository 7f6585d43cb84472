//! Transport security modes and the ordered connection attempts they imply
//!
//! Modes follow PostgreSQL's `sslmode` names. Each mode expands into an
//! ordered list of attempts; a connection tries them in order and only fails
//! once every attempt has failed.

use crate::error::{DbError, DbResult};
use openssl::ssl::{SslContextBuilder, SslFiletype, SslVerifyMode};
use openssl::x509::verify::X509CheckFlags;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// `sslmode` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// No TLS
    Disable,
    /// Plain first, then TLS
    Allow,
    /// TLS first, then plain
    #[default]
    Prefer,
    /// TLS only, no peer verification
    Require,
    /// TLS only, verify the certificate chain
    VerifyCa,
    /// TLS only, verify the certificate chain and host name
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "" | "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(DbError::InvalidUrl(format!("Unrecognized sslmode: {other:?}"))),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        };
        f.write_str(name)
    }
}

/// Certificate material for a TLS attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// Client certificate (`sslcert`)
    pub cert_path: Option<String>,
    /// Client private key (`sslkey`)
    pub key_path: Option<String>,
    /// Trusted root certificates (`sslrootcert`)
    pub ca_path: Option<String>,
    /// Verify the peer certificate and host name
    pub verify_peer: bool,
}

/// One connection attempt: `None` is plain TCP
pub type TlsAttempt = Option<TlsSettings>;

/// Transport security configuration parsed from a connection string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    pub mode: SslMode,
    pub settings: TlsSettings,
}

impl TlsOptions {
    /// Parse `sslmode`, `sslcert`, `sslkey` and `sslrootcert` from query pairs
    pub fn from_query<'a, I>(pairs: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mode = "";
        let mut settings = TlsSettings::default();
        let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());

        for (key, value) in pairs {
            match key {
                "sslmode" => mode = value,
                "sslcert" => settings.cert_path = non_empty(value),
                "sslkey" => settings.key_path = non_empty(value),
                "sslrootcert" => settings.ca_path = non_empty(value),
                _ => {}
            }
        }

        Ok(Self {
            mode: mode.parse()?,
            settings,
        })
    }

    /// Ordered connection attempts for the configured mode
    pub fn attempts(&self) -> DbResult<Vec<TlsAttempt>> {
        let tls = || Some(self.settings.clone());
        match self.mode {
            SslMode::Disable => Ok(vec![None]),
            SslMode::Allow => Ok(vec![None, tls()]),
            SslMode::Prefer => Ok(vec![tls(), None]),
            SslMode::Require => Ok(vec![tls()]),
            SslMode::VerifyCa => Err(DbError::NotImplemented(
                r#""verify-ca" is not yet implemented -- use "require" or "verify-full""#
                    .to_string(),
            )),
            SslMode::VerifyFull => Ok(vec![Some(TlsSettings {
                verify_peer: true,
                ..self.settings.clone()
            })]),
        }
    }
}

/// Load certificate material into an OpenSSL context.
///
/// Without `sslrootcert` the system trust store is used. Without
/// `verify_peer` the server certificate is accepted as presented. With it,
/// the chain is verified and, when `host` is given, the certificate must
/// name that host.
pub(crate) fn configure_tls(
    builder: &mut SslContextBuilder,
    settings: &TlsSettings,
    host: Option<&str>,
) -> DbResult<()> {
    match &settings.ca_path {
        Some(ca) => builder.set_ca_file(ca)?,
        None => builder.set_default_verify_paths()?,
    }
    if let Some(cert) = &settings.cert_path {
        builder.set_certificate_file(cert, SslFiletype::PEM)?;
    }
    if let Some(key) = &settings.key_path {
        builder.set_private_key_file(key, SslFiletype::PEM)?;
    }

    if !settings.verify_peer {
        builder.set_verify(SslVerifyMode::NONE);
        return Ok(());
    }

    builder.set_verify(SslVerifyMode::PEER);
    if let Some(host) = host {
        let param = builder.verify_param_mut();
        param.set_hostflags(X509CheckFlags::NO_PARTIAL_WILDCARDS);
        match host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
            Ok(ip) => param.set_ip(ip)?,
            Err(_) => param.set_host(host)?,
        }
    }
    Ok(())
}

/// Query keys consumed by [`TlsOptions::from_query`]
pub(crate) const TLS_QUERY_KEYS: &[&str] = &["sslmode", "sslcert", "sslkey", "sslrootcert"];

/// Label used when reporting a failed attempt
pub(crate) fn describe_attempt(attempt: &TlsAttempt) -> &'static str {
    match attempt {
        Some(_) => "with TLS",
        None => "without TLS",
    }
}

/// Try `connect` once per attempt, returning the first success.
///
/// Failures are collected and returned together when every attempt fails.
pub(crate) async fn connect_with_fallback<T, F, Fut>(
    attempts: &[TlsAttempt],
    mut connect: F,
) -> DbResult<T>
where
    F: FnMut(TlsAttempt) -> Fut,
    Fut: std::future::Future<Output = DbResult<T>>,
{
    let mut errors = Vec::with_capacity(attempts.len());

    for attempt in attempts {
        match connect(attempt.clone()).await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                let message = format!("Failed to connect {}: {}", describe_attempt(attempt), e);
                log::debug!("{message}");
                errors.push(message);
            }
        }
    }

    Err(DbError::ConnectionAttempts(errors))
}

#[cfg(test)]
#[path = "tls_test.rs"]
mod tests;
