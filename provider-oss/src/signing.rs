//! Canonical request signing for the object-storage backend
//!
//! Implements the backend's HMAC-SHA1 authorization scheme without an
//! external signer dependency. The emitted token is an ordered,
//! `&`-joined field list:
//!
//! ```text
//! q-sign-algorithm=sha1&q-ak=<access-id>&q-sign-time=<start;end>
//! &q-key-time=<start;end>&q-header-list=<names>&q-url-param-list=<names>
//! &q-signature=<hex>
//! ```
//!
//! Every step below must match the backend's verifier bit-for-bit:
//! canonical encoding, key lowercasing, sort order, and the exact newline
//! layout of the string to sign.

use std::sync::Arc;

use bridge_traits::http::HttpMethod;
use bridge_traits::time::Clock;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::{Digest, Sha1};

use crate::config::StorageCredential;
use crate::error::{OssError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Signature validity window when the caller does not specify one.
pub const DEFAULT_EXPIRES_SECS: i64 = 900;

/// Canonical percent-encoding: RFC 3986 unreserved characters stay raw,
/// everything else (including `! ' ( ) *`) is escaped.
const CANONICAL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Header names that participate in signing. Anything else is excluded
/// unless it carries the vendor prefix.
const SIGN_HEADERS: &[&str] = &[
    "cache-control",
    "content-disposition",
    "content-encoding",
    "content-length",
    "content-md5",
    "content-type",
    "expect",
    "expires",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-unmodified-since",
    "origin",
    "range",
    "transfer-encoding",
];

/// Vendor-specific header prefix; all such headers are signed.
const VENDOR_HEADER_PREFIX: &str = "x-cos-";

/// A request to be signed.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub method: HttpMethod,
    /// Object path; a leading `/` is added if absent.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Validity window in seconds; defaults to [`DEFAULT_EXPIRES_SECS`].
    pub expires_secs: Option<i64>,
    /// When true (the default) and bucket+region are known, the backend's
    /// default host joins the signed header set to prevent cross-bucket
    /// replay of the token.
    pub sign_host: bool,
}

impl SignRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            expires_secs: None,
            sign_host: true,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn expires(mut self, secs: i64) -> Self {
        self.expires_secs = Some(secs);
        self
    }

    pub fn without_host_signing(mut self) -> Self {
        self.sign_host = false;
        self
    }
}

/// Produces authorization tokens and presigned URLs.
///
/// Signing is a pure function of the request, the credential, and the
/// injected clock; fixing the clock fixes the token.
pub struct Signer {
    clock: Arc<dyn Clock>,
}

impl Signer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Compute the authorization token for `request`.
    ///
    /// # Errors
    ///
    /// Fails with [`OssError::MissingCredential`] when the access id or
    /// secret key is empty; an empty credential must never sign.
    pub fn authorization(
        &self,
        credential: &StorageCredential,
        request: &SignRequest,
    ) -> Result<String> {
        if credential.access_id.is_empty() {
            return Err(OssError::MissingCredential("access_id"));
        }
        if credential.secret_key.is_empty() {
            return Err(OssError::MissingCredential("secret_key"));
        }

        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter(|(name, _)| is_signable_header(name))
            .cloned()
            .collect();

        let has_host = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("host"));
        if !has_host && request.sign_host {
            if let Some(host) = credential.default_host() {
                headers.push(("Host".to_string(), host));
            }
        }

        let pathname = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };

        let start = self.clock.unix_timestamp() - 1;
        let end = start + request.expires_secs.unwrap_or(DEFAULT_EXPIRES_SECS);
        let key_time = format!("{};{}", start, end);

        let sign_key = hmac_sha1_hex(credential.secret_key.as_bytes(), key_time.as_bytes());

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n",
            request.method.as_canonical_str(),
            pathname,
            canonical_pairs(&request.query),
            canonical_pairs(&headers),
        );

        let string_to_sign = format!("sha1\n{}\n{}\n", key_time, sha1_hex(canonical_request.as_bytes()));
        let signature = hmac_sha1_hex(sign_key.as_bytes(), string_to_sign.as_bytes());

        Ok([
            "q-sign-algorithm=sha1".to_string(),
            format!("q-ak={}", credential.access_id),
            format!("q-sign-time={}", key_time),
            format!("q-key-time={}", key_time),
            format!("q-header-list={}", canonical_name_list(&headers)),
            format!("q-url-param-list={}", canonical_name_list(&request.query)),
            format!("q-signature={}", signature),
        ]
        .join("&"))
    }

    /// Issue a presigned URL for a single operation on `key`.
    ///
    /// The token is appended as the URL's query string, signed with no
    /// headers so any plain HTTP client can replay it within the validity
    /// window.
    pub fn presigned_url(
        &self,
        credential: &StorageCredential,
        base_url: Option<&str>,
        key: &str,
        method: HttpMethod,
        expires_secs: Option<i64>,
    ) -> Result<String> {
        let url = object_url(credential, base_url, key)?;
        let mut request = SignRequest::new(method, key).without_host_signing();
        request.expires_secs = expires_secs;
        let token = self.authorization(credential, &request)?;
        Ok(format!("{}?{}", url, token))
    }
}

/// Build the plain (unsigned) URL of an object.
///
/// A configured endpoint produces a path-style URL
/// (`{endpoint}/{bucket}/{key}`); otherwise the backend's default
/// virtual-host domain is used.
pub fn object_url(
    credential: &StorageCredential,
    base_url: Option<&str>,
    key: &str,
) -> Result<String> {
    // Slashes inside the key separate path segments and stay raw.
    let encoded_key = percent_encode(key).replace("%2F", "/");

    match base_url {
        Some(base) => {
            if credential.bucket.is_empty() {
                return Err(OssError::NotConfigured("bucket is not set".to_string()));
            }
            Ok(format!(
                "{}/{}/{}",
                base.trim_end_matches('/'),
                credential.bucket,
                encoded_key
            ))
        }
        None => {
            let host = credential.default_host().ok_or_else(|| {
                OssError::NotConfigured("no endpoint URL and no bucket/region pair".to_string())
            })?;
            Ok(format!("https://{}/{}", host, encoded_key))
        }
    }
}

fn is_signable_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains(VENDOR_HEADER_PREFIX) || SIGN_HEADERS.contains(&lower.as_str())
}

fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, CANONICAL_ENCODE_SET).to_string()
}

/// Canonical `key=value&…` form: entries sorted by lowercased key, keys
/// encoded then lowercased, values encoded.
fn canonical_pairs(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    sorted
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                percent_encode(key).to_lowercase(),
                percent_encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Semicolon-joined, sorted list of the lowercased encoded key names.
fn canonical_name_list(pairs: &[(String, String)]) -> String {
    let mut names: Vec<String> = pairs
        .iter()
        .map(|(key, _)| percent_encode(key).to_lowercase())
        .collect();
    names.sort();
    names.join(";")
}

fn hmac_sha1_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can accept any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
