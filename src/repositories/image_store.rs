//! Image object storage: S3 (SigV4-signed PUT) or a local directory.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::config::S3Config;
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const SIGNED_HEADERS: &str = "content-type;host;x-amz-content-sha256;x-amz-date";

/// Stores an object and returns the public URL clients should use.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String>;
}

/// Writes objects under a directory served by this process.
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self { root, base_url }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "image stored locally");
        Ok(join_url(&self.base_url, key))
    }
}

/// Uploads objects to S3 or an S3-compatible endpoint.
pub struct S3ImageStore {
    client: reqwest::Client,
    config: S3Config,
}

/// Everything needed to send one signed `PUT`.
#[derive(Debug)]
pub struct SignedPut {
    pub url: String,
    pub host: String,
    pub amz_date: String,
    pub payload_hash: String,
    pub authorization: String,
}

impl S3ImageStore {
    pub fn new(config: S3Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// (request URL, host header, canonical URI)
    fn address(&self, key: &str) -> (String, String, String) {
        let key = uri_encode_path(key);
        match &self.config.endpoint {
            Some(endpoint) => {
                let endpoint = endpoint.trim_end_matches('/');
                let host = endpoint
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .to_string();
                let uri = format!("/{}/{}", self.config.bucket, key);
                (format!("{}{}", endpoint, uri), host, uri)
            }
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", self.config.bucket, self.config.region);
                let uri = format!("/{}", key);
                (format!("https://{}{}", host, uri), host, uri)
            }
        }
    }

    /// URL handed back to clients for a stored key.
    pub fn public_url(&self, key: &str) -> String {
        match &self.config.public_base_url {
            Some(base) => join_url(base, key),
            None => self.address(key).0,
        }
    }

    pub fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> AppResult<SignedPut> {
        let (url, host, canonical_uri) = self.address(key);
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let canonical_request = format!(
            "PUT\n{uri}\n\ncontent-type:{ct}\nhost:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{date}\n\n{signed}\n{hash}",
            uri = canonical_uri,
            ct = content_type,
            host = host,
            hash = payload_hash,
            date = amz_date,
            signed = SIGNED_HEADERS,
        );
        let scope = format!("{}/{}/s3/aws4_request", date, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let secret = format!("AWS4{}", self.config.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.config.region.as_bytes())?;
        let k_service = hmac(&k_region, b"s3")?;
        let k_signing = hmac(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes())?);

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.config.access_key_id, scope, SIGNED_HEADERS, signature
        );
        Ok(SignedPut {
            url,
            host,
            amz_date,
            payload_hash,
            authorization,
        })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        let signed = self.sign_put(key, content_type, &bytes, Utc::now())?;
        let res = self
            .client
            .put(&signed.url)
            .header("content-type", content_type)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("authorization", &signed.authorization)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("s3 put: {}", e)))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, key = %key, "s3 upload rejected");
            return Err(AppError::Storage(format!("s3 put returned {}", status)));
        }
        debug!(key = %key, bucket = %self.config.bucket, "image stored in s3");
        Ok(self.public_url(key))
    }
}

fn hmac(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Percent-encode each path segment, keeping `/` separators.
fn uri_encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
