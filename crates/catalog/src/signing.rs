//! Authentication headers for the catalog API.
//!
//! Every request carries two headers derived from the configured credentials:
//!
//! - `Authorization: Basic base64("{acronym}|{person}:{password}")`
//! - `X-Signature: lowercase-hex(sha256("acronym={acronym}&person={person}&password={password}&key={key}"))`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use sha2::{Digest, Sha256};

use partsync_core::ApiConfig;

pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header values for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub signature: String,
}

impl SignedHeaders {
    pub fn to_header_map(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&self.authorization)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderValue::from_str(&self.signature)?,
        );
        Ok(headers)
    }
}

/// Derives authentication headers from validated credentials.
#[derive(Clone)]
pub struct RequestSigner {
    acronym: String,
    person: String,
    password: String,
    key: String,
}

impl core::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("acronym", &self.acronym)
            .field("person", &self.person)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(api: &ApiConfig) -> Self {
        Self {
            acronym: api.acronym.clone(),
            person: api.person.clone(),
            password: api.password.clone(),
            key: api.key.clone(),
        }
    }

    pub fn authorization(&self) -> String {
        let credentials = format!("{}|{}:{}", self.acronym, self.person, self.password);
        format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
    }

    pub fn signature(&self) -> String {
        let body = format!(
            "acronym={}&person={}&password={}&key={}",
            self.acronym, self.person, self.password, self.key
        );
        hex::encode(Sha256::digest(body.as_bytes()))
    }

    pub fn headers(&self) -> SignedHeaders {
        SignedHeaders {
            authorization: self.authorization(),
            signature: self.signature(),
        }
    }
}
