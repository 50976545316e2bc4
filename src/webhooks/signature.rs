//! GitHub webhook signature verification.
//!
//! GitHub signs webhook payloads with HMAC over a shared secret and delivers
//! the digest in the `X-Hub-Signature-256` header (HMAC-SHA256, preferred) or
//! the legacy `X-Hub-Signature` header (HMAC-SHA1). Either way the header
//! value has the form `algorithm=hexdigest`.
//!
//! Verification is the first step in webhook processing and must run against
//! the exact bytes received: parsing and re-serializing the body can change
//! its byte content and invalidate the signature.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// A signature algorithm GitHub uses for webhook deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA256 (`X-Hub-Signature-256`).
    Sha256,
    /// HMAC-SHA1 (legacy `X-Hub-Signature`).
    Sha1,
}

/// Parses a signature header (e.g., "sha256=abc123...") into an algorithm and
/// raw digest bytes.
///
/// Returns `None` for malformed headers: unknown algorithm, missing `=`,
/// invalid hex. Never panics.
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    let (algorithm, hex_digest) = header.split_once('=')?;

    let algorithm = match algorithm {
        "sha256" => SignatureAlgorithm::Sha256,
        "sha1" => SignatureAlgorithm::Sha1,
        _ => return None,
    };

    let digest = hex::decode(hex_digest).ok()?;
    Some((algorithm, digest))
}

/// Computes the HMAC digest of a payload using the given secret and algorithm.
///
/// This is what GitHub computes on its side; exposed mainly so tests can
/// generate expected signatures.
pub fn compute_signature(
    algorithm: SignatureAlgorithm,
    payload: &[u8],
    secret: &[u8],
) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a digest as a GitHub-style header value (`algorithm=hex`).
pub fn format_signature_header(algorithm: SignatureAlgorithm, digest: &[u8]) -> String {
    let prefix = match algorithm {
        SignatureAlgorithm::Sha256 => "sha256",
        SignatureAlgorithm::Sha1 => "sha1",
    };
    format!("{}={}", prefix, hex::encode(digest))
}

/// Verifies a webhook signature header against the raw payload and secret.
///
/// Returns `true` only when the header parses and the keyed hash of the
/// payload matches the provided digest. The comparison is constant-time
/// (via the HMAC library's `verify_slice`), so an attacker cannot learn the
/// digest byte by byte from response timing.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let (algorithm, expected) = match parse_signature_header(signature_header) {
        Some(parsed) => parsed,
        None => return false,
    };

    match algorithm {
        SignatureAlgorithm::Sha256 => {
            let mut mac = match HmacSha256::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
        SignatureAlgorithm::Sha1 => {
            let mut mac = match HmacSha1::new_from_slice(secret) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        }
    }
}
