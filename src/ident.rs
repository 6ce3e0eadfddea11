//! Stable record identifiers derived from article URLs.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of the URL's UTF-8 bytes.
///
/// Records already in the table were keyed this way, so the digest must not
/// change or re-runs would stop overwriting them.
pub fn id_for(url: &str) -> String {
    format!("{:x}", Md5::digest(url.as_bytes()))
}
