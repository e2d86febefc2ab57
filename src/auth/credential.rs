//! Bearer credential wrapper that redacts sensitive material.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const FINGERPRINT_LEN: usize = 12;

/// Opaque bearer credential; the access token stamped onto every outgoing request.
///
/// Formatting never reveals the secret. Use [`fingerprint`](Self::fingerprint) to correlate
/// credentials in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);
impl Credential {
	/// Wraps a new credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Short, stable, non-reversible identifier derived from the SHA-256 digest of the secret.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = URL_SAFE_NO_PAD.encode(digest);

		encoded.truncate(FINGERPRINT_LEN);

		encoded
	}
}
impl AsRef<str> for Credential {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for Credential {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Credential {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&"<redacted>").finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_formatters_redact() {
		let credential = Credential::new("super-secret");

		assert_eq!(format!("{credential:?}"), "Credential(\"<redacted>\")");
		assert_eq!(format!("{credential}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_per_secret() {
		let a = Credential::new("T1");
		let b = Credential::from("T1");
		let c = Credential::from(String::from("T2"));

		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), c.fingerprint());
		assert_eq!(a.fingerprint().len(), FINGERPRINT_LEN);
	}

	#[test]
	fn credential_serializes_as_plain_string() {
		let payload = serde_json::to_string(&Credential::new("T2"))
			.expect("Credential should serialize to JSON.");

		assert_eq!(payload, "\"T2\"");
	}
}
