use sha2::{Digest, Sha256};

/// Builds the `Hash` query parameter the Finstat API expects on every request.
///
/// The API documentation defines the exact layout of the hashed string:
///
/// ```text
/// SomeSalt+<api_key>+<private_key>++<ico>+ended
/// ```
///
/// A deviation does not fail locally, the API simply rejects the request,
/// so the layout is pinned by tests.
///
/// # Arguments
///
/// * `api_key` - The public API key of the Finstat account.
/// * `private_key` - The private key of the Finstat account.
/// * `identifier` - The ICO being queried.
///
/// # Returns
///
/// * `String` - SHA-256 of the string above, as 64 lowercase hex characters.
pub fn compute_token(api_key: &str, private_key: &str, identifier: &str) -> String {
    let signed = format!(
        "SomeSalt+{}+{}++{}+ended",
        api_key, private_key, identifier
    );

    let mut hasher = Sha256::new();
    hasher.update(signed.as_bytes());
    hex::encode(hasher.finalize())
}
