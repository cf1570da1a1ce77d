/// Key recovery and EOSIO key/signature string codecs
///
/// Ownership checks never see a private key: the wallet signs a challenge, and
/// the signing public key is recovered from the (challenge, signature) pair and
/// encoded the same way the wallet reports its keys.
use crate::errors::{AuthError, AuthResult, ErrorKind};
use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const K1_KEY_PREFIX: &str = "PUB_K1_";
const LEGACY_KEY_PREFIX: &str = "EOS";
const K1_SIGNATURE_PREFIX: &str = "SIG_K1_";
const K1_CHECKSUM_SUFFIX: &[u8] = b"K1";
const CHECKSUM_LEN: usize = 4;
const COMPRESSED_KEY_LEN: usize = 33;
const SIGNATURE_DATA_LEN: usize = 65;
const RECOVERY_HEADER_BASE: u8 = 27;
const RECOVERY_HEADER_COMPRESSED: u8 = 4;

/// Textual public-key encodings used across the EOSIO ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// `PUB_K1_...`, checksum over key bytes and the curve tag.
    #[default]
    K1,
    /// `EOS...`, checksum over key bytes only.
    Legacy,
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyFormat::K1 => f.write_str("k1"),
            KeyFormat::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for KeyFormat {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "k1" | "pub_k1" => Ok(KeyFormat::K1),
            "legacy" | "eos" => Ok(KeyFormat::Legacy),
            other => Err(AuthError::new(
                ErrorKind::Configuration,
                format!("Unknown key format '{}'", other),
            )),
        }
    }
}

fn checksum(data: &[u8], suffix: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

fn encode_with_checksum(data: &[u8], suffix: &[u8]) -> String {
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum(data, suffix));
    bs58::encode(payload).into_string()
}

fn decode_with_checksum(
    body: &str,
    expected_len: usize,
    suffix: &[u8],
    what: &str,
) -> AuthResult<Vec<u8>> {
    let mut bytes = bs58::decode(body).into_vec().map_err(|e| {
        AuthError::with_cause(ErrorKind::Signing, format!("Invalid {} encoding", what), e)
    })?;

    if bytes.len() != expected_len + CHECKSUM_LEN {
        return Err(AuthError::new(
            ErrorKind::Signing,
            format!(
                "Invalid {} length: expected {} bytes, got {}",
                what,
                expected_len + CHECKSUM_LEN,
                bytes.len()
            ),
        ));
    }

    let provided = bytes.split_off(expected_len);
    if provided[..] != checksum(&bytes, suffix)[..] {
        return Err(AuthError::new(
            ErrorKind::Signing,
            format!("Invalid {} checksum", what),
        ));
    }

    Ok(bytes)
}

/// SHA-256 of the challenge's raw bytes, the digest the wallet signs.
pub fn challenge_digest(challenge: &str) -> [u8; 32] {
    let digest = Sha256::digest(challenge.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

pub fn public_key_to_string(key: &PublicKey, format: KeyFormat) -> String {
    let compressed = key.serialize();
    match format {
        KeyFormat::K1 => format!(
            "{}{}",
            K1_KEY_PREFIX,
            encode_with_checksum(&compressed, K1_CHECKSUM_SUFFIX)
        ),
        KeyFormat::Legacy => format!(
            "{}{}",
            LEGACY_KEY_PREFIX,
            encode_with_checksum(&compressed, &[])
        ),
    }
}

/// Parse a public key in either textual format, verifying its checksum.
pub fn parse_public_key(value: &str) -> AuthResult<PublicKey> {
    let bytes = if let Some(body) = value.strip_prefix(K1_KEY_PREFIX) {
        decode_with_checksum(body, COMPRESSED_KEY_LEN, K1_CHECKSUM_SUFFIX, "public key")?
    } else if let Some(body) = value.strip_prefix(LEGACY_KEY_PREFIX) {
        decode_with_checksum(body, COMPRESSED_KEY_LEN, &[], "public key")?
    } else {
        return Err(AuthError::new(
            ErrorKind::Signing,
            "Unrecognized public key prefix",
        ));
    };

    PublicKey::from_slice(&bytes)
        .map_err(|e| AuthError::with_cause(ErrorKind::Signing, "Invalid public key point", e))
}

/// Decode a `SIG_K1_` string into its recoverable form.
pub fn decode_signature(signature: &str) -> AuthResult<RecoverableSignature> {
    let body = signature.strip_prefix(K1_SIGNATURE_PREFIX).ok_or_else(|| {
        AuthError::new(ErrorKind::Signing, "Unrecognized signature prefix")
    })?;
    let data = decode_with_checksum(body, SIGNATURE_DATA_LEN, K1_CHECKSUM_SUFFIX, "signature")?;

    let header = data[0];
    if !(RECOVERY_HEADER_BASE..RECOVERY_HEADER_BASE + 2 * RECOVERY_HEADER_COMPRESSED)
        .contains(&header)
    {
        return Err(AuthError::new(
            ErrorKind::Signing,
            format!("Invalid signature recovery header {}", header),
        ));
    }
    let mut recovery_param = header - RECOVERY_HEADER_BASE;
    if recovery_param >= RECOVERY_HEADER_COMPRESSED {
        recovery_param -= RECOVERY_HEADER_COMPRESSED;
    }

    let recovery_id = RecoveryId::try_from(i32::from(recovery_param))
        .map_err(|e| AuthError::with_cause(ErrorKind::Signing, "Invalid recovery id", e))?;
    RecoverableSignature::from_compact(&data[1..], recovery_id)
        .map_err(|e| AuthError::with_cause(ErrorKind::Signing, "Invalid signature values", e))
}

/// Encode a recoverable signature as `SIG_K1_`, flagged as compressed.
pub fn signature_to_string(signature: &RecoverableSignature) -> String {
    let (recovery_id, compact) = signature.serialize_compact();
    let mut data = Vec::with_capacity(SIGNATURE_DATA_LEN);
    // recovery ids are 0..=3 so the header always fits in a byte
    data.push(RECOVERY_HEADER_BASE + RECOVERY_HEADER_COMPRESSED + i32::from(recovery_id) as u8);
    data.extend_from_slice(&compact);
    format!(
        "{}{}",
        K1_SIGNATURE_PREFIX,
        encode_with_checksum(&data, K1_CHECKSUM_SUFFIX)
    )
}

/// Sign a challenge the way a wallet answers `authenticate`.
///
/// The signature is low-S but skips the EOSIO canonical-form retry, so a node
/// may reject it as a transaction signature. Key recovery accepts it either way.
pub fn sign_challenge(secret_key: &SecretKey, challenge: &str) -> String {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(challenge_digest(challenge));
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    signature_to_string(&signature)
}

/// Recover the public key that signed `challenge`.
///
/// A signature over a different message still recovers *some* valid point, so
/// a mismatch against the expected key means "not owned", not an error. Only
/// strings that cannot be decoded at all are errors.
pub fn recover_public_key(
    challenge: &str,
    signature: &str,
    format: KeyFormat,
) -> AuthResult<String> {
    let recoverable = decode_signature(signature)?;
    let message = Message::from_digest(challenge_digest(challenge));
    let secp = Secp256k1::verification_only();
    let public_key = secp.recover_ecdsa(&message, &recoverable).map_err(|e| {
        AuthError::with_cause(
            ErrorKind::Signing,
            "Unable to recover public key from signature",
            e,
        )
    })?;

    Ok(public_key_to_string(&public_key, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key pair of EOSIO tooling.
    const DEV_PRIVATE_KEY_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const DEV_PUBLIC_KEY_LEGACY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
    const DEV_PUBLIC_KEY_K1: &str = "PUB_K1_6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5BoDq63";

    fn dev_secret_key() -> SecretKey {
        let decoded = bs58::decode(DEV_PRIVATE_KEY_WIF).into_vec().unwrap();
        assert_eq!(decoded[0], 0x80);
        SecretKey::from_slice(&decoded[1..33]).unwrap()
    }

    fn dev_public_key() -> PublicKey {
        dev_secret_key().public_key(&Secp256k1::signing_only())
    }

    #[test]
    fn encodings_match_known_key() {
        assert_eq!(
            public_key_to_string(&dev_public_key(), KeyFormat::Legacy),
            DEV_PUBLIC_KEY_LEGACY
        );
        assert_eq!(
            public_key_to_string(&dev_public_key(), KeyFormat::K1),
            DEV_PUBLIC_KEY_K1
        );
    }

    #[test]
    fn both_formats_parse_to_the_same_point() {
        let key = dev_public_key();
        let k1 = public_key_to_string(&key, KeyFormat::K1);
        assert!(k1.starts_with("PUB_K1_"));
        assert_eq!(parse_public_key(&k1).unwrap(), key);
        assert_eq!(parse_public_key(DEV_PUBLIC_KEY_LEGACY).unwrap(), key);
    }

    #[test]
    fn tampered_key_checksum_rejected() {
        let mut tampered = DEV_PUBLIC_KEY_LEGACY.to_string();
        tampered.pop();
        tampered.push('D');
        let err = parse_public_key(&tampered).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
        assert!(parse_public_key("PUB_R1_abc").is_err());
    }

    #[test]
    fn recovers_signer_of_challenge() {
        let signature = sign_challenge(&dev_secret_key(), "12345678");
        assert!(signature.starts_with("SIG_K1_"));

        let recovered = recover_public_key("12345678", &signature, KeyFormat::K1).unwrap();
        assert_eq!(recovered, DEV_PUBLIC_KEY_K1);

        let legacy = recover_public_key("12345678", &signature, KeyFormat::Legacy).unwrap();
        assert_eq!(legacy, DEV_PUBLIC_KEY_LEGACY);
    }

    #[test]
    fn recovery_is_deterministic() {
        let signature = sign_challenge(&dev_secret_key(), "12345678");
        let first = recover_public_key("12345678", &signature, KeyFormat::K1).unwrap();
        let second = recover_public_key("12345678", &signature, KeyFormat::K1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_challenge_recovers_a_different_key() {
        let signature = sign_challenge(&dev_secret_key(), "12345678");
        let recovered = recover_public_key("87654321", &signature, KeyFormat::Legacy).unwrap();
        assert_ne!(recovered, DEV_PUBLIC_KEY_LEGACY);
        assert!(parse_public_key(&recovered).is_ok());
    }

    #[test]
    fn signature_round_trips_through_its_string_form() {
        let signature = sign_challenge(&dev_secret_key(), "hello");
        let decoded = decode_signature(&signature).unwrap();
        assert_eq!(signature_to_string(&decoded), signature);
    }

    #[test]
    fn malformed_signatures_are_errors() {
        assert!(recover_public_key("x", "not-a-signature", KeyFormat::K1).is_err());
        assert!(recover_public_key("x", "SIG_K1_0OIl", KeyFormat::K1).is_err());
        assert!(recover_public_key("x", "SIG_K1_11111", KeyFormat::K1).is_err());

        let mut data = vec![0u8; SIGNATURE_DATA_LEN];
        data[0] = 12;
        let bad_header = format!(
            "{}{}",
            K1_SIGNATURE_PREFIX,
            encode_with_checksum(&data, K1_CHECKSUM_SUFFIX)
        );
        let err = decode_signature(&bad_header).unwrap_err();
        assert!(err.message().contains("recovery header"));
    }

    #[test]
    fn key_format_parses_from_text() {
        assert_eq!("K1".parse::<KeyFormat>().unwrap(), KeyFormat::K1);
        assert_eq!("legacy".parse::<KeyFormat>().unwrap(), KeyFormat::Legacy);
        assert!("r1".parse::<KeyFormat>().is_err());
    }

    fn is_canonical(compact: &[u8; 64]) -> bool {
        let (r, s) = compact.split_at(32);
        r[0] & 0x80 == 0
            && !(r[0] == 0 && r[1] & 0x80 == 0)
            && s[0] & 0x80 == 0
            && !(s[0] == 0 && s[1] & 0x80 == 0)
    }

    #[test]
    fn recovery_does_not_require_canonical_form() {
        let key = dev_secret_key();
        let (challenge, signature) = (0..64)
            .map(|i| format!("challenge-{}", i))
            .map(|challenge| {
                let signature = sign_challenge(&key, &challenge);
                (challenge, signature)
            })
            .find(|(_, signature)| {
                let (_, compact) = decode_signature(signature).unwrap().serialize_compact();
                !is_canonical(&compact)
            })
            .unwrap();

        let recovered = recover_public_key(&challenge, &signature, KeyFormat::K1).unwrap();
        assert_eq!(recovered, DEV_PUBLIC_KEY_K1);
    }
}
