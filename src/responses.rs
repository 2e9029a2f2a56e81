//! Computation of the credential-proof values exchanged during authentication.
//!
//! The hash functions (`lm_hash`, `ntlm_hash`, `ntlmv2_hash`) derive fixed-size keys from the
//! password; the response functions combine those keys with the server challenge and, for the
//! v2 family, with the client nonce, timestamp and the server's TargetInfo block.


use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand::rngs::OsRng;

use crate::buffer::pad_right;
use crate::crypto::{create_des_key, des_encrypt_block, hmac_md5, md4_digest, md5_digest};


/// Converts a point in time into the 64-bit NTLM timestamp format.
///
/// NTLM timestamps count tenths of microseconds since 1601-01-01T00:00:00Z and travel in
/// little-endian byte order.
pub fn ntlm_timestamp(time: DateTime<Utc>) -> [u8; 8] {
    let windows_epoch = NaiveDate::from_ymd_opt(1601, 1, 1)
        .expect("1601-01-01 is not a valid date?!")
        .and_hms_opt(0, 0, 0).expect("1601-01-01T00:00:00 is not a valid date-time?!")
        .and_utc();
    // the requested format is "tenths of a microsecond", so multiply by 10_000_000 and read seconds
    let delta = (time - windows_epoch) * 10_000_000;
    delta.num_seconds().to_le_bytes()
}

/// Obtains the current time as an NTLM timestamp.
pub fn ntlm_timestamp_now() -> [u8; 8] {
    ntlm_timestamp(Utc::now())
}

/// Generates a fresh 8-byte client nonce from the operating system's entropy source.
pub fn random_nonce() -> [u8; 8] {
    let mut nonce = [0u8; 8];
    OsRng.fill(&mut nonce);
    nonce
}


/// Performs the long DES encryption turning a 16-byte hash and the 8-byte challenge into a
/// 24-byte response value.
///
/// The hash is padded to 21 bytes and split into three 7-byte groups; each group is spread
/// into a parity-adjusted DES key which encrypts the challenge, and the three ciphertext
/// blocks are joined.
pub fn des_long_response(hash: &[u8; 16], challenge: &[u8; 8]) -> [u8; 24] {
    let padded = pad_right(hash, 21, 0x00);
    let key0: [u8; 7] = padded[0..7].try_into().unwrap();
    let key1: [u8; 7] = padded[7..14].try_into().unwrap();
    let key2: [u8; 7] = padded[14..21].try_into().unwrap();

    let mut ret = [0u8; 24];
    let (slice0, ret2) = ret.split_at_mut(8);
    let (slice1, slice2) = ret2.split_at_mut(8);
    slice0.copy_from_slice(&des_encrypt_block(challenge, &create_des_key(&key0)));
    slice1.copy_from_slice(&des_encrypt_block(challenge, &create_des_key(&key1)));
    slice2.copy_from_slice(&des_encrypt_block(challenge, &create_des_key(&key2)));

    ret
}


/// Derives the LM hash from a password.
///
/// The password is uppercased, encoded with the OEM single-byte encoding and truncated or
/// padded to 14 bytes; each 7-byte half becomes a DES key encrypting the fixed plaintext
/// `KGS!@#$%`, and the two ciphertext blocks are joined. A password that cannot be encoded
/// with the OEM encoding hashes to all zero bytes.
pub fn lm_hash(password: &str) -> [u8; 16] {
    let uppercase_password = password.to_uppercase();
    let mut password_bytes = Vec::with_capacity(14);
    for c in uppercase_password.chars() {
        let code = u32::from(c);
        if code > 0xFF {
            return [0; 16];
        }
        password_bytes.push(code as u8);
    }
    let padded = pad_right(&password_bytes, 14, 0x00);
    let key0: [u8; 7] = padded[0..7].try_into().unwrap();
    let key1: [u8; 7] = padded[7..14].try_into().unwrap();

    let mut output = [0; 16];
    let (half0, half1) = output.split_at_mut(8);
    half0.copy_from_slice(&des_encrypt_block(b"KGS!@#$%", &create_des_key(&key0)));
    half1.copy_from_slice(&des_encrypt_block(b"KGS!@#$%", &create_des_key(&key1)));

    output
}

/// Derives the NTLM hash from a password.
///
/// The password is encoded as UTF-16 in little-endian byte order (without the Byte Order
/// Mark) and hashed using MD4.
pub fn ntlm_hash(password: &str) -> [u8; 16] {
    let password_bytes: Vec<u8> = password.encode_utf16()
        .flat_map(|p| p.to_le_bytes())
        .collect();
    md4_digest(&password_bytes)
}

/// Derives the NTLMv2 hash from the credentials.
///
/// The NTLMv2 hash is the HMAC-MD5 of the uppercased username followed by the
/// unchanged-case target name, both encoded as UTF-16 in little-endian byte order; the HMAC
/// key is the NTLM hash of the password.
pub fn ntlmv2_hash(target: &str, username: &str, password: &str) -> [u8; 16] {
    let hmac_key = ntlm_hash(password);

    let mut key_material: Vec<u8> = username
        .to_uppercase()
        .encode_utf16()
        .flat_map(|p| p.to_le_bytes())
        .collect();
    key_material.extend(
        target.encode_utf16()
            .flat_map(|p| p.to_le_bytes())
    );

    hmac_md5(&hmac_key, &key_material)
}


/// Calculates the classic LM response to the given server challenge.
pub fn lm_response(password: &str, challenge: &[u8; 8]) -> [u8; 24] {
    des_long_response(&lm_hash(password), challenge)
}

/// Calculates the classic NTLM response to the given server challenge.
pub fn ntlm_response(password: &str, challenge: &[u8; 8]) -> [u8; 24] {
    des_long_response(&ntlm_hash(password), challenge)
}

/// Calculates the LMv2 response to the given server challenge.
///
/// The response is the HMAC-MD5 of server challenge and client nonce keyed with the NTLMv2
/// hash, followed by the client nonce itself.
pub fn lmv2_response(target: &str, username: &str, password: &str, challenge: &[u8; 8], client_nonce: &[u8; 8]) -> [u8; 24] {
    let v2_hash = ntlmv2_hash(target, username, password);

    let mut mac_input = [0u8; 16];
    mac_input[0..8].copy_from_slice(challenge);
    mac_input[8..16].copy_from_slice(client_nonce);
    let mac = hmac_md5(&v2_hash, &mac_input);

    let mut ret = [0u8; 24];
    ret[0..16].copy_from_slice(&mac);
    ret[16..24].copy_from_slice(client_nonce);
    ret
}

/// Assembles the NTLMv2 blob from the server's TargetInfo block, the client nonce and a
/// timestamp.
pub fn ntlmv2_blob(target_info: &[u8], client_nonce: &[u8; 8], timestamp: &[u8; 8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(28 + target_info.len() + 4);
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]); // blob signature
    blob.extend_from_slice(&[0x00; 4]); // reserved
    blob.extend_from_slice(timestamp);
    blob.extend_from_slice(client_nonce);
    blob.extend_from_slice(&[0x00; 4]); // unknown
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0x00; 4]); // unknown
    blob
}

/// Calculates the HMAC part of an NTLMv2 response for an already-assembled blob.
///
/// The HMAC-MD5 covers the server challenge followed by the blob and is keyed with the
/// NTLMv2 hash. Validating servers recompute exactly this value and compare it against the
/// first 16 bytes of the received NTLM response.
pub fn ntlmv2_response_hash(target: &str, username: &str, password: &str, blob: &[u8], challenge: &[u8; 8]) -> [u8; 16] {
    let v2_hash = ntlmv2_hash(target, username, password);

    let mut mac_input = Vec::with_capacity(8 + blob.len());
    mac_input.extend_from_slice(challenge);
    mac_input.extend_from_slice(blob);
    hmac_md5(&v2_hash, &mac_input)
}

/// Calculates the NTLMv2 response to the given server challenge.
///
/// The response consists of the 16-byte HMAC followed by the blob it covers.
pub fn ntlmv2_response(target: &str, username: &str, password: &str, target_info: &[u8], challenge: &[u8; 8], client_nonce: &[u8; 8], timestamp: &[u8; 8]) -> Vec<u8> {
    let blob = ntlmv2_blob(target_info, client_nonce, timestamp);
    let mac = ntlmv2_response_hash(target, username, password, &blob, challenge);

    let mut ret = Vec::with_capacity(16 + blob.len());
    ret.extend_from_slice(&mac);
    ret.extend_from_slice(&blob);
    ret
}

/// Calculates the NTLM2 session response to the given server challenge.
///
/// The session hash concatenates the MD5 digests of the server challenge and of the client
/// nonce, each hashed on its own; only the first 8 bytes survive the truncation and replace
/// the challenge in the long DES encryption.
pub fn ntlm2_session_response(password: &str, challenge: &[u8; 8], client_nonce: &[u8; 8]) -> [u8; 24] {
    let mut session_hash = Vec::with_capacity(32);
    session_hash.extend_from_slice(&md5_digest(challenge));
    session_hash.extend_from_slice(&md5_digest(client_nonce));
    let session_challenge: [u8; 8] = session_hash[0..8].try_into().unwrap();

    des_long_response(&ntlm_hash(password), &session_challenge)
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::buffer::{bytes_to_hex, hex_to_bytes};
    use crate::crypto::md5_digest;

    const CHALLENGE: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
    const CLIENT_NONCE: [u8; 8] = [0xFF, 0xFF, 0xFF, 0x00, 0x11, 0x22, 0x33, 0x44];

    const TARGET_INFO_HEX: &str =
        "02000c0044004f004d00410049004e0001000c005300450052005600450052000400140064006f006d00610069006e002e0063006f006d00030022007300650072007600650072002e0064006f006d00610069006e002e0063006f006d0000000000";
    const NTLMV2_RESPONSE_HEX: &str =
        "cbabbca713eb795d04c97abc01ee498301010000000000000090d336b734c301ffffff00112233440000000002000c0044004f004d00410049004e0001000c005300450052005600450052000400140064006f006d00610069006e002e0063006f006d00030022007300650072007600650072002e0064006f006d00610069006e002e0063006f006d000000000000000000";

    fn reference_timestamp() -> [u8; 8] {
        hex_to_bytes("0090d336b734c301").unwrap().try_into().unwrap()
    }

    #[test]
    fn lm_hash_known_value() {
        assert_eq!(bytes_to_hex(&lm_hash("SecREt01")), "FF3750BCC2B22412C2265B23734E0DAC");
    }

    #[test]
    fn lm_hash_of_unencodable_password_is_all_zero() {
        assert_eq!(lm_hash("\u{03C0}"), [0; 16]);
    }

    #[test]
    fn lm_hash_ignores_password_case() {
        assert_eq!(lm_hash("SecREt01"), lm_hash("secret01"));
    }

    #[test]
    fn ntlm_hash_known_value() {
        assert_eq!(bytes_to_hex(&ntlm_hash("SecREt01")), "CD06CA7C7E10C99B1D33B7485A2ED808");
    }

    #[test]
    fn ntlmv2_hash_known_value() {
        assert_eq!(
            bytes_to_hex(&ntlmv2_hash("DOMAIN", "user", "SecREt01")),
            "04B8E0BA74289CC540826BAB1DEE63AE",
        );
    }

    #[test]
    fn lm_response_known_value() {
        assert_eq!(
            bytes_to_hex(&lm_response("SecREt01", &CHALLENGE)),
            "C337CD5CBD44FC9782A667AF6D427C6DE67C20C2D3E77C56",
        );
    }

    #[test]
    fn ntlm_response_known_value() {
        assert_eq!(
            bytes_to_hex(&ntlm_response("SecREt01", &CHALLENGE)),
            "25A98C1C31E81847466B29B2DF4680F39958FB8C213A9CC6",
        );
    }

    #[test]
    fn lmv2_response_known_value() {
        assert_eq!(
            bytes_to_hex(&lmv2_response("DOMAIN", "user", "SecREt01", &CHALLENGE, &CLIENT_NONCE)),
            "D6E6152EA25D03B7C6BA6629C2D6AAF0FFFFFF0011223344",
        );
    }

    #[test]
    fn ntlmv2_response_known_value() {
        let target_info = hex_to_bytes(TARGET_INFO_HEX).unwrap();
        let response = ntlmv2_response(
            "DOMAIN", "user", "SecREt01",
            &target_info, &CHALLENGE, &CLIENT_NONCE, &reference_timestamp(),
        );
        assert_eq!(response, hex_to_bytes(NTLMV2_RESPONSE_HEX).unwrap());
    }

    #[test]
    fn ntlmv2_blob_layout() {
        let blob = ntlmv2_blob(&[0xAA, 0xBB], &CLIENT_NONCE, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&blob[0..4], &[0x01, 0x01, 0x00, 0x00]);
        assert_eq!(&blob[4..8], &[0x00; 4]);
        assert_eq!(&blob[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&blob[16..24], &CLIENT_NONCE);
        assert_eq!(&blob[24..28], &[0x00; 4]);
        assert_eq!(&blob[28..30], &[0xAA, 0xBB]);
        assert_eq!(&blob[30..34], &[0x00; 4]);
        assert_eq!(blob.len(), 34);
    }

    #[test]
    fn ntlmv2_response_hash_matches_response_prefix() {
        let target_info = hex_to_bytes(TARGET_INFO_HEX).unwrap();
        let timestamp = reference_timestamp();
        let blob = ntlmv2_blob(&target_info, &CLIENT_NONCE, &timestamp);
        let mac = ntlmv2_response_hash("DOMAIN", "user", "SecREt01", &blob, &CHALLENGE);
        let response = ntlmv2_response(
            "DOMAIN", "user", "SecREt01",
            &target_info, &CHALLENGE, &CLIENT_NONCE, &timestamp,
        );
        assert_eq!(&response[0..16], &mac);
        assert_eq!(&response[16..], blob.as_slice());
    }

    #[test]
    fn ntlm2_session_response_truncates_separate_digests() {
        // the truncation to 8 bytes means only the challenge's own digest contributes
        let session_challenge: [u8; 8] = md5_digest(&CHALLENGE)[0..8].try_into().unwrap();
        let expected = des_long_response(&ntlm_hash("SecREt01"), &session_challenge);
        assert_eq!(ntlm2_session_response("SecREt01", &CHALLENGE, &CLIENT_NONCE), expected);
    }

    #[test]
    fn ntlm_timestamp_of_windows_epoch_is_zero() {
        let epoch = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ntlm_timestamp(epoch), [0; 8]);
    }

    #[test]
    fn ntlm_timestamp_counts_hundred_nanosecond_ticks() {
        let one_second = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(ntlm_timestamp(one_second), 10_000_000u64.to_le_bytes());

        let unix_epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(ntlm_timestamp(unix_epoch), 116_444_736_000_000_000u64.to_le_bytes());
    }

    #[test]
    fn reference_timestamp_encodes_reference_date() {
        // the documented response calculation example pins its blob to this moment
        let time = Utc.with_ymd_and_hms(2003, 6, 17, 10, 0, 0).unwrap();
        assert_eq!(ntlm_timestamp(time), reference_timestamp());
    }
}
