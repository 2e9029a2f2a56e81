//! The cryptographic primitives underneath the NTLM response calculations: DES in ECB mode
//! without padding, the legacy 7-to-8-byte DES key expansion with parity adjustment, and the
//! MD4/MD5/HMAC-MD5 digests.


use std::fmt;

use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use cipher::generic_array::GenericArray;
use cipher::generic_array::typenum::U8;
use des::Des;
use digest::Digest;
use hmac::{Hmac, Mac};
use md4::Md4;
use md5::Md5;


/// The block length of the DES cipher in bytes.
pub const DES_BLOCK_LEN: usize = 8;


/// An error that may occur while applying a cryptographic primitive.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CryptoError {
    /// The input length is not a multiple of the cipher's block length.
    InvalidBlockSize { obtained_len: usize },
}
impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBlockSize { obtained_len }
                => write!(f, "data length ({} bytes) is not a multiple of the DES block length ({} bytes)", obtained_len, DES_BLOCK_LEN),
        }
    }
}
impl std::error::Error for CryptoError {
}


/// Encrypts block-aligned data with DES in ECB mode without padding.
///
/// NTLM only ever encrypts exactly one block at a time, so no padding scheme is applied;
/// input that is not a multiple of 8 bytes is rejected.
pub fn des_ecb_encrypt(data: &[u8], key: &[u8; 8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() % DES_BLOCK_LEN != 0 {
        return Err(CryptoError::InvalidBlockSize { obtained_len: data.len() });
    }
    let des = Des::new(&GenericArray::from(*key));
    let mut ret = Vec::from(data);
    for block in ret.chunks_exact_mut(DES_BLOCK_LEN) {
        des.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(ret)
}

/// Decrypts block-aligned data with DES in ECB mode without padding.
pub fn des_ecb_decrypt(data: &[u8], key: &[u8; 8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() % DES_BLOCK_LEN != 0 {
        return Err(CryptoError::InvalidBlockSize { obtained_len: data.len() });
    }
    let des = Des::new(&GenericArray::from(*key));
    let mut ret = Vec::from(data);
    for block in ret.chunks_exact_mut(DES_BLOCK_LEN) {
        des.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(ret)
}

/// Encrypts a single DES block. Infallible by construction, for the response calculations
/// which always operate on exactly one block.
pub fn des_encrypt_block(block: &[u8; 8], key: &[u8; 8]) -> [u8; 8] {
    let des = Des::new(&GenericArray::from(*key));
    let mut buf: GenericArray<u8, U8> = GenericArray::from(*block);
    des.encrypt_block(&mut buf);
    let mut ret = [0u8; 8];
    ret.copy_from_slice(buf.as_slice());
    ret
}

/// Expands 7 bytes of key material into a parity-adjusted 8-byte DES key.
///
/// This is the classic LanMan key schedule: the 56 bits of material are spread over the seven
/// high bits of each output byte (output byte `i` takes the bits that material byte `i-1` could
/// not fit, followed by the high bits of material byte `i`), and the low bit of every output
/// byte is then set or cleared so the byte has odd parity.
pub fn create_des_key(material: &[u8; 7]) -> [u8; 8] {
    let mut key = [
        material[0],
        (material[0] << 7) | (material[1] >> 1),
        (material[1] << 6) | (material[2] >> 2),
        (material[2] << 5) | (material[3] >> 3),
        (material[3] << 4) | (material[4] >> 4),
        (material[4] << 3) | (material[5] >> 5),
        (material[5] << 2) | (material[6] >> 6),
        material[6] << 1,
    ];
    for b in &mut key {
        if (*b >> 1).count_ones() % 2 == 0 {
            *b |= 0x01;
        } else {
            *b &= 0xFE;
        }
    }
    key
}

/// Computes the MD4 digest of the given data.
pub fn md4_digest(data: &[u8]) -> [u8; 16] {
    let mut md4 = <Md4 as Digest>::new();
    md4.update(data);
    md4.finalize().as_slice().try_into().unwrap()
}

/// Computes the MD5 digest of the given data.
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    let mut md5 = <Md5 as Digest>::new();
    md5.update(data);
    md5.finalize().as_slice().try_into().unwrap()
}

/// Computes the HMAC-MD5 of `data` keyed with `key` (RFC 2104).
pub fn hmac_md5(key: &[u8], data: &[u8]) -> [u8; 16] {
    let mut hmac_md5: Hmac<Md5> = <Hmac<Md5> as Mac>::new_from_slice(key).unwrap();
    hmac_md5.update(data);
    let mut ret = [0u8; 16];
    ret.copy_from_slice(hmac_md5.finalize().into_bytes().as_slice());
    ret
}
