//! The NTLM message model and its wire codec.
//!
//! Each of the three message types is a plain value struct convertible to and from raw bytes.
//! Decoding validates the signature, the type discriminant and every security buffer range
//! before touching the variable region; encoding recomputes all security buffers from the
//! logical fields in one pass and lays the variable fields out in the canonical order real
//! implementations expect.


use std::fmt;

use crate::{Flags, NTLMSSP_MAGIC};
use crate::buffer::{copy_range, RangeError};


const MESSAGE_TYPE_NEGOTIATE: u32 = 0x0000_0001;
const MESSAGE_TYPE_CHALLENGE: u32 = 0x0000_0002;
const MESSAGE_TYPE_AUTHENTICATE: u32 = 0x0000_0003;

const NEGOTIATE_HEADER_LEN: usize = 40;
const CHALLENGE_HEADER_LEN: usize = 48;
const AUTHENTICATE_HEADER_LEN: usize = 64;


/// An error that may occur while parsing received NTLM packets.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ParsingError {
    /// The message is shorter than its fixed header.
    ShortHeader { expected_min_len: usize, obtained_len: usize },

    /// The magic value does not match the expected one.
    MagicMismatch { expected: [u8; 8], obtained: Vec<u8> },

    /// The message type discriminant differs from the one this decoder handles.
    UnexpectedType { expected: u32, obtained: u32 },

    /// The message type discriminant is not a known NTLM message type.
    UnknownType { obtained: u32 },

    /// An internal item has a different length than expected.
    ItemLengthMismatch { expected: usize, obtained: usize },

    /// A declared field range reaches past the end of the supplied buffer.
    TruncatedBuffer { requested_end: usize, available: usize },

    /// An internal item's length is not divisible by an expected divisor.
    ItemLengthNotDivisible { expected_divisor: usize, obtained_length: usize },

    /// A string of 16-bit characters could not be decoded as UTF-16.
    InvalidUtf16 { value: Vec<u16> },
}
impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortHeader { expected_min_len, obtained_len }
                => write!(f, "header too short (expected at least {} bytes, obtained {})", expected_min_len, obtained_len),
            Self::MagicMismatch { expected, obtained }
                => write!(f, "mismatched magic (expected {:?}, obtained {:?})", expected, obtained),
            Self::UnexpectedType { expected, obtained }
                => write!(f, "unexpected message type (expected {}, obtained {})", expected, obtained),
            Self::UnknownType { obtained }
                => write!(f, "unknown message type {}", obtained),
            Self::ItemLengthMismatch { expected, obtained }
                => write!(f, "insufficient length for an internal item (expected {:?}, obtained {:?})", expected, obtained),
            Self::TruncatedBuffer { requested_end, available }
                => write!(f, "field range ends at {} but only {} bytes are available", requested_end, available),
            Self::ItemLengthNotDivisible { expected_divisor, obtained_length }
                => write!(f, "item length {} not divisible by {}", obtained_length, expected_divisor),
            Self::InvalidUtf16 { value }
                => write!(f, "failed to decode value as UTF-16: {:?}", value),
        }
    }
}
impl std::error::Error for ParsingError {
}
impl From<RangeError> for ParsingError {
    fn from(e: RangeError) -> Self {
        match e {
            RangeError::EmptyData
                => ParsingError::TruncatedBuffer { requested_end: 0, available: 0 },
            RangeError::StartOutOfRange { start, length }
                => ParsingError::TruncatedBuffer { requested_end: start, available: length },
            RangeError::EndOutOfRange { end, length }
                => ParsingError::TruncatedBuffer { requested_end: end, available: length },
        }
    }
}

/// An error that may occur while writing an NTLM packet.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StoringError {
    /// The string cannot be encoded using the OEM encoding.
    NonOemEncodable { string: String },

    /// A variable field is longer than a security buffer's 16-bit length can carry.
    FieldTooLong { obtained_len: usize },
}
impl fmt::Display for StoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonOemEncodable { string }
                => write!(f, "failed to encode {:?} using OEM encoding", string),
            Self::FieldTooLong { obtained_len }
                => write!(f, "field of {} bytes does not fit a 16-bit length", obtained_len),
        }
    }
}
impl std::error::Error for StoringError {
}


// string encoding helpers


/// Encodes a string as UTF-16 in little-endian byte order, without a Byte Order Mark.
fn string_to_utf16_le(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .flat_map(|w| w.to_le_bytes())
        .collect()
}

/// Converts UTF-16 values stored as bytes in little-endian format into a string.
fn utf16_le_bytes_to_string(bytes: &[u8]) -> Result<String, ParsingError> {
    if bytes.len() % 2 != 0 {
        return Err(ParsingError::ItemLengthNotDivisible { expected_divisor: 2, obtained_length: bytes.len() });
    }
    let u16s: Vec<u16> = bytes.chunks_exact(2)
        .map(|chk| u16::from_le_bytes(chk.try_into().unwrap()))
        .collect();
    String::from_utf16(&u16s)
        .or(Err(ParsingError::InvalidUtf16 { value: u16s }))
}

/// Encodes a string with the OEM single-byte encoding (ASCII/Latin-1 subset).
fn string_to_oem_bytes(s: &str) -> Result<Vec<u8>, StoringError> {
    let mut ret = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = u32::from(c);
        if code > 0xFF {
            return Err(StoringError::NonOemEncodable { string: s.to_owned() });
        }
        ret.push(code as u8);
    }
    Ok(ret)
}

/// Decodes OEM single-byte text; every byte maps to the code point of the same value.
fn oem_bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes a text field as UTF-16 or OEM depending on the negotiated flags.
fn ntlm_bytes_to_string(flags: Flags, bytes: &[u8]) -> Result<String, ParsingError> {
    if flags.contains(Flags::NEGOTIATE_UNICODE) {
        utf16_le_bytes_to_string(bytes)
    } else {
        Ok(oem_bytes_to_string(bytes))
    }
}

/// Encodes a text field as UTF-16 or OEM depending on the negotiated flags.
fn ntlm_string_to_bytes(flags: Flags, s: &str) -> Result<Vec<u8>, StoringError> {
    if flags.contains(Flags::NEGOTIATE_UNICODE) {
        Ok(string_to_utf16_le(s))
    } else {
        string_to_oem_bytes(s)
    }
}


/// An NTLM security buffer, pointing to a variable-length field later in the message.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SecurityBuffer {
    pub length: u16,
    pub capacity: u16,
    pub offset: u32,
}
impl SecurityBuffer {
    /// Generates a security buffer for the given slice of bytes.
    ///
    /// The length and capacity are set to the length of the slice, while the offset is set to 0.
    pub fn for_slice(slice: &[u8]) -> Result<Self, StoringError> {
        let len_u16: u16 = slice.len().try_into()
            .or(Err(StoringError::FieldTooLong { obtained_len: slice.len() }))?;
        Ok(Self {
            length: len_u16,
            capacity: len_u16,
            offset: 0,
        })
    }

    /// Serializes the security buffer into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(8);
        ret.extend_from_slice(&self.length.to_le_bytes());
        ret.extend_from_slice(&self.capacity.to_le_bytes());
        ret.extend_from_slice(&self.offset.to_le_bytes());
        ret
    }

    /// Copies the referenced bytes out of the full message buffer.
    ///
    /// Offsets are absolute from the start of the message. A zero-length buffer resolves to an
    /// empty byte sequence without inspecting the offset; real messages routinely point empty
    /// fields at the very end of the buffer.
    pub fn extract(&self, message: &[u8]) -> Result<Vec<u8>, ParsingError> {
        if self.length == 0 {
            return Ok(Vec::new());
        }
        let data = copy_range(message, self.offset as usize, Some(usize::from(self.length)))?;
        Ok(data)
    }
}
impl TryFrom<&[u8]> for SecurityBuffer {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != 8 {
            return Err(ParsingError::ItemLengthMismatch { expected: 8, obtained: value.len() });
        }

        let length = u16::from_le_bytes(value[0..2].try_into().unwrap());
        let capacity = u16::from_le_bytes(value[2..4].try_into().unwrap());
        let offset = u32::from_le_bytes(value[4..8].try_into().unwrap());

        Ok(Self {
            length,
            capacity,
            offset,
        })
    }
}

/// Lays out the next variable field in the trailing data region, returning its security buffer
/// and advancing the running offset past the field.
fn next_sec_buffer(sec_buffer_offset: &mut u32, data: &[u8]) -> Result<SecurityBuffer, StoringError> {
    let mut sb = SecurityBuffer::for_slice(data)?;
    sb.offset = *sec_buffer_offset;
    *sec_buffer_offset += u32::from(sb.length);
    Ok(sb)
}


/// The type of a piece of target information included in the Challenge message.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TargetInfoType {
    Terminator,
    ServerName,
    DomainName,
    FullyQualifiedDomainName,
    DnsDomainName,
    Unknown(u16),
}
impl From<TargetInfoType> for u16 {
    fn from(t: TargetInfoType) -> Self {
        match t {
            TargetInfoType::Terminator => 0x0000,
            TargetInfoType::ServerName => 0x0001,
            TargetInfoType::DomainName => 0x0002,
            TargetInfoType::FullyQualifiedDomainName => 0x0003,
            TargetInfoType::DnsDomainName => 0x0004,
            TargetInfoType::Unknown(w) => w,
        }
    }
}
impl From<u16> for TargetInfoType {
    fn from(w: u16) -> Self {
        match w {
            0x0000 => TargetInfoType::Terminator,
            0x0001 => TargetInfoType::ServerName,
            0x0002 => TargetInfoType::DomainName,
            0x0003 => TargetInfoType::FullyQualifiedDomainName,
            0x0004 => TargetInfoType::DnsDomainName,
            other => TargetInfoType::Unknown(other),
        }
    }
}

/// An entry of additional target information included in the Challenge message.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TargetInfoEntry {
    pub entry_type: TargetInfoType,
    pub content: Vec<u8>,
}
impl TargetInfoEntry {
    /// Serializes the target info entry into bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoringError> {
        let content_len: u16 = self.content.len().try_into()
            .or(Err(StoringError::FieldTooLong { obtained_len: self.content.len() }))?;
        let entry_type_u16: u16 = self.entry_type.into();

        let mut ret = Vec::with_capacity(4 + self.content.len());
        ret.extend_from_slice(&entry_type_u16.to_le_bytes());
        ret.extend_from_slice(&content_len.to_le_bytes());
        ret.extend_from_slice(&self.content);
        Ok(ret)
    }

    /// Attempts to deserialize a target info entry from the given byte slice. If successful,
    /// returns the entry as well as the bytes remaining after it.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), ParsingError> {
        if bytes.len() < 4 {
            return Err(ParsingError::TruncatedBuffer { requested_end: 4, available: bytes.len() });
        }

        let entry_type_u16 = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
        let length = usize::from(u16::from_le_bytes(bytes[2..4].try_into().unwrap()));
        if 4 + length > bytes.len() {
            return Err(ParsingError::TruncatedBuffer { requested_end: 4 + length, available: bytes.len() });
        }

        let entry = Self {
            entry_type: entry_type_u16.into(),
            content: Vec::from(&bytes[4..4+length]),
        };
        Ok((entry, &bytes[4+length..]))
    }

    /// Attempts to convert the content of this target info entry into a string.
    pub fn to_string(&self) -> Result<String, ParsingError> {
        utf16_le_bytes_to_string(&self.content)
    }

    /// Creates a target info entry from an entry type and a string.
    ///
    /// Entry content is always Unicode, even if the surrounding message negotiated OEM text.
    pub fn from_string(entry_type: TargetInfoType, string: &str) -> Self {
        Self {
            entry_type,
            content: string_to_utf16_le(string),
        }
    }
}

/// Decodes a TargetInfo TLV block into its entries.
///
/// Parsing stops after the first Terminator entry, which is kept in the returned list; any
/// bytes following it are ignored. An empty block yields an empty list.
pub fn decode_target_info(data: &[u8]) -> Result<Vec<TargetInfoEntry>, ParsingError> {
    let mut entries = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (entry, next) = TargetInfoEntry::try_from_bytes(rest)?;
        let at_terminator = entry.entry_type == TargetInfoType::Terminator;
        entries.push(entry);
        rest = next;
        if at_terminator {
            break;
        }
    }
    Ok(entries)
}

/// Encodes TargetInfo entries into their TLV wire form.
///
/// No Terminator is appended implicitly; a well-formed list carries its own as the last entry.
pub fn encode_target_info(entries: &[TargetInfoEntry]) -> Result<Vec<u8>, StoringError> {
    let mut ret = Vec::new();
    for entry in entries {
        ret.extend_from_slice(&entry.to_bytes()?);
    }
    Ok(ret)
}


/// A structure representing the version of an operating system as well as the NTLM revision used.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OsVersion {
    pub major_version: u8,
    pub minor_version: u8,
    pub build_number: u16,
    pub reserved: [u8; 3],
    pub ntlm_revision: u8,
}
impl OsVersion {
    /// Serializes the OS version structure into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(8);
        ret.push(self.major_version);
        ret.push(self.minor_version);
        ret.extend_from_slice(&self.build_number.to_le_bytes());
        ret.extend_from_slice(&self.reserved);
        ret.push(self.ntlm_revision);
        ret
    }
}
impl TryFrom<&[u8]> for OsVersion {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != 8 {
            return Err(ParsingError::ItemLengthMismatch { expected: 8, obtained: value.len() });
        }

        Ok(OsVersion {
            major_version: value[0],
            minor_version: value[1],
            build_number: u16::from_le_bytes(value[2..4].try_into().unwrap()),
            reserved: value[4..7].try_into().unwrap(),
            ntlm_revision: value[7],
        })
    }
}


/// Validates the common message header: magic, type discriminant, minimum length.
fn check_message_header(value: &[u8], expected_type: u32, min_len: usize) -> Result<(), ParsingError> {
    if value.len() < 12 {
        return Err(ParsingError::ShortHeader { expected_min_len: min_len, obtained_len: value.len() });
    }
    let obtained_magic: [u8; 8] = value[0..8].try_into().unwrap();
    if obtained_magic != NTLMSSP_MAGIC {
        return Err(ParsingError::MagicMismatch { expected: NTLMSSP_MAGIC, obtained: Vec::from(obtained_magic) });
    }
    let message_type = u32::from_le_bytes(value[8..12].try_into().unwrap());
    if message_type != expected_type {
        return Err(ParsingError::UnexpectedType { expected: expected_type, obtained: message_type });
    }
    if value.len() < min_len {
        return Err(ParsingError::ShortHeader { expected_min_len: min_len, obtained_len: value.len() });
    }
    Ok(())
}


/// An NTLM message.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Message {
    Negotiate(NegotiateMessage),
    Challenge(ChallengeMessage),
    Authenticate(AuthenticateMessage),
}
impl Message {
    /// Returns the 32-bit discriminant identifying the type of this message on the wire.
    pub fn message_number(&self) -> u32 {
        match self {
            Self::Negotiate(_) => MESSAGE_TYPE_NEGOTIATE,
            Self::Challenge(_) => MESSAGE_TYPE_CHALLENGE,
            Self::Authenticate(_) => MESSAGE_TYPE_AUTHENTICATE,
        }
    }

    /// Serializes the NTLM message into bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoringError> {
        match self {
            Self::Negotiate(t1m) => t1m.to_bytes(),
            Self::Challenge(t2m) => t2m.to_bytes(),
            Self::Authenticate(t3m) => t3m.to_bytes(),
        }
    }
}
impl TryFrom<&[u8]> for Message {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() < 12 {
            return Err(ParsingError::ShortHeader { expected_min_len: 12, obtained_len: value.len() });
        }
        let obtained_magic: [u8; 8] = value[0..8].try_into().unwrap();
        if obtained_magic != NTLMSSP_MAGIC {
            return Err(ParsingError::MagicMismatch { expected: NTLMSSP_MAGIC, obtained: Vec::from(obtained_magic) });
        }
        let message_type = u32::from_le_bytes(value[8..12].try_into().unwrap());
        match message_type {
            MESSAGE_TYPE_NEGOTIATE => NegotiateMessage::try_from(value)
                .map(Message::Negotiate),
            MESSAGE_TYPE_CHALLENGE => ChallengeMessage::try_from(value)
                .map(Message::Challenge),
            MESSAGE_TYPE_AUTHENTICATE => AuthenticateMessage::try_from(value)
                .map(Message::Authenticate),
            other_type => Err(ParsingError::UnknownType { obtained: other_type }),
        }
    }
}


/// The contents of an NTLM Negotiate message.
///
/// The Negotiate message is the first message in an NTLM challenge-response exchange and is sent
/// by the client to the server; the server is expected to respond with a Challenge message.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NegotiateMessage {
    /// Stores which information has been supplied and which NTLM behavior the client offers to
    /// negotiate.
    pub flags: Flags,

    /// The domain against which the client wishes to authenticate.
    pub domain: String,

    /// The NT hostname of the client.
    pub host: String,

    /// Version information about the client's operating system.
    pub os_version: OsVersion,
}
impl NegotiateMessage {
    /// Serializes the Negotiate message into bytes.
    ///
    /// Domain and host are always carried in the OEM encoding. The trailing data region holds
    /// the host bytes first, then the domain bytes, even though the fixed header declares the
    /// domain's security buffer first.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoringError> {
        let host_bytes = string_to_oem_bytes(&self.host)?;
        let domain_bytes = string_to_oem_bytes(&self.domain)?;

        let mut sec_buffer_offset = NEGOTIATE_HEADER_LEN as u32;
        let host_secbuf = next_sec_buffer(&mut sec_buffer_offset, &host_bytes)?;
        let domain_secbuf = next_sec_buffer(&mut sec_buffer_offset, &domain_bytes)?;

        let mut ret = Vec::with_capacity(NEGOTIATE_HEADER_LEN + host_bytes.len() + domain_bytes.len());
        ret.extend_from_slice(&NTLMSSP_MAGIC);
        ret.extend_from_slice(&MESSAGE_TYPE_NEGOTIATE.to_le_bytes());
        ret.extend_from_slice(&self.flags.bits().to_le_bytes());
        ret.extend_from_slice(&domain_secbuf.to_bytes());
        ret.extend_from_slice(&host_secbuf.to_bytes());
        ret.extend_from_slice(&self.os_version.to_bytes());
        ret.extend_from_slice(&host_bytes);
        ret.extend_from_slice(&domain_bytes);
        Ok(ret)
    }
}
impl TryFrom<&[u8]> for NegotiateMessage {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        check_message_header(value, MESSAGE_TYPE_NEGOTIATE, NEGOTIATE_HEADER_LEN)?;

        let flags = Flags::from_bits_retain(u32::from_le_bytes(value[12..16].try_into().unwrap()));
        let domain_secbuf = SecurityBuffer::try_from(&value[16..24])?;
        let host_secbuf = SecurityBuffer::try_from(&value[24..32])?;
        let os_version = OsVersion::try_from(&value[32..40])?;

        let domain = oem_bytes_to_string(&domain_secbuf.extract(value)?);
        let host = oem_bytes_to_string(&host_secbuf.extract(value)?);

        Ok(Self {
            flags,
            domain,
            host,
            os_version,
        })
    }
}


/// The contents of an NTLM Challenge message.
///
/// The Challenge message is sent by the server in response to the client's Negotiate message;
/// the client is expected to respond with an Authenticate message.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChallengeMessage {
    /// The name of the authentication target, usually the server's domain.
    pub target_name: String,

    /// Stores which NTLM behavior the server has accepted from the client's offer.
    pub flags: Flags,

    /// The challenge value.
    pub challenge: [u8; 8],

    /// The context value, reserved and all zero in practice.
    pub context: [u8; 8],

    /// Information about the target of the authentication.
    pub target_info: Vec<TargetInfoEntry>,
}
impl ChallengeMessage {
    /// Serializes the Challenge message into bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoringError> {
        let target_name_bytes = ntlm_string_to_bytes(self.flags, &self.target_name)?;
        let target_info_bytes = encode_target_info(&self.target_info)?;

        let mut sec_buffer_offset = CHALLENGE_HEADER_LEN as u32;
        let target_name_secbuf = next_sec_buffer(&mut sec_buffer_offset, &target_name_bytes)?;
        let target_info_secbuf = next_sec_buffer(&mut sec_buffer_offset, &target_info_bytes)?;

        let mut ret = Vec::with_capacity(CHALLENGE_HEADER_LEN + target_name_bytes.len() + target_info_bytes.len());
        ret.extend_from_slice(&NTLMSSP_MAGIC);
        ret.extend_from_slice(&MESSAGE_TYPE_CHALLENGE.to_le_bytes());
        ret.extend_from_slice(&target_name_secbuf.to_bytes());
        ret.extend_from_slice(&self.flags.bits().to_le_bytes());
        ret.extend_from_slice(&self.challenge);
        ret.extend_from_slice(&self.context);
        ret.extend_from_slice(&target_info_secbuf.to_bytes());
        ret.extend_from_slice(&target_name_bytes);
        ret.extend_from_slice(&target_info_bytes);
        Ok(ret)
    }

    /// Returns the encoded TargetInfo block exactly as it travels in the message.
    ///
    /// This is the byte sequence a v2 client copies into its response blob.
    pub fn target_info_bytes(&self) -> Result<Vec<u8>, StoringError> {
        encode_target_info(&self.target_info)
    }
}
impl TryFrom<&[u8]> for ChallengeMessage {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        check_message_header(value, MESSAGE_TYPE_CHALLENGE, CHALLENGE_HEADER_LEN)?;

        let target_name_secbuf = SecurityBuffer::try_from(&value[12..20])?;
        let flags = Flags::from_bits_retain(u32::from_le_bytes(value[20..24].try_into().unwrap()));
        let challenge: [u8; 8] = value[24..32].try_into().unwrap();
        let context: [u8; 8] = value[32..40].try_into().unwrap();
        let target_info_secbuf = SecurityBuffer::try_from(&value[40..48])?;

        let target_name = ntlm_bytes_to_string(flags, &target_name_secbuf.extract(value)?)?;
        let target_info = decode_target_info(&target_info_secbuf.extract(value)?)?;

        Ok(Self {
            target_name,
            flags,
            challenge,
            context,
            target_info,
        })
    }
}


/// The contents of an NTLM Authenticate message.
///
/// The Authenticate message is sent by the client in response to the server's Challenge
/// message; once it is accepted by the server, the authentication has succeeded.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AuthenticateMessage {
    pub lm_response: Vec<u8>,
    pub ntlm_response: Vec<u8>,
    pub target_name: String,
    pub user_name: String,
    pub host_name: String,
    pub session_key: Vec<u8>,
    pub flags: Flags,
}
impl AuthenticateMessage {
    /// Serializes the Authenticate message into bytes.
    ///
    /// The trailing data region holds the three names first, then the responses and the session
    /// key; the fixed header declares the responses' security buffers first.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoringError> {
        let target_name_bytes = ntlm_string_to_bytes(self.flags, &self.target_name)?;
        let user_name_bytes = ntlm_string_to_bytes(self.flags, &self.user_name)?;
        let host_name_bytes = ntlm_string_to_bytes(self.flags, &self.host_name)?;

        let mut sec_buffer_offset = AUTHENTICATE_HEADER_LEN as u32;
        let target_name_secbuf = next_sec_buffer(&mut sec_buffer_offset, &target_name_bytes)?;
        let user_name_secbuf = next_sec_buffer(&mut sec_buffer_offset, &user_name_bytes)?;
        let host_name_secbuf = next_sec_buffer(&mut sec_buffer_offset, &host_name_bytes)?;
        let lm_response_secbuf = next_sec_buffer(&mut sec_buffer_offset, &self.lm_response)?;
        let ntlm_response_secbuf = next_sec_buffer(&mut sec_buffer_offset, &self.ntlm_response)?;
        let session_key_secbuf = next_sec_buffer(&mut sec_buffer_offset, &self.session_key)?;

        let mut ret = Vec::with_capacity(sec_buffer_offset as usize);
        ret.extend_from_slice(&NTLMSSP_MAGIC);
        ret.extend_from_slice(&MESSAGE_TYPE_AUTHENTICATE.to_le_bytes());
        ret.extend_from_slice(&lm_response_secbuf.to_bytes());
        ret.extend_from_slice(&ntlm_response_secbuf.to_bytes());
        ret.extend_from_slice(&target_name_secbuf.to_bytes());
        ret.extend_from_slice(&user_name_secbuf.to_bytes());
        ret.extend_from_slice(&host_name_secbuf.to_bytes());
        ret.extend_from_slice(&session_key_secbuf.to_bytes());
        ret.extend_from_slice(&self.flags.bits().to_le_bytes());
        ret.extend_from_slice(&target_name_bytes);
        ret.extend_from_slice(&user_name_bytes);
        ret.extend_from_slice(&host_name_bytes);
        ret.extend_from_slice(&self.lm_response);
        ret.extend_from_slice(&self.ntlm_response);
        ret.extend_from_slice(&self.session_key);
        Ok(ret)
    }
}
impl TryFrom<&[u8]> for AuthenticateMessage {
    type Error = ParsingError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        check_message_header(value, MESSAGE_TYPE_AUTHENTICATE, AUTHENTICATE_HEADER_LEN)?;

        let lm_response_secbuf = SecurityBuffer::try_from(&value[12..20])?;
        let ntlm_response_secbuf = SecurityBuffer::try_from(&value[20..28])?;
        let target_name_secbuf = SecurityBuffer::try_from(&value[28..36])?;
        let user_name_secbuf = SecurityBuffer::try_from(&value[36..44])?;
        let host_name_secbuf = SecurityBuffer::try_from(&value[44..52])?;
        let session_key_secbuf = SecurityBuffer::try_from(&value[52..60])?;
        let flags = Flags::from_bits_retain(u32::from_le_bytes(value[60..64].try_into().unwrap()));

        let lm_response = lm_response_secbuf.extract(value)?;
        let ntlm_response = ntlm_response_secbuf.extract(value)?;
        let target_name = ntlm_bytes_to_string(flags, &target_name_secbuf.extract(value)?)?;
        let user_name = ntlm_bytes_to_string(flags, &user_name_secbuf.extract(value)?)?;
        let host_name = ntlm_bytes_to_string(flags, &host_name_secbuf.extract(value)?)?;
        let session_key = session_key_secbuf.extract(value)?;

        Ok(Self {
            lm_response,
            ntlm_response,
            target_name,
            user_name,
            host_name,
            session_key,
            flags,
        })
    }
}
