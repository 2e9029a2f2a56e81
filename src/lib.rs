//! An NTLM challenge-response authentication library.
//!
//! The crate covers the three-message wire codec (Negotiate, Challenge, Authenticate), the
//! LM/NTLM/NTLMv2 response calculations, and the server-side flow of answering a Negotiate
//! token with a Challenge and validating the final Authenticate token. Transporting the
//! tokens (HTTP headers, base64 framing, session tracking) is left to the caller.
//!
//! Sample usage, playing both ends of an exchange in memory:
//! ```
//! use base64::prelude::{BASE64_STANDARD, Engine};
//!
//! // the server side knows which credentials it expects
//! let config = ntlmauth::ServerConfig {
//!     credentials: ntlmauth::Credentials {
//!         username: "user".to_owned(),
//!         password: "SecREt01".to_owned(),
//!         domain: "DOMAIN".to_owned(),
//!     },
//!     server_name: "SERVER".to_owned(),
//!     dns_domain_name: "domain.com".to_owned(),
//!     dns_server_name: "server.domain.com".to_owned(),
//! };
//! let challenge_value = ntlmauth::random_nonce();
//!
//! // client: open the exchange
//! let nego_flags
//!     = ntlmauth::Flags::NEGOTIATE_UNICODE
//!     | ntlmauth::Flags::NEGOTIATE_NTLM
//!     | ntlmauth::Flags::NEGOTIATE_TARGET_INFO
//!     ;
//! let nego_msg = ntlmauth::Message::Negotiate(ntlmauth::NegotiateMessage {
//!     flags: nego_flags,
//!     domain: String::new(),
//!     host: "WORKSTATION".to_owned(),
//!     os_version: Default::default(),
//! });
//! let nego_b64 = BASE64_STANDARD.encode(
//!     nego_msg.to_bytes()
//!         .expect("failed to encode negotiate message")
//! );
//!
//! // server: decode the token and answer it with a challenge
//! let nego_token = BASE64_STANDARD.decode(&nego_b64)
//!     .expect("base64 decoding negotiate token failed");
//! let challenge_token = match config.respond(&nego_token, &challenge_value) {
//!     Ok(ntlmauth::ServerResponse::Challenge(bytes)) => bytes,
//!     other => panic!("unexpected server reaction: {:?}", other),
//! };
//!
//! // client: calculate the v2 responses to the challenge
//! let challenge_msg = match ntlmauth::Message::try_from(challenge_token.as_slice()) {
//!     Ok(ntlmauth::Message::Challenge(c)) => c,
//!     other => panic!("unexpected message: {:?}", other),
//! };
//! let target_info = challenge_msg.target_info_bytes()
//!     .expect("failed to re-encode target info");
//! let client_nonce = ntlmauth::random_nonce();
//! let timestamp = ntlmauth::ntlm_timestamp_now();
//! let auth_msg = ntlmauth::Message::Authenticate(ntlmauth::AuthenticateMessage {
//!     lm_response: ntlmauth::lmv2_response(
//!         &challenge_msg.target_name, "user", "SecREt01",
//!         &challenge_msg.challenge, &client_nonce,
//!     ).to_vec(),
//!     ntlm_response: ntlmauth::ntlmv2_response(
//!         &challenge_msg.target_name, "user", "SecREt01",
//!         &target_info, &challenge_msg.challenge, &client_nonce, &timestamp,
//!     ),
//!     target_name: challenge_msg.target_name.clone(),
//!     user_name: "user".to_owned(),
//!     host_name: "WORKSTATION".to_owned(),
//!     session_key: Vec::new(),
//!     flags: challenge_msg.flags,
//! });
//! let auth_token = auth_msg.to_bytes()
//!     .expect("failed to encode authenticate message");
//!
//! // server: check the proof
//! let verdict = config.respond(&auth_token, &challenge_value)
//!     .expect("failed to process authenticate token");
//! assert_eq!(verdict, ntlmauth::ServerResponse::Accepted);
//! ```


mod buffer;
mod crypto;
mod messages;
mod responses;
mod server;


use bitflags::bitflags;

pub use crate::buffer::{
    bytes_to_hex, copy_range, hex_to_bytes, pad_left, pad_right, HexError, RangeError,
};
pub use crate::crypto::{
    create_des_key, des_ecb_decrypt, des_ecb_encrypt, des_encrypt_block, hmac_md5, md4_digest,
    md5_digest, CryptoError, DES_BLOCK_LEN,
};
pub use crate::messages::{
    decode_target_info, encode_target_info, AuthenticateMessage, ChallengeMessage, Message,
    NegotiateMessage, OsVersion, ParsingError, SecurityBuffer, StoringError, TargetInfoEntry,
    TargetInfoType,
};
pub use crate::responses::{
    des_long_response, lm_hash, lm_response, lmv2_response, ntlm2_session_response, ntlm_hash,
    ntlm_response, ntlm_timestamp, ntlm_timestamp_now, ntlmv2_blob, ntlmv2_hash, ntlmv2_response,
    ntlmv2_response_hash, random_nonce,
};
pub use crate::server::{ServerConfig, ServerError, ServerResponse, SUPPORTED_FLAGS};


/// The magic value at the start of every NTLMSSP data packet.
const NTLMSSP_MAGIC: [u8; 8] = *b"NTLMSSP\0";


/// Standard NTLM credentials, consisting of username, password and domain.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Credentials {
    /// The username part of the credentials.
    pub username: String,

    /// The password part of the credentials.
    pub password: String,

    /// The domain part of the credentials.
    ///
    /// Often specified in combination with the username as `<DOMAIN>\<USERNAME>`. In credentials
    /// without a domain, the domain is an empty string.
    pub domain: String,
}


bitflags! {
    /// NTLM operation flags.
    #[derive(Clone, Copy, Debug, Default, Hash, Eq, Ord, PartialEq, PartialOrd)]
    pub struct Flags: u32 {
        const NEGOTIATE_UNICODE = 0x0000_0001;
        const NEGOTIATE_OEM = 0x0000_0002;
        const REQUEST_TARGET = 0x0000_0004;
        const UNKNOWN_8 = 0x0000_0008;
        const NEGOTIATE_SIGN = 0x0000_0010;
        const NEGOTIATE_SEAL = 0x0000_0020;
        const NEGOTIATE_DATAGRAM = 0x0000_0040;
        const NEGOTIATE_LANMAN_KEY = 0x0000_0080;
        const NEGOTIATE_NETWARE = 0x0000_0100;
        const NEGOTIATE_NTLM = 0x0000_0200;
        const UNKNOWN_400 = 0x0000_0400;
        const NEGOTIATE_ANONYMOUS = 0x0000_0800;
        const NEGOTIATE_DOMAIN_SUPPLIED = 0x0000_1000;
        const NEGOTIATE_WORKSTATION_SUPPLIED = 0x0000_2000;
        const NEGOTIATE_LOCAL_CALL = 0x0000_4000;
        const NEGOTIATE_ALWAYS_SIGN = 0x0000_8000;
        const TARGET_TYPE_DOMAIN = 0x0001_0000;
        const TARGET_TYPE_SERVER = 0x0002_0000;
        const TARGET_TYPE_SHARE = 0x0004_0000;
        const NEGOTIATE_NTLM2_KEY = 0x0008_0000;
        const REQUEST_INIT_RESPONSE = 0x0010_0000;
        const REQUEST_ACCEPT_RESPONSE = 0x0020_0000;
        const REQUEST_NON_NT_SESSION_KEY = 0x0040_0000;
        const NEGOTIATE_TARGET_INFO = 0x0080_0000;
        const UNKNOWN_1000000 = 0x0100_0000;
        const NEGOTIATE_VERSION = 0x0200_0000;
        const UNKNOWN_4000000 = 0x0400_0000;
        const UNKNOWN_8000000 = 0x0800_0000;
        const UNKNOWN_10000000 = 0x1000_0000;
        const NEGOTIATE_128BIT = 0x2000_0000;
        const NEGOTIATE_KEY_EXCHANGE = 0x4000_0000;
        const NEGOTIATE_56BIT = 0x8000_0000;
    }
}
