//! The server half of an authentication exchange: answering a client's Negotiate message
//! with a Challenge and validating the final Authenticate message against configured
//! credentials.
//!
//! The functions here are purely computational; transporting tokens, tracking which client
//! is in which exchange and remembering successful logons belong to the calling layer.


use std::fmt;

use tracing::debug;

use crate::{Credentials, Flags};
use crate::messages::{
    AuthenticateMessage, ChallengeMessage, Message, NegotiateMessage, ParsingError,
    StoringError, TargetInfoEntry, TargetInfoType,
};
use crate::responses::{ntlm_response, ntlmv2_response_hash};


/// The flag set the server is able to honor.
///
/// Flags offered by the client outside this set are dropped from the exchange.
pub const SUPPORTED_FLAGS: Flags = Flags::NEGOTIATE_UNICODE
    .union(Flags::REQUEST_TARGET)
    .union(Flags::NEGOTIATE_NTLM)
    .union(Flags::NEGOTIATE_ALWAYS_SIGN)
    .union(Flags::TARGET_TYPE_DOMAIN)
    .union(Flags::NEGOTIATE_TARGET_INFO);


/// An error that may occur while the server processes a received token.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ServerError {
    /// The received token could not be parsed.
    Parsing(ParsingError),

    /// The outgoing Challenge message could not be encoded.
    Storing(StoringError),
}
impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing(e)
                => write!(f, "failed to parse received token: {}", e),
            Self::Storing(e)
                => write!(f, "failed to encode challenge message: {}", e),
        }
    }
}
impl std::error::Error for ServerError {
}
impl From<ParsingError> for ServerError {
    fn from(e: ParsingError) -> Self { Self::Parsing(e) }
}
impl From<StoringError> for ServerError {
    fn from(e: StoringError) -> Self { Self::Storing(e) }
}


/// The server's reaction to a received token.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ServerResponse {
    /// The exchange continues; this Challenge token is to be sent back to the client.
    Challenge(Vec<u8>),

    /// The client has proven knowledge of the credentials.
    Accepted,

    /// The client's proof is missing or wrong; the caller may reject or challenge again.
    Denied,
}


/// Configuration of the server side of an authentication exchange.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ServerConfig {
    /// The credentials a client must prove knowledge of.
    pub credentials: Credentials,

    /// The server's own NetBIOS name, advertised in the Challenge's TargetInfo.
    pub server_name: String,

    /// The DNS domain name advertised in the Challenge's TargetInfo.
    pub dns_domain_name: String,

    /// The server's fully qualified DNS name, advertised in the Challenge's TargetInfo.
    pub dns_server_name: String,
}
impl ServerConfig {
    /// Processes a received token and produces the server's reaction.
    ///
    /// `challenge` is the 8-byte challenge value of the current exchange. The caller must
    /// supply the same value when processing the Negotiate and the Authenticate token of one
    /// exchange; whether it is freshly random per exchange or fixed is the caller's policy.
    pub fn respond(&self, token: &[u8], challenge: &[u8; 8]) -> Result<ServerResponse, ServerError> {
        let message = Message::try_from(token)?;
        match message {
            Message::Negotiate(nego) => {
                debug!(host = %nego.host, offered = ?nego.flags, "received negotiate token");
                let challenge_msg = self.build_challenge(&nego, challenge);
                let bytes = challenge_msg.to_bytes()?;
                Ok(ServerResponse::Challenge(bytes))
            },
            Message::Challenge(_) => {
                debug!("received a challenge token from a client");
                Ok(ServerResponse::Denied)
            },
            Message::Authenticate(auth) => {
                debug!(user_name = %auth.user_name, host = %auth.host_name, "received authenticate token");
                if self.validate(&auth, challenge) {
                    Ok(ServerResponse::Accepted)
                } else {
                    Ok(ServerResponse::Denied)
                }
            },
        }
    }

    /// Builds the Challenge message answering the given Negotiate message.
    ///
    /// The returned flags are the intersection of the client's offer and [`SUPPORTED_FLAGS`];
    /// the TargetInfo block carries the configured domain and server names.
    pub fn build_challenge(&self, negotiate: &NegotiateMessage, challenge: &[u8; 8]) -> ChallengeMessage {
        let flags = negotiate.flags & SUPPORTED_FLAGS;
        debug!(offered = ?negotiate.flags, accepted = ?flags, "negotiated flags");

        let target_info = vec![
            TargetInfoEntry::from_string(TargetInfoType::DomainName, &self.credentials.domain),
            TargetInfoEntry::from_string(TargetInfoType::ServerName, &self.server_name),
            TargetInfoEntry::from_string(TargetInfoType::DnsDomainName, &self.dns_domain_name),
            TargetInfoEntry::from_string(TargetInfoType::FullyQualifiedDomainName, &self.dns_server_name),
            TargetInfoEntry { entry_type: TargetInfoType::Terminator, content: Vec::new() },
        ];

        ChallengeMessage {
            target_name: self.credentials.domain.clone(),
            flags,
            challenge: *challenge,
            context: [0; 8],
            target_info,
        }
    }

    /// Checks an Authenticate message against the configured credentials and the exchange's
    /// challenge value.
    ///
    /// The username comparison ignores case. The NTLM response decides the verdict: a 24-byte
    /// value is compared against the recomputed classic NTLM response, a longer value is split
    /// into HMAC and blob and the HMAC is recomputed over the received blob using the message's
    /// target name and the configured username. The LM response field is not inspected; it
    /// carries no proof the NTLM response does not.
    pub fn validate(&self, authenticate: &AuthenticateMessage, challenge: &[u8; 8]) -> bool {
        if authenticate.user_name.to_uppercase() != self.credentials.username.to_uppercase() {
            debug!(user_name = %authenticate.user_name, "rejecting unknown user");
            return false;
        }

        let received = &authenticate.ntlm_response;
        if received.len() == 24 {
            let expected = ntlm_response(&self.credentials.password, challenge);
            let matched = received.as_slice() == expected;
            if !matched {
                debug!("classic response does not match");
            }
            matched
        } else if received.len() >= 16 {
            let (received_hash, blob) = received.split_at(16);
            let expected_hash = ntlmv2_response_hash(
                &authenticate.target_name,
                &self.credentials.username,
                &self.credentials.password,
                blob,
                challenge,
            );
            let matched = received_hash == expected_hash;
            if !matched {
                debug!("v2 response does not match");
            }
            matched
        } else {
            debug!(obtained_len = received.len(), "NTLM response too short to check");
            false
        }
    }
}
