//! Endpoint and server-application descriptors, as reported by discovery.
//!
//! Read-only inputs: consumed to build the optional endpoint fragment that
//! the assembler attaches under a caller-supplied entry subject.

use serde::{Deserialize, Serialize};

use super::node::LocalizedText;

/// What kind of application sits behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationType {
    Server,
    Client,
    ClientAndServer,
    DiscoveryServer,
}

impl ApplicationType {
    pub fn name(&self) -> &'static str {
        match self {
            ApplicationType::Server => "Server",
            ApplicationType::Client => "Client",
            ApplicationType::ClientAndServer => "ClientAndServer",
            ApplicationType::DiscoveryServer => "DiscoveryServer",
        }
    }
}

/// Message-level security applied on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    Invalid,
    None,
    Sign,
    SignAndEncrypt,
}

impl MessageSecurityMode {
    pub fn name(&self) -> &'static str {
        match self {
            MessageSecurityMode::Invalid => "Invalid",
            MessageSecurityMode::None => "None",
            MessageSecurityMode::Sign => "Sign",
            MessageSecurityMode::SignAndEncrypt => "SignAndEncrypt",
        }
    }
}

/// How a user authenticates under a token policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserTokenType {
    Anonymous,
    UserName,
    Certificate,
    IssuedToken,
}

impl UserTokenType {
    pub fn name(&self) -> &'static str {
        match self {
            UserTokenType::Anonymous => "Anonymous",
            UserTokenType::UserName => "UserName",
            UserTokenType::Certificate => "Certificate",
            UserTokenType::IssuedToken => "IssuedToken",
        }
    }
}

/// One user-identity-token policy offered by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokenPolicy {
    pub policy_id: String,
    pub token_type: UserTokenType,
    pub issued_token_type: Option<String>,
    pub issuer_endpoint_url: Option<String>,
    pub security_policy_uri: Option<String>,
}

impl UserTokenPolicy {
    pub fn anonymous(policy_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            token_type: UserTokenType::Anonymous,
            issued_token_type: None,
            issuer_endpoint_url: None,
            security_policy_uri: None,
        }
    }
}

/// Application metadata of the server behind an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDescriptor {
    pub application_uri: String,
    pub product_uri: String,
    pub application_name: LocalizedText,
    pub application_type: ApplicationType,
    pub gateway_server_uri: Option<String>,
    pub discovery_profile_uri: Option<String>,
    pub discovery_urls: Vec<String>,
}

/// One reachable endpoint with its transport and security parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub endpoint_url: String,
    pub server: ApplicationDescriptor,
    pub server_certificate: Vec<u8>,
    pub security_mode: MessageSecurityMode,
    pub security_policy_uri: String,
    pub user_identity_tokens: Vec<UserTokenPolicy>,
    pub transport_profile_uri: String,
    pub security_level: u8,
}
