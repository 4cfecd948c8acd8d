use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Egress path of one identity. `Direct` carries the literal IP the
/// identity reports as; `Proxy` carries a `host:port` endpoint whose host is
/// reported instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EgressBinding {
    Direct { ip: String },
    Proxy { address: String },
}

impl EgressBinding {
    pub fn direct(ip: impl Into<String>) -> Self {
        EgressBinding::Direct { ip: ip.into() }
    }

    pub fn proxy(address: impl Into<String>) -> Self {
        EgressBinding::Proxy {
            address: address.into(),
        }
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self, EgressBinding::Proxy { .. })
    }

    /// Address sent as the `ip` parameter of an uptime report.
    pub fn reported_ip(&self) -> &str {
        match self {
            EgressBinding::Direct { ip } => ip.as_str(),
            EgressBinding::Proxy { address } => {
                let without_scheme = address
                    .split_once("://")
                    .map(|(_, rest)| rest)
                    .unwrap_or(address.as_str());
                let host_port = without_scheme
                    .rsplit_once('@')
                    .map(|(_, rest)| rest)
                    .unwrap_or(without_scheme);
                if let Some(bracketed) = host_port.strip_prefix('[') {
                    return bracketed.split(']').next().unwrap_or(bracketed);
                }
                host_port.split(':').next().unwrap_or(host_port)
            }
        }
    }

    pub fn proxy_url(&self) -> Option<String> {
        match self {
            EgressBinding::Direct { .. } => None,
            EgressBinding::Proxy { address } => {
                if address.contains("://") {
                    Some(address.clone())
                } else {
                    Some(format!("http://{}", address))
                }
            }
        }
    }
}

impl fmt::Display for EgressBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EgressBinding::Direct { ip } => write!(f, "direct:{}", ip),
            EgressBinding::Proxy { address } => write!(f, "proxy:{}", address),
        }
    }
}

/// Orchestrator-wide unique key of one (account, egress binding) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(email: &str, binding: &EgressBinding) -> Self {
        Self(format!("{}@{}", email, binding))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
