//! In-process stand-ins for DNS and LDAP, plus a Netlogon payload
//! builder, shared by the discovery scenarios.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dcfind_common::model::ServiceRecord;
use dcfind_core::resolver::{ResolutionError, SrvResolver};
use dcfind_protocols::ldap::{NetlogonTransport, TransportFault};
use dcfind_protocols::netlogon::LOGON_SAM_LOGON_RESPONSE_EX;
use tokio::net::TcpListener;

fn wire_name(name: &str) -> Vec<u8> {
    let mut encoded = Vec::new();
    for label in name.split('.') {
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

/// A well-formed extended SAM logon response for a DC named `host`
/// whose client site is `site`.
pub fn netlogon_response(host: &str, domain: &str, site: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&LOGON_SAM_LOGON_RESPONSE_EX.to_le_bytes());
    buf.extend_from_slice(&[0, 0]); // Sbz
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags
    buf.extend_from_slice(&[0u8; 16]); // DomainGuid
    buf.extend_from_slice(&wire_name(domain)); // forest
    buf.extend_from_slice(&wire_name(domain)); // domain
    buf.extend_from_slice(&wire_name(host));
    buf.extend_from_slice(&[0, 0, 0]); // netbios pair, user
    buf.extend_from_slice(&wire_name(site)); // dc site
    buf.extend_from_slice(&wire_name(site)); // client site
    buf
}

/// SRV answers keyed by the exact queried name; anything else resolves
/// to zero records, like a site with no advertised DCs.
pub struct StaticResolver {
    answers: HashMap<String, Vec<ServiceRecord>>,
    queried: Mutex<Vec<String>>,
}

impl StaticResolver {
    pub fn new(answers: HashMap<String, Vec<ServiceRecord>>) -> Self {
        Self {
            answers,
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl SrvResolver for StaticResolver {
    async fn resolve_srv(&self, name: &str) -> Result<Vec<ServiceRecord>, ResolutionError> {
        self.queried.lock().unwrap().push(name.to_string());
        Ok(self.answers.get(name).cloned().unwrap_or_default())
    }
}

pub enum Reply {
    Payload(Vec<u8>),
    Fault,
}

/// Transport answering by `server:port`, recording every ping and the
/// filter it carried.
pub struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    pinged: Mutex<Vec<String>>,
    filters: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: HashMap<String, Reply>) -> Self {
        Self {
            replies,
            pinged: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
        }
    }

    pub fn pinged(&self) -> Vec<String> {
        self.pinged.lock().unwrap().clone()
    }

    /// Filters in ping order, parallel to `pinged`.
    pub fn filters(&self) -> Vec<String> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetlogonTransport for ScriptedTransport {
    async fn netlogon_search(
        &self,
        server: &str,
        port: u16,
        filter: &str,
    ) -> Result<Option<Vec<u8>>, TransportFault> {
        let key = format!("{server}:{port}");
        self.pinged.lock().unwrap().push(key.clone());
        self.filters.lock().unwrap().push(filter.to_string());
        match self.replies.get(&key) {
            Some(Reply::Payload(bytes)) => Ok(Some(bytes.clone())),
            Some(Reply::Fault) => Err(TransportFault::Connect("connection refused".into())),
            None => Ok(None),
        }
    }
}

/// A listening loopback socket the racing dispatcher can connect to.
/// The listener must stay alive for the duration of the scenario.
pub async fn loopback_listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}
