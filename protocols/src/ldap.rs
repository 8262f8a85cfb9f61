//! LDAP transport behind the Netlogon ping.
//!
//! The dispatcher and orchestrator only ever see [`NetlogonTransport`];
//! the production implementation drives `ldap3`, tests substitute
//! scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use thiserror::Error;
use tracing::debug;

/// Attribute carrying the binary ping response.
pub const NETLOGON_ATTR: &str = "netlogon";

/// Connection-level failure, scoped to one candidate.
#[derive(Debug, Error)]
pub enum TransportFault {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("search failed: {0}")]
    Search(String),
}

/// One anonymous base-scope search for the `netlogon` attribute.
///
/// `Ok(None)` means the server answered but returned no such attribute;
/// the caller decides what that means. Implementations perform exactly
/// one request/response exchange and hold no state across calls.
#[async_trait]
pub trait NetlogonTransport: Send + Sync {
    async fn netlogon_search(
        &self,
        server: &str,
        port: u16,
        filter: &str,
    ) -> Result<Option<Vec<u8>>, TransportFault>;
}

/// `ldap3`-backed transport.
///
/// Each ping opens its own unauthenticated session against the rootDSE,
/// runs the search and unbinds; the Netlogon ping is defined for
/// anonymous access, so no bind is issued.
pub struct LdapTransport {
    conn_timeout: Duration,
}

impl LdapTransport {
    pub fn new(conn_timeout: Duration) -> Self {
        Self { conn_timeout }
    }
}

#[async_trait]
impl NetlogonTransport for LdapTransport {
    async fn netlogon_search(
        &self,
        server: &str,
        port: u16,
        filter: &str,
    ) -> Result<Option<Vec<u8>>, TransportFault> {
        let url = format!("ldap://{server}:{port}");
        debug!(%url, "opening ldap session");

        let settings = LdapConnSettings::new().set_conn_timeout(self.conn_timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|err| TransportFault::Connect(err.to_string()))?;
        ldap3::drive!(conn);

        let result = ldap
            .search("", Scope::Base, filter, vec![NETLOGON_ATTR])
            .await
            .map_err(|err| TransportFault::Search(err.to_string()))?
            .success()
            .map_err(|err| TransportFault::Search(err.to_string()))?;
        let _ = ldap.unbind().await;

        let (entries, _) = result;
        for entry in entries {
            let entry = SearchEntry::construct(entry);
            if let Some(value) = entry
                .bin_attrs
                .get(NETLOGON_ATTR)
                .and_then(|values| values.first())
            {
                return Ok(Some(value.clone()));
            }
            // ldap3 routes values that happen to be valid UTF-8 into the
            // string map instead.
            if let Some(value) = entry
                .attrs
                .get(NETLOGON_ATTR)
                .and_then(|values| values.first())
            {
                return Ok(Some(value.clone().into_bytes()));
            }
        }

        Ok(None)
    }
}
