//! # Discovery Orchestration
//!
//! Two-phase state machine on top of the racing dispatcher: first learn
//! the domain and site (from an explicit server or from a domain-wide
//! race), then race the site-scoped SRV set for that site's DCs.

use dcfind_common::config::RaceConfig;
use dcfind_common::error::DiscoveryError;
use dcfind_common::model::{DcInfo, DiscoveryResult, ServiceRecord};
use dcfind_protocols::ldap::NetlogonTransport;
use std::sync::Arc;
use tracing::{info, warn};

use crate::prober::{self, PingContext, ProbeOutcome};
use crate::racing;
use crate::ranker;
use crate::resolver::SrvResolver;

const LDAP_PORT: u16 = 389;

/// What the caller wants discovered.
#[derive(Clone, Debug, Default)]
pub struct DiscoveryRequest {
    pub domain: Option<String>,
    /// Pin the site instead of discovering it.
    pub site: Option<String>,
    /// Ping exactly this DC instead of racing the domain-wide SRV set.
    /// Failure of that single ping is fatal.
    pub server: Option<String>,
    pub client: Option<String>,
    pub client_fqdn: Option<String>,
    /// Stop once the site name is known; skip the site-scoped race.
    pub site_only: bool,
}

pub struct Discovery {
    resolver: Arc<dyn SrvResolver>,
    transport: Arc<dyn NetlogonTransport>,
    race: RaceConfig,
}

/// SRV owner name for the LDAP service of `domain`, optionally scoped
/// to an AD site.
fn srv_name(domain: &str, site: Option<&str>) -> String {
    match site {
        Some(site) => format!("_ldap._tcp.{site}._sites.dc._msdcs.{domain}"),
        None => format!("_ldap._tcp.{domain}"),
    }
}

impl Discovery {
    pub fn new(
        resolver: Arc<dyn SrvResolver>,
        transport: Arc<dyn NetlogonTransport>,
        race: RaceConfig,
    ) -> Self {
        Self {
            resolver,
            transport,
            race,
        }
    }

    /// Run the full discovery state machine.
    pub async fn run(&self, request: DiscoveryRequest) -> Result<DiscoveryResult, DiscoveryError> {
        let mut context = PingContext {
            domain: request.domain.clone(),
            client: request.client.clone(),
            client_fqdn: request.client_fqdn.clone(),
        };

        let mut domain = request.domain.clone();
        let mut global_dcs = None;

        let site = if let Some(server) = &request.server {
            let info = self.ping_explicit_server(server, &context).await?;
            if domain.is_none() {
                domain = info.dns_domain_name.clone();
                if let Some(domain) = &domain {
                    info!(%domain, "discovered domain");
                }
            }
            match &request.site {
                Some(site) => site.clone(),
                None => info
                    .client_site_name
                    .clone()
                    .ok_or_else(|| DiscoveryError::SiteUnknown {
                        server: server.clone(),
                    })?,
            }
        } else {
            let domain_name = domain.clone().ok_or(DiscoveryError::MissingTarget)?;
            let dcs = self.race_srv(&domain_name, None, &context).await?;
            if dcs.is_empty() {
                return Err(DiscoveryError::NoGlobalDcs {
                    domain: domain_name,
                });
            }
            // Rank-order first responder names the client's site.
            let site = match &request.site {
                Some(site) => site.clone(),
                None => dcs[0].client_site_name.clone().ok_or_else(|| {
                    DiscoveryError::SiteUnknown {
                        server: dcs[0]
                            .dns_host_name
                            .clone()
                            .unwrap_or_else(|| domain_name.clone()),
                    }
                })?,
            };
            global_dcs = Some(dcs);
            site
        };

        if request.site.is_none() {
            info!(%site, "discovered site");
        }

        if request.site_only {
            return Ok(DiscoveryResult {
                site,
                site_dcs: Vec::new(),
                global_dcs,
            });
        }

        let domain = domain.ok_or(DiscoveryError::DomainUnknown)?;
        // A domain learned in the first phase scopes the second-phase
        // ping filters too, not just the SRV owner name.
        context.domain = Some(domain.clone());
        let site_dcs = self.race_srv(&domain, Some(&site), &context).await?;
        if site_dcs.is_empty() {
            warn!(%site, "no working site DCs could be found");
        }

        Ok(DiscoveryResult {
            site,
            site_dcs,
            global_dcs,
        })
    }

    async fn ping_explicit_server(
        &self,
        server: &str,
        context: &PingContext,
    ) -> Result<DcInfo, DiscoveryError> {
        let candidate = ServiceRecord::new(server, LDAP_PORT, 0, 0);
        match prober::probe(
            &candidate,
            context,
            self.transport.as_ref(),
            self.race.attempt_timeout,
        )
        .await
        {
            ProbeOutcome::Success(info) => Ok(info),
            outcome => Err(DiscoveryError::ServerPingFailed {
                server: server.to_string(),
                reason: outcome.to_string(),
            }),
        }
    }

    async fn race_srv(
        &self,
        domain: &str,
        site: Option<&str>,
        context: &PingContext,
    ) -> Result<Vec<DcInfo>, DiscoveryError> {
        let name = srv_name(domain, site);
        let records =
            self.resolver
                .resolve_srv(&name)
                .await
                .map_err(|err| DiscoveryError::Resolution {
                    name: err.name,
                    reason: err.reason,
                })?;
        let ranked = ranker::rank(records);
        Ok(racing::race(&ranked, context, self.transport.as_ref(), &self.race).await)
    }
}
