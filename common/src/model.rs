//! # Discovery Value Types
//!
//! Plain data carried between the resolver, the racing dispatcher and the
//! orchestrator. None of these hold connection state; they are cheap to
//! clone and compare.

/// One `_ldap._tcp` SRV answer: a candidate domain controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRecord {
    /// Target hostname, without trailing dot.
    pub target: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
}

impl ServiceRecord {
    pub fn new(target: impl Into<String>, port: u16, priority: u16, weight: u16) -> Self {
        Self {
            target: target.into(),
            port,
            priority,
            weight,
        }
    }
}

/// Identity of a domain controller as reported by its Netlogon ping
/// response.
///
/// Name fields are `None` when the DC answered with the DNS root name for
/// that slot, which is how "no value" is encoded on the wire. A `DcInfo`
/// only ever exists for a fully decoded response; there is no partially
/// populated state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DcInfo {
    /// DS_* capability bits advertised by the DC.
    pub flags: u32,
    pub dns_forest_name: Option<String>,
    pub dns_domain_name: Option<String>,
    pub dns_host_name: Option<String>,
    pub netbios_domain_name: Option<String>,
    pub netbios_computer_name: Option<String>,
    pub dc_site_name: Option<String>,
    pub client_site_name: Option<String>,
}

/// Final output of a discovery run.
///
/// DC lists preserve the SRV priority/weight rank order of the servers
/// that produced each response, not response arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// The AD site that was given or discovered.
    pub site: String,
    /// DCs reachable for that site. May legitimately be empty.
    pub site_dcs: Vec<DcInfo>,
    /// Domain-wide DCs; only present when discovery had to race the
    /// unscoped SRV set (no explicit server was given).
    pub global_dcs: Option<Vec<DcInfo>>,
}
