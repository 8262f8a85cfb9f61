use thiserror::Error;

/// Fatal discovery failures.
///
/// Per-candidate trouble (refused connections, timeouts, bad payloads) is
/// absorbed and logged inside the racing round; only the conditions below
/// terminate a run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("please provide either a domain or a DC name")]
    MissingTarget,

    #[error("SRV lookup for {name} failed: {reason}")]
    Resolution { name: String, reason: String },

    #[error("ping of DC {server} failed: {reason}")]
    ServerPingFailed { server: String, reason: String },

    #[error("no working global DCs could be found in {domain}")]
    NoGlobalDcs { domain: String },

    #[error("DC {server} did not report a client site")]
    SiteUnknown { server: String },

    #[error("no domain given and the DC response did not name one")]
    DomainUnknown,
}
