//! End-to-end discovery scenarios with scripted DNS and LDAP.
//!
//! Racing still opens real loopback connections; only name resolution
//! and the ping exchange are in-process fakes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dcfind_common::config::RaceConfig;
use dcfind_common::error::DiscoveryError;
use dcfind_common::model::ServiceRecord;
use dcfind_core::orchestrator::{Discovery, DiscoveryRequest};

use crate::mock::{Reply, ScriptedTransport, StaticResolver, loopback_listener, netlogon_response};

const GLOBAL_SRV: &str = "_ldap._tcp.example.com";
const SITE_A_SRV: &str = "_ldap._tcp.SiteA._sites.dc._msdcs.example.com";

/// Serial batches keep candidate completion order deterministic.
fn race_config() -> RaceConfig {
    RaceConfig {
        batch_size: 1,
        connect_timeout: Duration::from_secs(1),
        attempt_timeout: Duration::from_secs(1),
        eager: false,
    }
}

fn request(domain: Option<&str>, site: Option<&str>, server: Option<&str>) -> DiscoveryRequest {
    DiscoveryRequest {
        domain: domain.map(str::to_string),
        site: site.map(str::to_string),
        server: server.map(str::to_string),
        client: None,
        client_fqdn: None,
        site_only: false,
    }
}

#[tokio::test]
async fn adopts_first_ranked_site_and_reraces_scoped_to_it() {
    let (_l1, p1) = loopback_listener().await;
    let (_l2, p2) = loopback_listener().await;

    let resolver = Arc::new(StaticResolver::new(HashMap::from([
        (
            GLOBAL_SRV.to_string(),
            vec![
                ServiceRecord::new("127.0.0.1", p1, 0, 100),
                ServiceRecord::new("127.0.0.1", p2, 10, 100),
            ],
        ),
        (
            SITE_A_SRV.to_string(),
            vec![ServiceRecord::new("127.0.0.1", p1, 0, 100)],
        ),
    ])));
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([
        (
            format!("127.0.0.1:{p1}"),
            Reply::Payload(netlogon_response("dc1.example.com", "example.com", "SiteA")),
        ),
        (
            format!("127.0.0.1:{p2}"),
            Reply::Payload(netlogon_response("dc2.example.com", "example.com", "SiteB")),
        ),
    ])));

    let discovery = Discovery::new(resolver.clone(), transport.clone(), race_config());
    let result = discovery
        .run(request(Some("example.com"), None, None))
        .await
        .unwrap();

    // dc1 outranks dc2, so its client site wins even though dc2 also
    // answered with a different one.
    assert_eq!(result.site, "SiteA");

    let global_hosts: Vec<_> = result
        .global_dcs
        .as_ref()
        .unwrap()
        .iter()
        .map(|dc| dc.dns_host_name.clone().unwrap())
        .collect();
    assert_eq!(global_hosts, vec!["dc1.example.com", "dc2.example.com"]);

    let site_hosts: Vec<_> = result
        .site_dcs
        .iter()
        .map(|dc| dc.dns_host_name.clone().unwrap())
        .collect();
    assert_eq!(site_hosts, vec!["dc1.example.com"]);

    // The second phase went through a freshly queried site-scoped name.
    assert_eq!(resolver.queried(), vec![GLOBAL_SRV, SITE_A_SRV]);
}

#[tokio::test]
async fn explicit_server_ping_failure_is_fatal_and_nothing_else_runs() {
    let resolver = Arc::new(StaticResolver::new(HashMap::new()));
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([(
        "dc9.example.com:389".to_string(),
        Reply::Fault,
    )])));

    let discovery = Discovery::new(resolver.clone(), transport.clone(), race_config());
    let err = discovery
        .run(request(Some("example.com"), None, Some("dc9.example.com")))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoveryError::ServerPingFailed { .. }));
    assert!(resolver.queried().is_empty());
    assert_eq!(transport.pinged(), vec!["dc9.example.com:389"]);
}

#[tokio::test]
async fn explicit_server_supplies_both_site_and_domain() {
    let (_l1, p1) = loopback_listener().await;

    let resolver = Arc::new(StaticResolver::new(HashMap::from([(
        SITE_A_SRV.to_string(),
        vec![ServiceRecord::new("127.0.0.1", p1, 0, 100)],
    )])));
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([
        (
            "dc1.example.com:389".to_string(),
            Reply::Payload(netlogon_response("dc1.example.com", "example.com", "SiteA")),
        ),
        (
            format!("127.0.0.1:{p1}"),
            Reply::Payload(netlogon_response("dc1.example.com", "example.com", "SiteA")),
        ),
    ])));

    let discovery = Discovery::new(resolver.clone(), transport.clone(), race_config());
    // Neither domain nor site given; both come out of the ping response.
    let result = discovery
        .run(request(None, None, Some("dc1.example.com")))
        .await
        .unwrap();

    assert_eq!(result.site, "SiteA");
    assert!(result.global_dcs.is_none());
    assert_eq!(result.site_dcs.len(), 1);
    assert_eq!(resolver.queried(), vec![SITE_A_SRV]);
}

#[tokio::test]
async fn discovered_domain_scopes_the_site_phase_filters() {
    let (_l1, p1) = loopback_listener().await;

    let resolver = Arc::new(StaticResolver::new(HashMap::from([(
        SITE_A_SRV.to_string(),
        vec![ServiceRecord::new("127.0.0.1", p1, 0, 100)],
    )])));
    let payload = netlogon_response("dc1.example.com", "example.com", "SiteA");
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([
        (
            "dc1.example.com:389".to_string(),
            Reply::Payload(payload.clone()),
        ),
        (format!("127.0.0.1:{p1}"), Reply::Payload(payload)),
    ])));

    let discovery = Discovery::new(resolver, transport.clone(), race_config());
    discovery
        .run(request(None, None, Some("dc1.example.com")))
        .await
        .unwrap();

    let filters = transport.filters();
    assert_eq!(filters.len(), 2);
    // The explicit-server ping goes out with no domain to name yet,
    // but the site-scoped ping carries the one it discovered.
    assert!(!filters[0].contains("(dnsdomain="));
    assert!(filters[1].contains("(dnsdomain=example.com)"));
}

#[tokio::test]
async fn discover_site_only_never_runs_the_second_race() {
    let (_l1, p1) = loopback_listener().await;

    let resolver = Arc::new(StaticResolver::new(HashMap::from([(
        GLOBAL_SRV.to_string(),
        vec![ServiceRecord::new("127.0.0.1", p1, 0, 100)],
    )])));
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([(
        format!("127.0.0.1:{p1}"),
        Reply::Payload(netlogon_response("dc1.example.com", "example.com", "SiteA")),
    )])));

    let discovery = Discovery::new(resolver.clone(), transport.clone(), race_config());
    let mut req = request(Some("example.com"), None, None);
    req.site_only = true;
    let result = discovery.run(req).await.unwrap();

    assert_eq!(result.site, "SiteA");
    assert!(result.site_dcs.is_empty());
    assert_eq!(resolver.queried(), vec![GLOBAL_SRV]);
}

#[tokio::test]
async fn zero_global_dcs_is_fatal() {
    let resolver = Arc::new(StaticResolver::new(HashMap::new()));
    let transport = Arc::new(ScriptedTransport::new(HashMap::new()));

    let discovery = Discovery::new(resolver, transport, race_config());
    let err = discovery
        .run(request(Some("example.com"), None, None))
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoveryError::NoGlobalDcs { .. }));
}

#[tokio::test]
async fn site_with_no_reachable_dcs_is_still_a_success() {
    let transport = Arc::new(ScriptedTransport::new(HashMap::from([(
        "dc1.example.com:389".to_string(),
        Reply::Payload(netlogon_response("dc1.example.com", "example.com", "SiteA")),
    )])));
    // The site-scoped SRV name resolves to nothing at all.
    let resolver = Arc::new(StaticResolver::new(HashMap::new()));

    let discovery = Discovery::new(resolver, transport, race_config());
    let result = discovery
        .run(request(Some("example.com"), None, Some("dc1.example.com")))
        .await
        .unwrap();

    assert_eq!(result.site, "SiteA");
    assert!(result.site_dcs.is_empty());
    assert!(result.global_dcs.is_none());
}

#[tokio::test]
async fn missing_domain_and_server_is_rejected() {
    let resolver = Arc::new(StaticResolver::new(HashMap::new()));
    let transport = Arc::new(ScriptedTransport::new(HashMap::new()));

    let discovery = Discovery::new(resolver, transport, race_config());
    let err = discovery.run(request(None, None, None)).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::MissingTarget));
}
