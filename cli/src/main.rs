mod args;
mod terminal;

use std::sync::Arc;

use anyhow::bail;
use args::{CommandLine, OutputFormat};
use dcfind_common::config::RaceConfig;
use dcfind_core::orchestrator::{Discovery, DiscoveryRequest};
use dcfind_core::resolver::DnsSrvResolver;
use dcfind_protocols::ldap::LdapTransport;
use terminal::{format, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();
    logging::init(commands.log_level());

    if commands.discover_site && commands.site.is_some() {
        bail!("do not specify a site if it is to be discovered");
    }
    if commands.domain.is_none() && commands.server.is_none() {
        bail!("please provide either a domain or a DC name");
    }

    let client = resolve_client_name(&commands.client)?;
    let client_fqdn = resolve_client_name(&commands.client_fqdn)?
        .map(|host| qualify_fqdn(host, commands.domain.as_deref()));

    let race = RaceConfig {
        eager: commands.eager,
        ..RaceConfig::default()
    };
    let resolver = Arc::new(DnsSrvResolver::from_system_conf()?);
    let transport = Arc::new(LdapTransport::new(race.connect_timeout));
    let discovery = Discovery::new(resolver, transport, race);

    let request = DiscoveryRequest {
        domain: commands.domain.clone(),
        site: commands.site.clone(),
        server: commands.server.clone(),
        client,
        client_fqdn,
        site_only: commands.discover_site,
    };
    let result = discovery.run(request).await?;

    if commands.discover_site {
        println!("{}", result.site);
        return Ok(());
    }

    match (commands.format, &commands.wrapper) {
        (OutputFormat::Plain, None) => format::print_plain(&result),
        _ => format::print_block(&result, commands.wrapper.as_deref()),
    }

    Ok(())
}

/// `-C`/`-F` accept an optional value; given bare, the local hostname
/// stands in.
fn resolve_client_name(arg: &Option<Option<String>>) -> anyhow::Result<Option<String>> {
    match arg {
        None => Ok(None),
        Some(Some(name)) => Ok(Some(name.clone())),
        Some(None) => {
            let hostname = sys_info::hostname()
                .map_err(|err| anyhow::anyhow!("cannot determine local hostname: {err}"))?;
            Ok(Some(hostname))
        }
    }
}

/// Qualify a bare hostname with the queried domain. Names that already
/// carry a dot are passed through untouched.
fn qualify_fqdn(host: String, domain: Option<&str>) -> String {
    if host.contains('.') {
        return host;
    }
    match domain {
        Some(domain) => format!("{host}.{domain}"),
        None => host,
    }
}
