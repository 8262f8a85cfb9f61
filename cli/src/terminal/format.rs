//! Output rendering.
//!
//! Plain output is one `dns_host_name` per discovered site DC, suitable
//! for piping. The block format is a small hand-rolled nested structure
//! (site, site_dcs, optional global_dcs), optionally wrapped in a named
//! outer element so the output can be dropped into a larger document.

use dcfind_common::model::{DcInfo, DiscoveryResult};

pub fn print_plain(result: &DiscoveryResult) {
    for dc in &result.site_dcs {
        if let Some(host) = &dc.dns_host_name {
            println!("{host}");
        }
    }
}

pub fn print_block(result: &DiscoveryResult, wrapper: Option<&str>) {
    print!("{}", render_block(result, wrapper));
}

pub fn render_block(result: &DiscoveryResult, wrapper: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(wrapper) = wrapper {
        out.push_str(&format!("{{ {wrapper}:\n"));
    }

    out.push_str(&format!("{{ site: '{}',\n", result.site));
    push_dc_list(&mut out, "site_dcs", &result.site_dcs);
    if let Some(global_dcs) = &result.global_dcs {
        push_dc_list(&mut out, "global_dcs", global_dcs);
    }
    out.push_str("}\n");

    if wrapper.is_some() {
        out.push_str("}\n");
    }
    out
}

fn push_dc_list(out: &mut String, label: &str, dcs: &[DcInfo]) {
    out.push_str(&format!("  {label}: [\n"));
    for dc in dcs {
        let host = dc.dns_host_name.as_deref().unwrap_or("");
        out.push_str(&format!("    '{host}',\n"));
    }
    out.push_str("  ],\n");
}
