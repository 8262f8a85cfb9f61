//! # Netlogon Ping Codec
//!
//! Builds the LDAP search filter for an anonymous Netlogon ping and
//! decodes the binary `netlogon` attribute value a domain controller
//! answers with (MS-ADTS "LDAP ping", response type
//! `LOGON_SAM_LOGON_RESPONSE_EX`).
//!
//! The response payload is laid out like a DNS message: the embedded
//! names use DNS-style compression pointers into the same buffer, so the
//! eight name fields are decoded by threading an explicit
//! `(buffer, offset) -> (name, next_offset)` cursor through
//! [`read_compressed_name`]. Decoding is deterministic on the bytes and
//! either yields a complete [`DcInfo`] or an error.

use dcfind_common::model::DcInfo;
use hickory_proto::rr::Name;
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder};
use ldap3::ldap_escape;
use thiserror::Error;

/// NETLOGON_NT_VERSION query flags (request bitmask).
pub const NETLOGON_NT_VERSION_5: u32 = 0x0000_0002;
pub const NETLOGON_NT_VERSION_5EX: u32 = 0x0000_0004;

/// The only response opcode this decoder accepts.
pub const LOGON_SAM_LOGON_RESPONSE_EX: u16 = 23;

/// DS_* capability bits in the response flags field.
pub const DS_LDAP_FLAG: u32 = 0x0000_0008;
pub const DS_DS_FLAG: u32 = 0x0000_0010;
pub const DS_KDC_FLAG: u32 = 0x0000_0020;
pub const DS_CLOSEST_FLAG: u32 = 0x0000_0080;
pub const DS_WRITABLE_FLAG: u32 = 0x0000_0100;

const FLAG_TABLE: &[(u32, &str)] = &[
    (DS_LDAP_FLAG, "ldap"),
    (DS_DS_FLAG, "ds"),
    (DS_KDC_FLAG, "kdc"),
    (DS_CLOSEST_FLAG, "closest"),
    (DS_WRITABLE_FLAG, "writable"),
];

/// Offset of the first compressed name in the response payload, past
/// opcode (2), Sbz (2), flags (4) and DomainGuid (16).
const NAMES_OFFSET: usize = 24;

#[derive(Debug, Error)]
pub enum NetlogonError {
    #[error("unexpected netlogon opcode {0}")]
    Opcode(u16),
    #[error("netlogon response truncated at {len} bytes")]
    Truncated { len: usize },
    #[error("malformed compressed name at offset {at}: {reason}")]
    Name { at: usize, reason: String },
}

/// Build the search filter for a Netlogon ping, requesting the extended
/// response. Clauses for absent values are omitted; present values pass
/// through [`ldap_escape`] so filter metacharacters in a hostile domain
/// or hostname never reach the filter grammar.
pub fn build_ping_filter(
    domain: Option<&str>,
    client: Option<&str>,
    client_fqdn: Option<&str>,
) -> String {
    let ntver = NETLOGON_NT_VERSION_5 | NETLOGON_NT_VERSION_5EX;
    // The DWORD goes into the filter as escaped little-endian bytes,
    // e.g. 0x6 -> \06\00\00\00.
    let ntver_hex: String = ntver
        .to_le_bytes()
        .iter()
        .map(|byte| format!("\\{byte:02x}"))
        .collect();

    let mut filter = format!("(&(ntver={ntver_hex})");
    if let Some(domain) = domain {
        filter.push_str(&format!("(dnsdomain={})", ldap_escape(domain)));
    }
    if let Some(client) = client {
        filter.push_str(&format!("(host={})", ldap_escape(client)));
    }
    if let Some(client_fqdn) = client_fqdn {
        filter.push_str(&format!("(dnshostname={})", ldap_escape(client_fqdn)));
    }
    filter.push(')');
    filter
}

/// Human-readable names of the capability bits set in `flags`, for
/// logging and the structured output.
pub fn flag_names(flags: u32) -> Vec<&'static str> {
    FLAG_TABLE
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// Decode one compressed name out of `buf` starting at `pos`.
///
/// Returns the decoded name and the position just past the bytes it
/// consumed, so the caller can chain the next field. The single-component
/// absolute root name means "no value" on the wire and decodes to `None`
/// rather than a literal `.`.
pub fn read_compressed_name(
    buf: &[u8],
    pos: usize,
) -> Result<(Option<String>, usize), NetlogonError> {
    let mut decoder = BinDecoder::new(buf);
    decoder
        .read_slice(pos)
        .map_err(|_| NetlogonError::Truncated { len: buf.len() })?;

    let name = Name::read(&mut decoder).map_err(|err| NetlogonError::Name {
        at: pos,
        reason: err.to_string(),
    })?;
    let next = decoder.index();

    if name.is_root() {
        return Ok((None, next));
    }

    let mut text = name.to_utf8();
    if text.ends_with('.') {
        text.pop();
    }
    Ok((Some(text), next))
}

/// Parse a `LOGON_SAM_LOGON_RESPONSE_EX` payload into a [`DcInfo`].
///
/// Any other opcode, or a buffer too short or corrupt for the fixed
/// eight-name sequence, is an error scoped to this one response.
pub fn parse_response(buf: &[u8]) -> Result<DcInfo, NetlogonError> {
    if buf.len() < NAMES_OFFSET {
        return Err(NetlogonError::Truncated { len: buf.len() });
    }

    let opcode = u16::from_le_bytes([buf[0], buf[1]]);
    if opcode != LOGON_SAM_LOGON_RESPONSE_EX {
        return Err(NetlogonError::Opcode(opcode));
    }

    // buf[2..4] is the Sbz pad, buf[8..24] the DomainGuid; both ignored.
    let flags = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

    let pos = NAMES_OFFSET;
    let (dns_forest_name, pos) = read_compressed_name(buf, pos)?;
    let (dns_domain_name, pos) = read_compressed_name(buf, pos)?;
    let (dns_host_name, pos) = read_compressed_name(buf, pos)?;
    let (netbios_domain_name, pos) = read_compressed_name(buf, pos)?;
    let (netbios_computer_name, pos) = read_compressed_name(buf, pos)?;
    // User name slot; present on the wire but of no use here.
    let (_, pos) = read_compressed_name(buf, pos)?;
    let (dc_site_name, pos) = read_compressed_name(buf, pos)?;
    let (client_site_name, _) = read_compressed_name(buf, pos)?;

    Ok(DcInfo {
        flags,
        dns_forest_name,
        dns_domain_name,
        dns_host_name,
        netbios_domain_name,
        netbios_computer_name,
        dc_site_name,
        client_site_name,
    })
}
