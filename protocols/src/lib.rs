pub mod ldap;
pub mod netlogon;
