use tlsprobe_application::ports::HandshakeInfo;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::FromDer;

/// Pulls the fields this service cares about off a leaf certificate's DER
/// bytes. `rustls` only ever exposes the raw chain, so parsing is on us.
pub fn parse_leaf(der: &[u8]) -> Result<HandshakeInfo, String> {
    let (_, cert) = x509_parser::certificate::X509Certificate::from_der(der)
        .map_err(|e| e.to_string())?;

    let not_before = cert.validity().not_before.timestamp();
    let not_after = cert.validity().not_after.timestamp();

    let dns_names = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|san| {
            san.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(HandshakeInfo {
        dns_names,
        not_before,
        not_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_self_signed_certificate() {
        let rcgen_cert = rcgen::generate_simple_self_signed(vec!["probe.example.com".to_string()])
            .expect("rcgen cert");
        let der: &[u8] = rcgen_cert.cert.der();
        let info = parse_leaf(der).expect("parse leaf");
        assert!(info.not_after > info.not_before);
        assert!(info.dns_names.contains(&"probe.example.com".to_string()));
    }
}
