use crate::errors::ProbeError;

/// Whether a failed TCP dial is worth retrying.
///
/// Preserved literally from the source implementation this crate was
/// modeled on, which required *both* substrings to be present before
/// retrying a dial error. That almost certainly should have been an OR —
/// a plain refused connection never times out too — but the original
/// author's intent can't be recovered from the code alone.
///
/// TODO: confirm with upstream whether this should be `||` instead of `&&`.
pub fn should_continue_retrying_tcp(err: &ProbeError) -> bool {
    let msg = err.message();
    msg.contains("timeout") && msg.contains("Connection refused")
}

/// Whether a dial error means the endpoint simply isn't there — no point
/// recording it as a checked-but-failing TLS checker.
pub fn is_unconnected(err: &ProbeError) -> bool {
    let msg = err.message();
    msg.contains("timeout") || msg.contains("connection reset")
}

/// Whether a port that failed its *first* TLS attempt should still be
/// tracked as a TLS checker going forward, or written off as "not TLS at
/// all" after a single probe. `None` means the handshake succeeded.
pub fn should_keep_checking_tls(err: Option<&ProbeError>) -> bool {
    match err {
        None => true,
        Some(ProbeError::Eof) => false,
        Some(err) => {
            let msg = err.message();
            !msg.contains("first record does not look like a TLS handshake")
                && !msg.contains("context deadline exceeded")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_requires_both_substrings() {
        let timeout_only = ProbeError::Dial("dial tcp: i/o timeout".into());
        let refused_only = ProbeError::Dial("Connection refused".into());
        let both = ProbeError::Dial("dial tcp: timeout, Connection refused by peer".into());
        assert!(!should_continue_retrying_tcp(&timeout_only));
        assert!(!should_continue_retrying_tcp(&refused_only));
        assert!(should_continue_retrying_tcp(&both));
    }

    #[test]
    fn unconnected_is_either_substring() {
        assert!(is_unconnected(&ProbeError::Dial("i/o timeout".into())));
        assert!(is_unconnected(&ProbeError::Dial(
            "connection reset by peer".into()
        )));
        assert!(!is_unconnected(&ProbeError::Dial("Connection refused".into())));
    }

    #[test]
    fn keep_checking_tls_drops_eof_and_non_tls_peers() {
        assert!(should_keep_checking_tls(None));
        assert!(!should_keep_checking_tls(Some(&ProbeError::Eof)));
        assert!(!should_keep_checking_tls(Some(&ProbeError::Handshake(
            "first record does not look like a TLS handshake".into()
        ))));
        assert!(should_keep_checking_tls(Some(&ProbeError::Handshake(
            "remote error: tls: bad certificate".into()
        ))));
    }
}
