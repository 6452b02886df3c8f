//! Block-explorer links for returned transaction ids.

/// `{base}/tx/{tx_id}`. A trailing slash on `base` is tolerated.
pub fn explorer_tx_url(base: &str, tx_id: &str) -> String {
    format!("{}/tx/{tx_id}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basescan_link() {
        let tx = "0x18f1c4a71251f8ab2992e68e20133483de18dba85f311f6269b2016521dc8ade";
        assert_eq!(
            explorer_tx_url("https://sepolia.basescan.org", tx),
            format!("https://sepolia.basescan.org/tx/{tx}")
        );
        assert_eq!(
            explorer_tx_url("https://sepolia.basescan.org/", tx),
            format!("https://sepolia.basescan.org/tx/{tx}")
        );
    }
}
