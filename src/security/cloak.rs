//! Host cloaking.
//!
//! Deterministic, keyed rewrites of client hostnames and IPv4 addresses
//! so hostmask-style matching keeps working without revealing the
//! underlying address. Every digest follows the same chain,
//! `MD5(SHA1(salt_a ":" text ":" salt_b) ‖ salt_c)`, with the three
//! configured keys rotated per field. Pure functions; safe to call from
//! any task concurrently.

use md5::{Digest, Md5};
use sha1::Sha1;

/// The three cloak salts plus the network prefix shown in hostname
/// cloaks. Key shape (5–100 alphanumeric bytes) is enforced by config
/// validation before a `CloakKeys` is ever built.
#[derive(Debug, Clone)]
pub struct CloakKeys {
    pub net_prefix: String,
    pub key1: String,
    pub key2: String,
    pub key3: String,
}

/// `MD5(SHA1(salt_a ":" text ":" salt_b) ‖ salt_c)`.
fn keyed_digest(salt_a: &str, text: &str, salt_b: &str, salt_c: &str) -> [u8; 16] {
    let mut sha = Sha1::new();
    sha.update(salt_a.as_bytes());
    sha.update(b":");
    sha.update(text.as_bytes());
    sha.update(b":");
    sha.update(salt_b.as_bytes());
    let inner = sha.finalize();

    let mut md5 = Md5::new();
    md5.update(inner);
    md5.update(salt_c.as_bytes());
    md5.finalize().into()
}

/// Fold a 16-byte digest into one word: four slots of `BITS / 4` bits,
/// each the XOR of four successive digest bytes, first four bytes
/// landing in the most significant slot.
pub fn downsample(digest: &[u8; 16]) -> u32 {
    let slot_width = u32::BITS / 4;
    digest.chunks_exact(4).fold(0u32, |acc, chunk| {
        (acc << slot_width) | u32::from(chunk[0] ^ chunk[1] ^ chunk[2] ^ chunk[3])
    })
}

impl CloakKeys {
    /// Cloak a resolved hostname, preserving the domain tail (from the
    /// first dot followed by a letter) so suffix matching still works.
    pub fn hide_host(&self, host: &str) -> String {
        let alpha = keyed_digest(&self.key1, host, &self.key2, &self.key3);
        let tail = host
            .match_indices('.')
            .find(|&(i, _)| {
                host.as_bytes()
                    .get(i + 1)
                    .is_some_and(|b| b.is_ascii_alphabetic())
            })
            .map(|(i, _)| &host[i..])
            .unwrap_or("");
        format!("{}-{:X}{}", self.net_prefix, downsample(&alpha), tail)
    }

    /// Cloak a dotted-quad address. The three segments hash the full
    /// address, `A.B.C`, and `A.B` with rotated key orders, so hosts in
    /// the same network keep a common cloak suffix.
    pub fn hide_ipv4(&self, dotted: &str) -> String {
        let abc = dotted.rsplit_once('.').map_or(dotted, |(head, _)| head);
        let ab = abc.rsplit_once('.').map_or(abc, |(head, _)| head);

        let alpha = keyed_digest(&self.key2, dotted, &self.key3, &self.key1);
        let beta = keyed_digest(&self.key3, abc, &self.key1, &self.key2);
        let gamma = keyed_digest(&self.key1, ab, &self.key2, &self.key3);

        format!(
            "{:X}.{:X}.{:X}.IP",
            downsample(&alpha),
            downsample(&beta),
            downsample(&gamma)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> CloakKeys {
        CloakKeys {
            net_prefix: "CND".to_string(),
            key1: "aRstc2l3g0Zwe".to_string(),
            key2: "0mQz93fjHa7T1".to_string(),
            key3: "pLx5VbnK2ReQ8".to_string(),
        }
    }

    #[test]
    fn downsample_is_deterministic_and_packs_msb_first() {
        let digest = [1u8; 16];
        assert_eq!(downsample(&digest), downsample(&digest));
        // XOR of four equal bytes is zero in every slot.
        assert_eq!(downsample(&digest), 0);

        let mut digest = [0u8; 16];
        digest[0] = 0xAB;
        digest[12] = 0xCD;
        assert_eq!(downsample(&digest), 0xAB00_00CD);
    }

    #[test]
    fn hostname_cloak_keeps_the_domain_tail() {
        let k = keys();
        let cloak = k.hide_host("dsl-12.customer.example.com");
        assert!(cloak.starts_with("CND-"), "{cloak}");
        assert!(cloak.ends_with(".customer.example.com"), "{cloak}");
        assert_eq!(cloak, k.hide_host("dsl-12.customer.example.com"));
    }

    #[test]
    fn hostname_cloak_skips_dots_followed_by_digits() {
        let k = keys();
        // ".12" is not a domain tail; ".example.com" is.
        let cloak = k.hide_host("host.12.example.com");
        assert!(cloak.ends_with(".example.com"), "{cloak}");
        assert!(!cloak.contains(".12."), "{cloak}");
    }

    #[test]
    fn hostname_without_domain_tail_is_fully_hidden() {
        let k = keys();
        let cloak = k.hide_host("localhost");
        assert!(cloak.starts_with("CND-"));
        assert!(!cloak.contains("localhost"));
    }

    #[test]
    fn ipv4_cloak_shape_and_determinism() {
        let k = keys();
        let cloak = k.hide_ipv4("203.0.113.9");
        assert!(cloak.ends_with(".IP"), "{cloak}");
        assert_eq!(cloak.split('.').count(), 4);
        assert_eq!(cloak, k.hide_ipv4("203.0.113.9"));
        // Hash segments are uppercase hex.
        for segment in cloak.split('.').take(3) {
            assert!(
                !segment.is_empty()
                    && segment.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
                "{cloak}"
            );
        }
    }

    #[test]
    fn ipv4_cloaks_share_suffix_within_a_network() {
        let k = keys();
        let a: Vec<String> = k.hide_ipv4("10.1.2.3").split('.').map(String::from).collect();
        let b: Vec<String> = k.hide_ipv4("10.1.2.99").split('.').map(String::from).collect();
        // Same /24: host segment differs, network segments agree.
        assert_ne!(a[0], b[0]);
        assert_eq!(a[1], b[1]);
        assert_eq!(a[2], b[2]);

        let c: Vec<String> = k.hide_ipv4("10.1.77.3").split('.').map(String::from).collect();
        // Same /16 only: the A.B segment still agrees.
        assert_ne!(c[1], a[1]);
        assert_eq!(c[2], a[2]);
    }

    #[test]
    fn different_keys_produce_different_cloaks() {
        let k = keys();
        let mut other = keys();
        other.key2 = "entirelyOther7".to_string();
        assert_ne!(k.hide_ipv4("203.0.113.9"), other.hide_ipv4("203.0.113.9"));
        assert_ne!(k.hide_host("a.example.com"), other.hide_host("a.example.com"));
    }
}
