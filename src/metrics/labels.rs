//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

/// Outcome of a queued RouterOS command
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CommandLabels {
    pub outcome: String,
}

/// Result of a cache lookup for one logical resource
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CacheLabels {
    pub key: String,
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cache_labels_hash_distinguishes_result() {
        let hit = CacheLabels {
            key: "interfaces".to_string(),
            result: "hit".to_string(),
        };
        let miss = CacheLabels {
            key: "interfaces".to_string(),
            result: "miss".to_string(),
        };
        let set: HashSet<_> = [hit.clone(), miss, hit].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_command_labels_equality() {
        let a = CommandLabels {
            outcome: "ok".to_string(),
        };
        let b = CommandLabels {
            outcome: "ok".to_string(),
        };
        assert_eq!(a, b);
    }
}
