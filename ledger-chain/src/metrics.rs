//! Prometheus metrics for chain growth and mining

use crate::ChainResult;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

/// Chain metrics, registered in their own registry.
///
/// Cloning is cheap and every clone updates the same series.
#[derive(Clone)]
pub struct ChainMetrics {
    registry: Registry,
    /// Blocks appended since the process started
    pub blocks_appended: IntCounter,
    /// Ordinal of the next block
    pub chain_height: IntGauge,
    /// Wall time spent building and minting blocks
    pub mining_seconds: Histogram,
    /// Pool transactions handed back after a failed append
    pub restored_transactions: IntCounter,
}

impl ChainMetrics {
    pub fn new() -> ChainResult<Self> {
        Self::with_registry(Registry::new())
    }

    /// Register the chain series in `registry`
    pub fn with_registry(registry: Registry) -> ChainResult<Self> {
        let blocks_appended =
            IntCounter::new("ledger_blocks_appended_total", "Blocks appended to the chain")?;
        let chain_height = IntGauge::new("ledger_chain_height", "Ordinal of the next block")?;
        let mining_seconds = Histogram::with_opts(
            HistogramOpts::new("ledger_mining_seconds", "Time spent minting a block")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        let restored_transactions = IntCounter::new(
            "ledger_pool_restored_total",
            "Pool transactions restored after a failed append",
        )?;

        registry.register(Box::new(blocks_appended.clone()))?;
        registry.register(Box::new(chain_height.clone()))?;
        registry.register(Box::new(mining_seconds.clone()))?;
        registry.register(Box::new(restored_transactions.clone()))?;

        Ok(Self {
            registry,
            blocks_appended,
            chain_height,
            mining_seconds,
            restored_transactions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered series in the Prometheus text format
    pub fn render(&self) -> ChainResult<String> {
        Ok(TextEncoder::new().encode_to_string(&self.registry.gather())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let metrics = ChainMetrics::new().unwrap();
        metrics.blocks_appended.inc();
        metrics.chain_height.set(7);

        let text = metrics.render().unwrap();
        assert!(text.contains("ledger_blocks_appended_total 1"));
        assert!(text.contains("ledger_chain_height 7"));
        assert!(text.contains("ledger_mining_seconds_bucket"));
    }

    #[test]
    fn test_clones_share_series() {
        let metrics = ChainMetrics::new().unwrap();
        let clone = metrics.clone();
        clone.restored_transactions.inc_by(3);
        assert_eq!(metrics.restored_transactions.get(), 3);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let metrics = ChainMetrics::new().unwrap();
        assert!(ChainMetrics::with_registry(metrics.registry().clone()).is_err());
    }
}
