use crate::constants::CHAINS_PATH;
use powledger_core::{Block, PeerError, PeerSnapshot};
use std::time::Duration;
use tracing::debug;

/// Fetches peers' chains over HTTP for conflict resolution.
#[derive(Clone, Debug)]
pub struct PeerClient {
    http: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// `GET {node}/chains`. Every failure becomes a [`PeerError`].
    pub async fn fetch_chain(&self, node: &str) -> Result<Vec<Block>, PeerError> {
        let url = format!("{node}{CHAINS_PATH}");
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(PeerError::Status(status.as_u16()));
        }
        let chain = res
            .json::<Vec<Block>>()
            .await
            .map_err(|e| PeerError::Malformed(e.to_string()))?;
        debug!(%url, len = chain.len(), "fetched peer chain");
        Ok(chain)
    }

    /// One snapshot per node, fetched sequentially in the given order.
    pub async fn snapshots(&self, nodes: &[String]) -> Vec<PeerSnapshot> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let result = self.fetch_chain(node).await;
            out.push(PeerSnapshot {
                node: node.clone(),
                result,
            });
        }
        out
    }
}
