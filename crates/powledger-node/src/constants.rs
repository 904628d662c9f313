pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_PEER_TIMEOUT_SECS: u64 = 10;
/// Path every node serves its chain on; peers are fetched from `{peer}{CHAINS_PATH}`.
pub const CHAINS_PATH: &str = "/chains";
