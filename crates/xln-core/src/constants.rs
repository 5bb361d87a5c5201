/// Default maximum number of hops a multi-hop payment route may traverse.
pub const DEFAULT_MAX_HOPS: u8 = 3;

/// Default number of ticks a payment reserve may remain outstanding before
/// it is released and the payment fails with `ReserveTimeout`.
pub const DEFAULT_RESERVE_TIMEOUT_TICKS: u64 = 10;

/// Default number of minor-unit decimals assumed for a token when no
/// per-token override is configured.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Default bound on the server's ingress queue depth.
pub const DEFAULT_INGRESS_QUEUE_BOUND: usize = 4096;

/// Default number of frames between persisted snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL_FRAMES: u64 = 100;

/// Window, in ticks, over which duplicate ingress input hashes are
/// remembered and idempotently dropped.
pub const DEFAULT_DEDUP_WINDOW_TICKS: u64 = 64;
