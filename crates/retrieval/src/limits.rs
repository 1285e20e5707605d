const MAX_NEIGHBOR_FANOUT: usize = 64;

pub const NEIGHBOR_FANOUT_ENV: &str = "CONTEXT_RETRIEVAL_NEIGHBOR_FANOUT";

pub(crate) fn parse_neighbor_fanout(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_NEIGHBOR_FANOUT)
}

/// Neighbor lookup fan-out, overridable through `CONTEXT_RETRIEVAL_NEIGHBOR_FANOUT`
pub(crate) fn neighbor_fanout_from_env(default_value: usize) -> usize {
    let raw = std::env::var(NEIGHBOR_FANOUT_ENV).ok();
    parse_neighbor_fanout(raw.as_deref(), default_value)
}
