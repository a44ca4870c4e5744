//! Centralized default constants for keyplan.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// METRICS PROVIDER
// =============================================================================

/// Default metrics provider API base URL.
pub const PROVIDER_URL: &str = "https://api.dataforseo.com/v3";

/// Timeout for metrics provider requests in seconds.
pub const PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Minimum spacing between consecutive provider calls, measured from the
/// previous call's issue time.
pub const MIN_REQUEST_INTERVAL_MS: u64 = 6_000;

/// Delay before re-submitting a task the provider reported as still queued.
pub const QUEUED_RETRY_DELAY_MS: u64 = 6_000;

/// Provider task status code for success.
pub const STATUS_OK: i64 = 20_000;

/// Provider task status code meaning "queued, retry later".
pub const STATUS_TASK_QUEUED: i64 = 40_202;

/// Language code sent with every provider request.
pub const LANGUAGE_CODE: &str = "en";

/// Sort hint sent with search volume requests.
pub const SEARCH_VOLUME_SORT: &str = "relevance";

/// Maximum seed keywords accepted by one keyword ideas call.
pub const MAX_IDEA_SEEDS: usize = 700;

/// Maximum keywords accepted by one search volume call.
pub const MAX_METRICS_KEYWORDS: usize = 100;

/// Number of search volume batches issued per run.
pub const METRICS_BATCH_LIMIT: usize = 1;

/// Keyword used by the provider self-test.
pub const PROBE_KEYWORD: &str = "buy laptop";

// =============================================================================
// LOCATIONS
// =============================================================================

/// Country used when a run does not name one.
pub const DEFAULT_COUNTRY: &str = "UK";

/// Provider location code for the United Kingdom.
pub const LOCATION_UK: u32 = 2826;

/// Provider location code for the United States.
pub const LOCATION_US: u32 = 2840;

// =============================================================================
// KEYWORD SANITIZING
// =============================================================================

/// Maximum words kept in a normalized keyword.
pub const KEYWORD_MAX_WORDS: usize = 10;

/// Maximum characters kept in a normalized keyword.
pub const KEYWORD_MAX_CHARS: usize = 80;

// =============================================================================
// RUN DEFAULTS
// =============================================================================

/// Seeds sent downstream per run.
pub const MAX_SEEDS: usize = 20;

/// Minimum search volume kept when the volume filter is enabled.
pub const MIN_SEARCH_VOLUME: f64 = 10.0;

/// Default cluster cap.
pub const MAX_CLUSTERS: usize = 12;

/// Default keyword row cap per cluster.
pub const MAX_ROWS_PER_CLUSTER: usize = 50;

/// Cluster name used when a keyword row has no cluster.
pub const GENERAL_CLUSTER: &str = "General";

// =============================================================================
// CLUSTER GENERATION
// =============================================================================

/// Pseudo-clusters derived from URL tokens when no other source is available.
pub const FALLBACK_CLUSTER_LIMIT: usize = 20;

/// Score of the first token-derived pseudo-cluster; each later one scores one less.
pub const FALLBACK_SCORE_BASE: f64 = 60.0;

/// Score given to user-supplied initial clusters.
pub const INITIAL_CLUSTER_SCORE: f64 = 50.0;

// =============================================================================
// TEXT GENERATION
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model name.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for models that accept one.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;
