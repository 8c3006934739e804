/// Inventory engine constants and tunable defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InventoryConfig {
    /// Upper bound on the payload bytes carried by one full-state segment.
    pub max_segment_bytes: usize,
}

impl InventoryConfig {
    // ===== wire constants =====
    /// Length in bytes of a [`crate::StateDigest`] (SHA-256).
    pub const DIGEST_LEN: usize = 32;
    /// Length in bytes of an [`crate::ItemId`].
    pub const ITEM_ID_LEN: usize = 16;
    /// First segment index of a full-state transfer (segments are 1-based).
    pub const FIRST_SEGMENT: u32 = 1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_SEGMENT_BYTES: usize = 512;

    // ===== attribute keys understood by built-in equip behaviors =====
    pub const ATTR_DURATION_SECS: &'static str = "duration_secs";
    pub const ATTR_EXPIRES_AT: &'static str = "expires_at";

    pub fn new() -> Self {
        Self {
            max_segment_bytes: Self::DEFAULT_MAX_SEGMENT_BYTES,
        }
    }

    pub fn with_max_segment_bytes(max_segment_bytes: usize) -> Self {
        Self {
            max_segment_bytes: max_segment_bytes.max(1),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self::new()
    }
}
