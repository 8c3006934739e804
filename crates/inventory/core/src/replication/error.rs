use crate::error::{ErrorSeverity, InventoryError};
use crate::identity::OwnerId;

use super::TransferId;

/// Malformed or out-of-order replication traffic.
///
/// Always recovered the same way: the replica drops whatever transfer was in
/// flight and asks for a fresh one from segment 1.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown change action code {code}")]
    UnknownAction { code: u8 },

    #[error("segment {received} arrived while expecting segment {expected} of {transfer}")]
    SegmentOutOfOrder {
        transfer: TransferId,
        expected: u32,
        received: u32,
    },

    #[error("{transfer} announced {expected} segments, segment claims {received}")]
    SegmentCountMismatch {
        transfer: TransferId,
        expected: u32,
        received: u32,
    },

    #[error("segment {index} is outside 1..={count}")]
    SegmentIndexInvalid { index: u32, count: u32 },

    #[error("delta received during {transfer}")]
    DeltaDuringTransfer { transfer: TransferId },

    #[error("message for {received} delivered to replica of {expected}")]
    OwnerMismatch { expected: OwnerId, received: OwnerId },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl ProtocolError {
    pub(crate) fn malformed(error: bincode::Error) -> Self {
        ProtocolError::MalformedPayload(error.to_string())
    }
}

impl InventoryError for ProtocolError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::UnknownAction { .. } => "PROTOCOL_UNKNOWN_ACTION",
            ProtocolError::SegmentOutOfOrder { .. } => "PROTOCOL_SEGMENT_OUT_OF_ORDER",
            ProtocolError::SegmentCountMismatch { .. } => "PROTOCOL_SEGMENT_COUNT_MISMATCH",
            ProtocolError::SegmentIndexInvalid { .. } => "PROTOCOL_SEGMENT_INDEX_INVALID",
            ProtocolError::DeltaDuringTransfer { .. } => "PROTOCOL_DELTA_DURING_TRANSFER",
            ProtocolError::OwnerMismatch { .. } => "PROTOCOL_OWNER_MISMATCH",
            ProtocolError::MalformedPayload(_) => "PROTOCOL_MALFORMED_PAYLOAD",
        }
    }
}
