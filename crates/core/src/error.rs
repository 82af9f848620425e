//! Errors raised while building core values.

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur when constructing core types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Operator count does not match the operand count
    #[error("sequence has {operands} operands but {operators} operators")]
    InvalidSequence {
        /// Operand count
        operands: usize,
        /// Operator count
        operators: usize,
    },

    /// Operand range is empty or includes zero
    #[error("operand range {min}..={max} must be non-empty and start at 1 or above")]
    InvalidOperandRange {
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },
}
