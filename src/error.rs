use thiserror::Error;

/// Errors raised when constructing physics objects from invalid input.
///
/// Stepping never fails; these only come out of constructors and
/// validation helpers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid world config: `{field}` = {value} ({reason})")]
    InvalidConfig {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
    #[error("rope needs at least one segment")]
    EmptyRope,
    #[error("rope point index {index} out of range (len {len})")]
    RopePointOutOfRange { index: usize, len: usize },
}
