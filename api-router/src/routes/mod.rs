pub mod ask;
pub mod histories;
pub mod liveness;
pub mod readiness;
