use svitlo_notify::DeliveryError;
use svitlo_store::StoreError;

/// A poll cycle that could not complete.
///
/// Fetch failures are not errors here: they end the cycle early as
/// [`CycleOutcome::NoData`](crate::poller::CycleOutcome::NoData).
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("could not build notification: {0}")]
    Message(#[from] DeliveryError),
}

/// Failure while answering an inbound command.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}
