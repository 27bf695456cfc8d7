use tokio_util::sync::CancellationToken;

/// Lifetime of one view. Cancelled when the console leaves the view.
///
/// The generation tags every result so anything that still arrives after
/// cancellation can be recognized and dropped.
#[derive(Debug)]
pub struct ViewScope {
    generation: u64,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            token: CancellationToken::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token handed to tasks started inside this view
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
