// In crates/execution/src/lib.rs

use async_trait::async_trait;

pub mod error;
pub mod simulated;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use simulated::SimulatedExecutor;
pub use types::{ClosedPosition, Execution, FillContext, OrderRequest, Portfolio, SimulationSettings};

/// The universal interface for an execution handler.
///
/// An `Executor` takes an `OrderRequest`, fills it, and applies the result to the
/// portfolio it is handed.
#[async_trait]
pub trait Executor: Send {
    /// The name of the executor (e.g., "SimulatedExecutor").
    fn name(&self) -> &'static str;

    /// Executes a given order request.
    ///
    /// # Arguments
    ///
    /// * `order_request`: The order to fill.
    /// * `context`: Bar index, time and close of the current bar.
    /// * `portfolio`: The account the fill is applied to.
    ///
    /// # Returns
    ///
    /// The fill, plus the closed position when the order was a close.
    async fn execute(
        &mut self,
        order_request: &OrderRequest,
        context: FillContext,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<ClosedPosition>)>;
}
