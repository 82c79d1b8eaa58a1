//! Application services over the entity store.
//!
//! Every public manager method runs one unit of work: it opens a unit of work,
//! calls the matching `*_in` function, then commits on success or rolls back
//! on any error. The `*_in` functions are public so several operations can be
//! composed into a single unit of work.

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod purchases;

pub use accounts::AccountManager;
pub use catalog::CatalogManager;
pub use error::{ServiceError, ServiceResult};
pub use purchases::PurchaseWorkflow;

use tracing::warn;

use crate::entity_store::UnitOfWork;

/// Commit `uow` if `result` is `Ok`, roll it back otherwise.
pub async fn finish<U, T>(uow: U, result: ServiceResult<T>) -> ServiceResult<T>
where
    U: UnitOfWork,
{
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
