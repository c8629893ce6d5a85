pub mod assertions;
mod get;
mod local_store;
mod publish;
mod publish_finality;
mod query;

pub use get::GetResult;
#[cfg(test)]
pub(crate) use get::ROOT_MISMATCH_MESSAGE;
pub(crate) use get::{GetInput, GetWorkflow};
pub(crate) use local_store::LocalStoreWorkflow;
pub use publish::PublishResult;
pub(crate) use publish::{PublishInput, PublishWorkflow};
pub(crate) use publish_finality::PublishFinalityWorkflow;
pub(crate) use query::QueryWorkflow;
