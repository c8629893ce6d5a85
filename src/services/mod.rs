pub(crate) mod finality_service;
#[cfg(test)]
pub(crate) mod mock;
pub mod node_api;
pub(crate) mod operation_service;

pub(crate) use finality_service::FinalityService;
pub(crate) use operation_service::OperationService;
