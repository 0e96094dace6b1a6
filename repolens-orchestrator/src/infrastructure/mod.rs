pub mod acquirer;
pub mod contract;
pub mod mapper;
pub mod registry;
