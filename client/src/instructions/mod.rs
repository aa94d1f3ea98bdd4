pub mod drip_instructions;
pub mod queries;
pub mod rpc;
pub mod utils;
