pub mod admin_gate;
pub mod export;
pub mod identity;
pub mod leads;
pub mod reporting;
pub mod session;
