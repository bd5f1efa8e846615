pub mod admin;
pub mod client_ip;
pub mod rate_limit;

pub use admin::require_admin;
pub use client_ip::ClientIp;
