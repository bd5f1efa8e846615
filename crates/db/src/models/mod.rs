pub mod event;
pub mod invite_code;
