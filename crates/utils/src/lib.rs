pub mod logging;
pub mod net;
pub mod response;
pub mod time;
