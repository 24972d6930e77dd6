pub mod domain;
pub mod protocol;
pub mod quick_reply;
