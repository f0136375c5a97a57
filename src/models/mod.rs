pub mod dashboard;
pub mod message;
pub mod session_manager;
pub mod subscription;
