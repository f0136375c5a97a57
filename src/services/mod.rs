pub mod auth_service;
pub mod extraction;
pub mod gmail_service;
pub mod subscription_service;
