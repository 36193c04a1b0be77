pub mod registry_service;
pub use registry_service::{
    LoginAttempt, LoginReceipt, RegistryError, RegistryService, require_username,
};

pub mod registry_service_impl;
pub use registry_service_impl::StoreRegistryService;
