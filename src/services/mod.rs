pub mod receiver;
pub mod storage;
pub mod upload_service;
