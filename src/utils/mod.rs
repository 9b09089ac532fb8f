pub mod name_lock;
pub mod validation;
