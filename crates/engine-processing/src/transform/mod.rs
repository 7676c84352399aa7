pub mod error;
pub mod field_mapper;
pub mod record;
