pub mod batch;
pub mod commit;
pub mod operation;
pub mod record;
