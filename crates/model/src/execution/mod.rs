pub mod failed_row;
