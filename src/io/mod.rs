pub mod csv_read;
pub mod listing;
