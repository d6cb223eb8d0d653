pub mod record_source;
