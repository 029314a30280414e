//! I/O operations for reading observations and writing result records

mod csv;

pub use self::csv::{
    read_observations, read_observations_from_reader, write_records, write_records_to_writer,
    ReadOptions, ReadSummary,
};
