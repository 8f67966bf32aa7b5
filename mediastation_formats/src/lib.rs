pub mod datum;
pub mod file;
pub mod writer;

pub use datum::{ChunkReader, Datum, DatumError, DatumType};
pub use file::BytecodeFile;
pub use writer::ChunkWriter;
