pub mod header;
pub mod record;
pub mod codec;
pub mod io_stream;
pub mod schema;
pub mod inventory;
pub mod suggest;
pub mod intersphinx;
pub mod fileops;
pub mod fetch;

pub use header::Header;
pub use record::{InventoryRecord, ParseError, decode_line, encode_line, expand, contract};
pub use codec::{compress, decompress, CodecError};
pub use io_stream::{lines_to_structured, structured_to_lines};
pub use inventory::{Inventory, InventoryError, Source, SourceArgs, SourceType};
pub use intersphinx::{infer_mapping, IntersphinxError};
