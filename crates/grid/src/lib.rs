pub mod host;
pub mod memory;

pub use host::{
    CellGeometry, GridError, GridHost, ImageId, ImagePlacement, RegionData,
};
pub use memory::MemoryWorkbook;
