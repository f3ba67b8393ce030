pub mod addr;
pub mod value;

pub use addr::{col_to_letters, letters_to_col, CellAddress, Region};
pub use value::{Alignment, CellFormat, CellValue};
