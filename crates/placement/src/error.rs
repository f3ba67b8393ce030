use sheetpilot_grid::GridError;

/// Error type for placement operations.
#[derive(Debug)]
pub enum PlacementError {
    /// Accessor call failed
    Grid(GridError),
    /// Chart payload would not decode
    ChartDecode(String),
    /// Both the primary and the fallback chart position failed
    ChartPosition(String),
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::Grid(e) => write!(f, "{}", e),
            PlacementError::ChartDecode(msg) => write!(f, "Chart image did not decode: {}", msg),
            PlacementError::ChartPosition(msg) => {
                write!(f, "Chart could not be positioned: {}", msg)
            }
        }
    }
}

impl std::error::Error for PlacementError {}

impl From<GridError> for PlacementError {
    fn from(e: GridError) -> Self {
        PlacementError::Grid(e)
    }
}
