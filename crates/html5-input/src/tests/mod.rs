mod positions;
pub mod utils;
