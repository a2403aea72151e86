pub mod antinuke;
pub mod snapshot;
