pub mod arcade_board;

pub use arcade_board::ArcadeBoard;
