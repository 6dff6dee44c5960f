pub mod ball_tree;
pub mod common;
pub mod decode;
pub mod dtw;
pub mod prescreen;
pub mod preprocess;
pub mod progress;
pub mod rank;
pub mod savgol;
pub mod search;
pub mod windows;
