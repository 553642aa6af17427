//! # exmat CLI Library
//!
//! 存在量化制約の具体化と問い合わせをコマンドラインから実行

pub mod commands;

pub use commands::*;
