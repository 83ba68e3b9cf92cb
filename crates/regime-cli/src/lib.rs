//! `regime` CLI 라이브러리: CSV 입출력과 서브커맨드 구현.

pub mod commands;
pub mod csv_io;
