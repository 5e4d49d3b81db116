use anyhow::Error;

pub mod asr;
pub mod assembler;
pub mod clusters;
pub mod io;
pub mod mrca;
pub mod pipeline;
pub mod tree;

#[macro_use]
pub mod macros;

type Result<T> = std::result::Result<T, Error>;
