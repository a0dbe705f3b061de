/*
Module: mappers

Bank-switching mapper variants. The fixed-bank NROM lives beside the
`Mapper` trait in `crate::mapper`.

Implemented:
- MMC1 (Mapper 1)
*/

pub mod mmc1;

pub use mmc1::Mmc1;
