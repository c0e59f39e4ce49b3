//! Query modules for stockroom entities.

pub mod products;
