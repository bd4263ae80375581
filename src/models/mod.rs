//! Data models for order acquisition.

mod link;
mod product;

pub use link::CandidateLink;
pub use product::{ProductRecord, ProductRow, ProductTable};
