//! Listing-side stage: walk the order history and persist candidate links.

mod links;
mod store;
mod walker;

pub use links::LinkHarvester;
pub use store::RawLinkStore;
pub use walker::{HarvestSummary, PaginationWalker};
