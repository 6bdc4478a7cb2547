//! Search primitives: sorted index sets, discrete and continuous optimizers.

pub mod brent;
pub mod fibonacci;
pub mod index_set;

pub use brent::{brent_minimize, Minimum};
pub use fibonacci::{exhaustive_max, fibonacci_search_max};
pub use index_set::{
    is_strictly_increasing, merge_indices, prior_indices, search_sorted, IndexPair,
    PriorIndexSets,
};
