//! Pure statistics over aggregation results.

pub mod currency;
mod hindex;
mod network;
mod percentages;

pub use currency::{CurrencyConverter, LATEST_CPI_YEAR};
pub use hindex::{CitationRecord, h_index, h_index_by_year};
pub use network::{CoauthorshipNetwork, MAX_PARTICIPANTS_PER_WORK, NetworkEdge, NetworkGraph, NetworkNode};
pub use percentages::{Share, percentages, round2, top_n_with_rest};
