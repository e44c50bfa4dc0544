pub mod aggregator;
pub mod demo;
pub mod error;
pub(crate) mod parse_helpers;
pub mod retailers;
pub mod session;
pub mod transport;

pub use aggregator::{Aggregator, RetailerOutcome};
pub use error::{RetailerFailure, SearchError, TransportError};
pub use retailers::vmclub::response::{SessionLocation, SessionProduct, SessionSearchResponse};
pub use retailers::{Adapter, JsonEndpointAdapter, SopharmacyAdapter, VmClubAdapter};
pub use session::{ResultFilter, SearchSession};
pub use transport::Transport;
