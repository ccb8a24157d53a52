pub mod declutter;
pub mod directions;
pub mod fetcher;
pub mod nearest;
pub mod reconciler;
pub mod scheduler;
pub mod session;
pub mod viewport;

pub use declutter::declutter;
pub use directions::{DirectionsController, DirectionsStatus, RouteSettlement, RouteTicket};
pub use fetcher::{FetchOutcome, PoiFetcher, RefreshReport};
pub use nearest::{haversine_m, nearest, Nearest, PoiSets};
pub use reconciler::{MarkerReconciler, ReconcileStats, SelectionRequest};
pub use session::{Selection, Session, SessionEvent, SessionNotice, SessionPorts};
pub use viewport::{ViewportDecision, ViewportWatcher};
