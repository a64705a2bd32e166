pub mod reconcile;

pub use reconcile::{
    classify, index_existing, normalize_candidate, reconcile, ReconcileOptions, ReconcileSummary,
    Reconciliation,
};
