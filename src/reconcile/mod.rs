//! Find-or-clone of system-managed objects and the per-type shape table it relies on.

pub mod descriptor;
pub mod owners;
pub mod reconciler;

pub use descriptor::descriptor;
pub use owners::OwnerSet;
pub use reconciler::{CloneDirective, ReconcileOutcome, Reconciler};
