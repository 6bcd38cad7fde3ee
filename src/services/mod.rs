pub mod admin_query;
pub mod intake;
pub mod payment;
pub mod pricing;
pub mod reconcile;
pub mod reference;
pub mod session;
