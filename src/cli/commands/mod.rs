pub mod add;
pub mod delete;
pub mod get;
pub mod list;
pub mod reconcile;
pub mod register;
