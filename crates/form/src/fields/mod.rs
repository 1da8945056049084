//! Field types beyond the plain [`crate::Field`]: presentational
//! components and fields owning nested forms.

mod block;
mod component;
mod modal;

pub use block::BlockField;
pub use component::ComponentField;
pub use modal::ModalField;
