pub mod managed_list;
pub mod window;

pub use managed_list::ManagedList;
pub use window::{WindowId, WindowRecord};
