pub mod session;
pub mod task;
pub mod view;

pub use session::{Session, SyncStatus};
pub use task::{Task, TaskId, TaskPriority};
pub use view::TaskView;
