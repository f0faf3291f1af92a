//! Concrete board and retrieval actions

mod add;
mod delete;
mod lookup;
mod query;
mod update;

pub use add::AddTaskAction;
pub use delete::DeleteTaskAction;
pub use lookup::LookupTaskAction;
pub use query::RetrievalAction;
pub use update::UpdateTaskAction;

use std::sync::Arc;

use ordo_agent::BoxedAction;
use ordo_board::{BoardClient, TaskIndex};

/// The fixed action set of the task-ops graph: CRUD plus the lookup
pub fn task_ops_actions(
    board: Arc<dyn BoardClient>,
    index: Arc<dyn TaskIndex>,
) -> Vec<BoxedAction> {
    vec![
        Arc::new(AddTaskAction::new(board.clone(), index.clone())),
        Arc::new(UpdateTaskAction::new(board.clone(), index.clone())),
        Arc::new(DeleteTaskAction::new(board, index.clone())),
        Arc::new(LookupTaskAction::new(index)),
    ]
}
