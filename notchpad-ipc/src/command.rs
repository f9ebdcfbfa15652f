use serde::{Deserialize, Serialize};

use crate::state::StateInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Panel operations
    Open,
    Close,
    Pop,

    // Lifecycle
    Reactivate,

    // Queries
    GetState,

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    State { state: StateInfo },
}
