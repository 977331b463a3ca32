//! Small file helpers shared by the workflows.

pub mod archive;
pub mod variable_list;
