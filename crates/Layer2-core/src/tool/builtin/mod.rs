//! Builtin tools
//!
//! The fixed capability set the model can invoke: read-only file/network/
//! system tools plus shell and Python execution (the dangerous pair).

mod bash;
mod file_list;
mod file_read;
mod file_write;
mod python_run;
mod sys_info;
mod web_get;

pub use bash::BashTool;
pub use file_list::FileListTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use python_run::PythonRunTool;
pub use sys_info::SysInfoTool;
pub use web_get::WebGetTool;

use super::Tool;
use std::sync::Arc;

/// Every builtin tool
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(FileReadTool::new()),
        Arc::new(FileWriteTool::new()),
        Arc::new(FileListTool::new()),
        Arc::new(WebGetTool::new()),
        Arc::new(SysInfoTool::new()),
        Arc::new(PythonRunTool::new()),
        Arc::new(BashTool::new()),
    ]
}
