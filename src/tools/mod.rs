//! Tool registry

pub mod calc;
pub mod calendar;
pub mod datetime;
pub mod mail;
pub mod notes;
pub mod osa;
pub mod script;

pub use calc::CalcTool;
pub use calendar::CreateCalendarEventTool;
pub use datetime::DatetimeTool;
pub use mail::SendEmailTool;
pub use notes::CreateNoteTool;
pub use script::RunScriptTool;

use crate::config::Config;
use crate::Tool;

/// All available tools. The mail tool gets its account table here; everything
/// else is stateless.
pub fn all_tools(config: &Config) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(DatetimeTool),
        Box::new(CalcTool),
        Box::new(CreateNoteTool),
        Box::new(CreateCalendarEventTool),
        Box::new(SendEmailTool::new(config)),
        Box::new(RunScriptTool),
    ]
}

/// Find tool by name
pub fn find_tool(config: &Config, name: &str) -> Option<Box<dyn Tool>> {
    all_tools(config).into_iter().find(|t| t.name() == name)
}
