//! Controllers - one per console region.
//!
//! Each controller owns its view model, subscribes to the event kinds listed
//! in its `KINDS` constant and talks to its siblings only through the bus.

mod chart;
mod config_editor;
mod device_list;
mod device_tree;
mod status;
mod tab;
mod warning;

pub use chart::{ChartController, ChartFrame};
pub use config_editor::{
    ConfigDocument, ConfigEditor, ForwarderConfigEditor, NodeConfigEditor, SendOutcome,
    ServerConfigEditor,
};
pub use device_list::DeviceListController;
pub use device_tree::DeviceTreeController;
pub use status::{StatusController, StatusView};
pub use tab::TabController;
pub use warning::{WarningController, ALARM_KIND};
