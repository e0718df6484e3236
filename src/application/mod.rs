//! Application layer - controllers and the services behind them.
//!
//! Controllers own the view models of the console regions and coordinate
//! only through the event bus. `Console` builds them around one shared
//! device tree and drives the background loops.

pub mod console;
pub mod controllers;
pub mod tree_service;

pub use console::Console;
pub use controllers::{
    ChartController, ChartFrame, ConfigDocument, ConfigEditor, DeviceListController,
    DeviceTreeController, ForwarderConfigEditor, NodeConfigEditor, SendOutcome,
    ServerConfigEditor, StatusController, StatusView, TabController, WarningController,
    ALARM_KIND,
};
pub use tree_service::{DeviceTreeService, RefreshSummary};
