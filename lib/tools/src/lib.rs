//! Named tools for Ploughman.
//!
//! This crate provides:
//!
//! - **Registry**: tools looked up by name and invoked with named parameters
//! - **Tools**: departure time, fortune analysis, table listing and creation,
//!   broadcast queries, and chart drawing
//! - **Chart renderer**: PNG output from tabular data

pub mod builtin;
pub mod chart;
pub mod database;
pub mod departure;
pub mod error;
pub mod fortune;
pub mod random;
pub mod registry;
pub mod render;
pub mod visualize;

pub use builtin::{ToolDependencies, create_registry};
pub use chart::{ChartKind, Table};
pub use database::{CreateTableTool, ExecuteQueryTool, ListTablesTool, ToolsConfig};
pub use departure::{DEPARTURE_TIMES, DepartureTool};
pub use error::{RenderError, ToolError};
pub use fortune::FortuneTool;
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use registry::{ToolDefinition, ToolHandler, ToolInvocation, ToolOutput, ToolRegistry};
pub use render::{ChartRenderer, PngChartRenderer};
pub use visualize::{NO_DATA_MESSAGE, VisualizeTool};
