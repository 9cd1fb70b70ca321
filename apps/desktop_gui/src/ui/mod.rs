//! UI layer for the stopwatch window.

pub mod app;

pub use app::StopwatchApp;
