// Library exports for the binary and tests
pub mod activity;
pub mod directory;
pub mod history;
pub mod logging;
pub mod matcher;
pub mod progress;
pub mod ranking;
pub mod renderer;
pub mod report;
pub mod secrets;
pub mod slack;
pub mod snapshot;
pub mod timefmt;
pub mod window;
