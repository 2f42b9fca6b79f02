pub mod headless;

pub use headless::launch_isolated_browser;
