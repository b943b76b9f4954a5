pub mod cdp;
pub mod clipboard;
pub mod page;
pub mod window;
