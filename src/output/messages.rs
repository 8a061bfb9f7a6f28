//! One-line status messages on stdout

pub const ICON_GOOD: &str = "✔";
pub const ICON_WARN: &str = "⚠";
pub const ICON_BAD: &str = "✗";

pub fn good(msg: &str) {
    println!("{} {}", ICON_GOOD, msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", ICON_WARN, msg);
}

pub fn bad(msg: &str) {
    println!("{} {}", ICON_BAD, msg);
}
