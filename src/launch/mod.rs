pub mod assemble;
pub mod natives;

pub use assemble::{assemble_launch, LaunchOptions, LaunchSpec};
pub use natives::extract_natives;

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}
