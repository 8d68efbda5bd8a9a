/// Get the version string for strata and libstrata
pub fn get_version_string() -> String {
    format!(
        "strata {}\nlibstrata {}",
        env!("CARGO_PKG_VERSION"),
        libstrata::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
