use serde::Serialize;

/// Build information reported by the health endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Get the build information for this crate
pub fn build_info() -> BuildInfo {
    BuildInfo {
        name: "shroud",
        version: env!("CARGO_PKG_VERSION"),
    }
}
