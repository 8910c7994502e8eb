use std::path::PathBuf;

/// Get the root of the versioned template project that deploys copy from.
///
/// - `JSONBAY_TEMPLATE_DIR` overrides everything (tests, custom installs).
/// - Otherwise the template ships under `~/.jsonbay/template`.
pub fn template_root() -> Result<PathBuf, std::io::Error> {
    if let Ok(v) = std::env::var("JSONBAY_TEMPLATE_DIR")
        && !v.trim().is_empty()
    {
        return Ok(PathBuf::from(v));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        )
    })?;

    Ok(home.join(".jsonbay").join("template"))
}
