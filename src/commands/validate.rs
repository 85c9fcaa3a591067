//! Validate command implementation.

use proxy_usage_monitor::validate_config;

use super::ConfigSource;

/// Prints every error and warning. Fails when the configuration has errors.
pub fn command_validate(source: ConfigSource) -> anyhow::Result<()> {
    let config = source.load()?;
    let report = validate_config(&config);

    match &source.path {
        Some(path) => println!("🔍 Validating {}", path.display()),
        None => println!("🔍 Validating default configuration"),
    }

    for warning in &report.warnings {
        println!("   ⚠️  {}", warning);
    }
    for error in &report.errors {
        println!("   ❌ {}", error);
    }

    if report.is_valid() {
        println!("✅ Configuration is valid ({} warnings)", report.warnings.len());
        Ok(())
    } else {
        anyhow::bail!(
            "Configuration invalid: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        )
    }
}
