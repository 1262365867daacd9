use super::*;
use anyhow::{anyhow, Result};
use std::collections::HashSet;

/// Validate the complete configuration
pub fn validate_config(config: &BenchConfig) -> Result<()> {
    validate_benchmark_options(&config.benchmark)?;
    validate_launches(&config.launches)?;
    Ok(())
}

/// Validate run options
fn validate_benchmark_options(options: &BenchmarkOptions) -> Result<()> {
    if options.measurement_duration.is_zero() {
        return Err(anyhow!("Measurement duration must be greater than 0"));
    }

    if options.sample_interval.is_zero() {
        return Err(anyhow!("Sample interval must be greater than 0"));
    }

    if options.shutdown_timeout.is_zero() {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if options.build_script.as_os_str().is_empty() {
        return Err(anyhow!("Build script path cannot be empty"));
    }

    Ok(())
}

/// Validate the launch plan
fn validate_launches(launches: &[LaunchDescriptor]) -> Result<()> {
    if launches.is_empty() {
        return Err(anyhow!("At least one launch must be configured"));
    }

    // Check for duplicate labels
    let mut labels = HashSet::new();
    for launch in launches {
        if !labels.insert(&launch.label) {
            return Err(anyhow!("Duplicate launch label: {}", launch.label));
        }

        validate_launch(launch)?;
    }

    Ok(())
}

/// Validate a single launch descriptor
fn validate_launch(launch: &LaunchDescriptor) -> Result<()> {
    if launch.label.is_empty() {
        return Err(anyhow!("Launch label cannot be empty"));
    }

    if launch.label.len() > 64 {
        return Err(anyhow!("Launch label too long (max 64 characters): {}", launch.label));
    }

    // Labels name output files
    if !launch.label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(anyhow!(
            "Launch label can only contain alphanumeric characters, hyphens, and underscores: {}",
            launch.label
        ));
    }

    match launch.command.first() {
        None => Err(anyhow!("Command for {} cannot be empty", launch.label)),
        Some(program) if program.trim().is_empty() => {
            Err(anyhow!("Program for {} cannot be empty", launch.label))
        }
        Some(_) => Ok(()),
    }
}
