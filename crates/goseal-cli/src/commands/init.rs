//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_FILE: &str = ".goseal.yml";

const DEFAULT_CONFIG: &str = r#"# goseal configuration
#
# Structs declared in the target packages are sealed: they may only be
# built with a literal, and have their fields assigned, where the scopes
# below allow it.

# Regexes over module paths whose structs are sealed.
# An empty list seals every package.
target-packages:
  - "::domain"

# Regexes over struct names that stay unsealed.
# exclude-structs:
#   - "Dto$"

# Where sealed structs may be built with a literal:
#   any | same-package | in-target-packages
init-scope: same-package

# Where fields of sealed structs may be assigned directly:
#   any | receiver | same-package | in-target-packages | never
mutation-scope: receiver

# Regexes over function names allowed to build sealed structs.
# factory-names:
#   - "^new"

# Regexes over file paths to skip entirely.
# ignore-files:
#   - "_test\\.rs$"

# What an empty target-packages list means: match-all | match-none
# empty-target-packages: match-all

# Receiver methods that may mutate a struct: any | same-type
# receiver-match: any

# Severity of every finding: error | warning | info
# severity: error
"#;

/// Runs the init command, writing the config into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to list your target packages");
    println!("  2. Run: goseal check");

    Ok(())
}
