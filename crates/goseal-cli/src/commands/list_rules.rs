//! List rules command implementation.

use goseal::engine::rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<10} {:<18} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for rule in rules::ALL {
        println!("{:<10} {:<18} {}", rule.code, rule.name, rule.description);
    }

    println!("\nDialects:");
    println!("  scoped       - GS001, GS002, GS003 (init-scope, mutation-scope, factory-names)");
    println!("  constructors - GS004 (constructors, struct-packages, allow-same-package)");

    println!("\nRules are driven by the config file, e.g.:");
    println!("  goseal init");
    println!("  goseal check --config .goseal.yml");
}
