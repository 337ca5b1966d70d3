//! `nbsetup validate`: semantic checks on an input directory, no NetBox.

use nbsetup_core::document::{load_dir, validate};

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let doc = load_dir(&args.input_dir)?;
    let findings = validate(&doc);
    let color = output::should_color(global.color);

    if findings.is_empty() {
        output::print_output(
            &format!("✓ {} is valid", args.input_dir.display()),
            global.quiet,
        );
        return Ok(());
    }

    // Findings are the command's result, so quiet mode still shows them.
    print!("{}", output::render_findings(&findings, color));
    Err(CliError::InvalidDocument {
        count: findings.len(),
    })
}
