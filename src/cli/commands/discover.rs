//! discover command - Resolve modules and report the run-module census

use super::{check_errors, open_program, print_summary, summary_json, Context};
use crate::engine::runner::prepare;
use crate::ui::output;
use anyhow::Result;
use serde_json::json;

/// Discover modules without running any stage.
pub fn discover(ctx: &Context) -> Result<()> {
    let (mut chassis, mut catalog) = open_program(ctx)?;
    let census = prepare(&mut chassis, &mut catalog)?;

    if ctx.json {
        let mut report = summary_json(&chassis, &census);
        report["log"] = json!(chassis.logger().entries());
        output::json(&report);
    } else {
        print_summary(&chassis, &census, ctx.verbosity);
        if !chassis.logger().entries().is_empty() {
            output::print(chassis.logger().render_log().trim_end(), ctx.verbosity);
        }
    }

    check_errors(&chassis)
}
