//! run command - Drive the discovered modules through the lifecycle

use super::{check_errors, open_program, print_summary, summary_json, Context};
use crate::engine::runner::{perform_run, perform_setup, perform_teardown, prepare};
use crate::ui::output;
use anyhow::Result;
use serde_json::json;

/// Run the full lifecycle, ticking pulse hooks `pulses` times between the
/// run phase and teardown.
pub fn run(ctx: &Context, pulses: usize) -> Result<()> {
    let (mut chassis, mut catalog) = open_program(ctx)?;
    let census = prepare(&mut chassis, &mut catalog)?;

    perform_setup(&mut chassis)?;
    perform_run(&mut chassis)?;
    for tick in 0..pulses {
        output::debug(format!("pulse {}", tick + 1), ctx.verbosity);
        chassis.pulse()?;
    }
    perform_teardown(&mut chassis)?;

    let logger = chassis.logger();
    let snowflakes = chassis.snowflakes().export();

    if ctx.json {
        let mut report = summary_json(&chassis, &census);
        report["stage"] = json!(chassis.stage());
        report["log"] = json!(logger.entries());
        report["ringlog"] = json!(logger.ring().collect::<Vec<_>>());
        report["noticed"] = json!(logger.noticed());
        report["snowflakes"] = json!(snowflakes);
        output::json(&report);
    } else {
        print_summary(&chassis, &census, ctx.verbosity);
        output::print(logger.render_log().trim_end(), ctx.verbosity);
        output::print(logger.render_ring_log().trim_end(), ctx.verbosity);
        output::print(logger.render_noticed().trim_end(), ctx.verbosity);
        output::print("snowflakes:", ctx.verbosity);
        if snowflakes.is_empty() {
            output::print("  - (nothing)", ctx.verbosity);
        } else {
            let lines: Vec<String> = snowflakes
                .iter()
                .map(|(name, next)| format!("{}: {}", name, next))
                .collect();
            output::print(output::format_list(&lines, "  - "), ctx.verbosity);
        }
    }

    check_errors(&chassis)
}
