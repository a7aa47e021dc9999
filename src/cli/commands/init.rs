//! init command - Write a skeleton program descriptor

use super::Context;
use crate::core::descriptor::ProgramDescriptor;
use crate::engine::modes::ExecutionTypes;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};
use serde_json::json;

/// Write a skeleton program descriptor to `ctx.descriptor`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `execution_type` - Built-in execution type to select
/// * `ring_len` - Ring log capacity
/// * `force` - Overwrite an existing descriptor
pub fn init(ctx: &Context, execution_type: &str, ring_len: usize, force: bool) -> Result<()> {
    let known = ExecutionTypes::builtin();
    if known.get(execution_type).is_none() {
        bail!(
            "Unknown execution type '{}' (known: {})",
            execution_type,
            known.names().collect::<Vec<_>>().join(", ")
        );
    }

    let path = &ctx.descriptor;
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let descriptor = ProgramDescriptor::new(execution_type).with_ring_len(ring_len);
    descriptor
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if ctx.json {
        output::json(&json!({
            "descriptor": path.display().to_string(),
            "execution_type": execution_type,
            "ring_len": ring_len,
        }));
    } else {
        output::success(
            format!("Wrote {} ({})", path.display(), execution_type),
            ctx.verbosity,
        );
    }

    Ok(())
}
