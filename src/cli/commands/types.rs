//! types command - List the built-in execution types

use super::Context;
use crate::engine::modes::ExecutionTypes;
use crate::ui::output;
use anyhow::Result;
use serde_json::{json, Value};

/// List every built-in execution type with its required run-module count.
pub fn types(ctx: &Context) -> Result<()> {
    let builtin = ExecutionTypes::builtin();
    let types: Vec<_> = builtin.names().filter_map(|name| builtin.get(name)).collect();

    if ctx.json {
        let entries: Vec<Value> = types
            .iter()
            .map(|ty| json!({"name": ty.name, "run_modules": ty.run_modules}))
            .collect();
        output::json(&Value::Array(entries));
    } else {
        let lines: Vec<String> = types
            .iter()
            .map(|ty| format!("{} (run modules: {})", ty.name, ty.run_modules))
            .collect();
        output::print(output::format_list(&lines, ""), ctx.verbosity);
    }

    Ok(())
}
