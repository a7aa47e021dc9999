//! engine::runner
//!
//! Drives the frozen module list through the lifecycle.
//!
//! # Architecture
//!
//! ```text
//! prepare:  gather_modules -> find_run_module -> find_pulsers -> interlink
//! setup:    INIT -> SETUP -> LOAD -> POSTLOAD -> INTERLINK
//! run:      RUNSTART -> run entry | fallback -> RUNSTOP
//! teardown: PRECLOSE -> SAVE -> POSTSAVE -> TEARDOWN
//! ```
//!
//! [`run_all`] executes all four unconditionally; callers that want to stop
//! after a bad census use [`prepare`] and inspect the log themselves.
//!
//! # Invariants
//!
//! - The current stage is recorded before any hook of that stage runs
//! - Modules are visited in list order; a module without the stage hook is
//!   skipped
//! - The first hook error aborts the transition and propagates
//!
//! # Example
//!
//! ```
//! use chassis::core::descriptor::ProgramDescriptor;
//! use chassis::engine::runner::run_all;
//! use chassis::engine::source::ModuleCatalog;
//! use chassis::engine::stage::Stage;
//! use chassis::engine::Chassis;
//!
//! let mut chassis = Chassis::new(ProgramDescriptor::new("WEBSERVER")).unwrap();
//! run_all(&mut chassis, &mut ModuleCatalog::new()).unwrap();
//! assert_eq!(chassis.stage(), Some(Stage::Teardown));
//! ```

use super::capabilities::Hook;
use super::census::{find_pulsers, find_run_module, RunCensus};
use super::discovery::gather_modules;
use super::interlink::interlink;
use super::source::ModuleSource;
use super::stage::{Phase, Stage};
use super::{Chassis, ChassisError};

/// Discover, take the census, collect pulsers and interlink.
///
/// Returns the run-module census so the caller can decide whether to go on.
pub fn prepare(
    chassis: &mut Chassis,
    source: &mut dyn ModuleSource,
) -> Result<RunCensus, ChassisError> {
    gather_modules(chassis, source)?;
    let census = find_run_module(chassis)?;
    let pulsers = find_pulsers(chassis)?;
    interlink(chassis)?;

    tracing::debug!(
        modules = chassis.modules().len(),
        pulsers,
        "prepared"
    );
    Ok(census)
}

/// Prepare, then run every phase.
pub fn run_all(
    chassis: &mut Chassis,
    source: &mut dyn ModuleSource,
) -> Result<RunCensus, ChassisError> {
    let census = prepare(chassis, source)?;
    perform_setup(chassis)?;
    perform_run(chassis)?;
    perform_teardown(chassis)?;
    Ok(census)
}

/// Record `stage` and call every module's stage hook.
pub fn perform_stage(chassis: &mut Chassis, stage: Stage) -> Result<(), ChassisError> {
    chassis.set_stage(stage);
    tracing::debug!(%stage, "entering stage");

    for module in chassis.modules().snapshot() {
        if !module.hooks().has(&Hook::Stage) {
            continue;
        }
        module
            .stage(chassis)
            .map_err(|source| ChassisError::Hook {
                module: module.name().to_string(),
                hook: Hook::Stage,
                source,
            })?;
    }

    Ok(())
}

fn perform_phase(chassis: &mut Chassis, phase: Phase) -> Result<(), ChassisError> {
    for stage in phase.stages() {
        perform_stage(chassis, *stage)?;
    }
    Ok(())
}

/// INIT through INTERLINK.
pub fn perform_setup(chassis: &mut Chassis) -> Result<(), ChassisError> {
    perform_phase(chassis, Phase::Setup)
}

/// RUNSTART, the run entry (or the execution type's fallback), RUNSTOP.
pub fn perform_run(chassis: &mut Chassis) -> Result<(), ChassisError> {
    perform_stage(chassis, Stage::RunStart)?;

    if let Some(module) = chassis.run_module().cloned() {
        tracing::debug!(module = module.name(), "running run entry");
        module.run(chassis).map_err(|source| ChassisError::Hook {
            module: module.name().to_string(),
            hook: Hook::Run,
            source,
        })?;
    } else if let Some(fallback) = chassis.execution_type().fallback.clone() {
        let execution_type = chassis.execution_type().name.clone();
        tracing::debug!(%execution_type, "running execution type fallback");
        (*fallback)(chassis).map_err(|source| ChassisError::Fallback {
            execution_type,
            source,
        })?;
    }

    perform_stage(chassis, Stage::RunStop)
}

/// PRECLOSE through TEARDOWN.
pub fn perform_teardown(chassis: &mut Chassis) -> Result<(), ChassisError> {
    perform_phase(chassis, Phase::Teardown)
}

/// Call every pulse hook once, in list order.
pub fn pulse(chassis: &mut Chassis) -> Result<(), ChassisError> {
    for module in chassis.pulsers().to_vec() {
        module.pulse(chassis).map_err(|source| ChassisError::Hook {
            module: module.name().to_string(),
            hook: Hook::Pulse,
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::ProgramDescriptor;
    use crate::engine::capabilities::HookSet;
    use crate::engine::modes::{names, ExecutionType, ExecutionTypes};
    use crate::engine::module::{ChassisModule, HookError, ModuleRef};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        hooks: HookSet,
        trace: Trace,
        fail_at: Option<Stage>,
    }

    impl ChassisModule for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn hooks(&self) -> HookSet {
            self.hooks.clone()
        }

        fn stage(&self, chassis: &mut Chassis) -> Result<(), HookError> {
            let stage = chassis.stage().ok_or_else(|| HookError::failed("no stage"))?;
            if self.fail_at == Some(stage) {
                return Err(HookError::failed(format!("{} refused {}", self.name, stage)));
            }
            self.trace.borrow_mut().push(format!("{}:{}", self.name, stage));
            Ok(())
        }

        fn run(&self, _chassis: &mut Chassis) -> Result<(), HookError> {
            self.trace.borrow_mut().push(format!("{}:run", self.name));
            Ok(())
        }

        fn pulse(&self, _chassis: &mut Chassis) -> Result<(), HookError> {
            self.trace.borrow_mut().push(format!("{}:pulse", self.name));
            Ok(())
        }
    }

    fn recorder(name: &'static str, hooks: &[Hook], trace: &Trace) -> ModuleRef {
        Rc::new(Recorder {
            name,
            hooks: HookSet::with(hooks.iter().copied()),
            trace: Rc::clone(trace),
            fail_at: None,
        })
    }

    fn chassis_with(exec: &str, modules: Vec<ModuleRef>) -> Chassis {
        let mut chassis = Chassis::new(ProgramDescriptor::new(exec)).unwrap();
        for m in modules {
            chassis.register_module(m).unwrap();
        }
        chassis
    }

    mod stages {
        use super::*;

        #[test]
        fn visits_every_stage_and_module_in_order() {
            let trace = Trace::default();
            let mut chassis = chassis_with(
                names::WEBSERVER,
                vec![
                    recorder("a", &[Hook::Stage], &trace),
                    recorder("quiet", &[], &trace),
                    recorder("b", &[Hook::Stage], &trace),
                ],
            );

            perform_setup(&mut chassis).unwrap();
            perform_run(&mut chassis).unwrap();
            perform_teardown(&mut chassis).unwrap();

            let expected: Vec<String> = Stage::ALL
                .iter()
                .flat_map(|s| [format!("a:{s}"), format!("b:{s}")])
                .collect();
            assert_eq!(*trace.borrow(), expected);
            assert_eq!(chassis.stage(), Some(Stage::Teardown));
        }

        #[test]
        fn hook_error_aborts_and_names_module() {
            let trace = Trace::default();
            let failing: ModuleRef = Rc::new(Recorder {
                name: "grumpy",
                hooks: HookSet::with([Hook::Stage]),
                trace: Rc::clone(&trace),
                fail_at: Some(Stage::Load),
            });
            let mut chassis = chassis_with(
                names::WEBSERVER,
                vec![failing, recorder("after", &[Hook::Stage], &trace)],
            );

            let err = perform_setup(&mut chassis).unwrap_err();
            assert!(matches!(
                err,
                ChassisError::Hook { ref module, hook: Hook::Stage, .. } if module == "grumpy"
            ));
            assert_eq!(chassis.stage(), Some(Stage::Load));
            assert!(!trace.borrow().iter().any(|t| t == "after:LOAD"));
        }
    }

    mod run_phase {
        use super::*;

        #[test]
        fn run_entry_between_runstart_and_runstop() {
            let trace = Trace::default();
            let mut source = crate::engine::source::ModuleCatalog::new();
            source.bind_name("tool", recorder("tool", &[Hook::Stage, Hook::Run], &trace));
            let descriptor = ProgramDescriptor::new(names::CLITOOL).with_modules(
                crate::core::types::ModuleAddresses::default().with_name("tool"),
            );
            let mut chassis = Chassis::new(descriptor).unwrap();

            run_all(&mut chassis, &mut source).unwrap();

            let trace = trace.borrow();
            let start = trace.iter().position(|t| t == "tool:RUNSTART").unwrap();
            let run = trace.iter().position(|t| t == "tool:run").unwrap();
            let stop = trace.iter().position(|t| t == "tool:RUNSTOP").unwrap();
            assert!(start < run && run < stop);
        }

        #[test]
        fn fallback_runs_without_run_entry() {
            let ran = Rc::new(RefCell::new(false));
            let flag = Rc::clone(&ran);
            let mut types = ExecutionTypes::builtin();
            types.register(ExecutionType::new("BATCH", 0).with_fallback(move |chassis| {
                assert_eq!(chassis.stage(), Some(Stage::RunStart));
                *flag.borrow_mut() = true;
                Ok(())
            }));
            let mut chassis =
                Chassis::with_execution_types(ProgramDescriptor::new("BATCH"), types).unwrap();

            perform_run(&mut chassis).unwrap();
            assert!(*ran.borrow());
            assert_eq!(chassis.stage(), Some(Stage::RunStop));
        }

        #[test]
        fn fallback_error_is_reported() {
            let mut types = ExecutionTypes::new();
            types.register(
                ExecutionType::new("BATCH", 0).with_fallback(|_| Err(HookError::failed("boom"))),
            );
            let mut chassis =
                Chassis::with_execution_types(ProgramDescriptor::new("BATCH"), types).unwrap();

            let err = perform_run(&mut chassis).unwrap_err();
            assert!(matches!(err, ChassisError::Fallback { .. }));
            assert!(err.to_string().contains("BATCH"));
        }
    }

    mod pulses {
        use super::*;

        #[test]
        fn pulse_calls_each_pulser_once() {
            let trace = Trace::default();
            let mut chassis = chassis_with(
                names::WEBSERVER,
                vec![
                    recorder("p1", &[Hook::Pulse], &trace),
                    recorder("idle", &[], &trace),
                    recorder("p2", &[Hook::Pulse], &trace),
                ],
            );
            find_pulsers(&mut chassis).unwrap();

            pulse(&mut chassis).unwrap();
            pulse(&mut chassis).unwrap();
            assert_eq!(
                *trace.borrow(),
                vec!["p1:pulse", "p2:pulse", "p1:pulse", "p2:pulse"]
            );
        }
    }

    mod prepare_phase {
        use super::*;
        use crate::engine::source::ModuleCatalog;

        #[test]
        fn prepare_twice_fails() {
            let mut chassis = Chassis::new(ProgramDescriptor::new(names::WEBSERVER)).unwrap();
            let mut source = ModuleCatalog::new();
            assert_eq!(prepare(&mut chassis, &mut source).unwrap(), RunCensus::Satisfied);
            assert!(matches!(
                prepare(&mut chassis, &mut source),
                Err(ChassisError::Discovery(_))
            ));
        }

        #[test]
        fn reset_allows_a_second_prepare() {
            let mut chassis = Chassis::new(ProgramDescriptor::new(names::WEBSERVER)).unwrap();
            let mut source = ModuleCatalog::new();
            prepare(&mut chassis, &mut source).unwrap();
            chassis.reset();
            prepare(&mut chassis, &mut source).unwrap();
        }
    }
}
