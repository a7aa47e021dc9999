//! engine::census
//!
//! Post-discovery scans: the run entry and the pulse hooks.
//!
//! A run-module count that does not match the execution type is logged as an
//! ERR diagnostic and never raised; the lifecycle still runs.

use std::fmt::Write as _;

use super::capabilities::Hook;
use super::ledger::{codes, Severity};
use super::module::ModuleRef;
use super::Chassis;
use crate::core::ops::{GuardedPhase, PromiseError};

/// Outcome of the run-module scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCensus {
    /// One run module was required and exactly one was found.
    Designated(String),
    /// The count matched a requirement other than one.
    Satisfied,
    /// More run modules than required; carries their names.
    TooMany(Vec<String>),
    /// Fewer run modules than required.
    Missing,
}

/// Designate the run entry.
///
/// # Errors
///
/// [`PromiseError::AlreadyLocked`] if the scan already ran.
pub fn find_run_module(chassis: &mut Chassis) -> Result<RunCensus, PromiseError> {
    chassis.guard_mut().enter(GuardedPhase::FindRunModule)?;

    let candidates: Vec<ModuleRef> = chassis
        .modules()
        .iter()
        .filter(|m| m.hooks().has(&Hook::Run))
        .cloned()
        .collect();
    let required = chassis.execution_type().run_modules;

    let census = if candidates.len() == required {
        match candidates.into_iter().next() {
            Some(module) if required == 1 => {
                let name = module.name().to_string();
                chassis.set_run_module(module);
                RunCensus::Designated(name)
            }
            _ => RunCensus::Satisfied,
        }
    } else if candidates.len() > required {
        let names: Vec<String> = candidates.iter().map(|m| m.name().to_string()).collect();
        let mut message = String::from(
            "There should only be one module with a run hook,\nbut these modules all define one:\n",
        );
        for name in &names {
            let _ = writeln!(message, "  {}", name);
        }
        chassis.log(
            Severity::Err,
            codes::TOO_MANY_RUN_MODULES,
            "Too Many Run Modules",
            message,
        );
        RunCensus::TooMany(names)
    } else {
        let mut message = String::from("No registered module defines a run hook:\n");
        if chassis.modules().is_empty() {
            message.push_str("  (no modules)\n");
        }
        for name in chassis.modules().names() {
            let _ = writeln!(message, "  {}", name);
        }
        chassis.log(
            Severity::Err,
            codes::NO_RUN_MODULE,
            "No Run Module",
            message,
        );
        RunCensus::Missing
    };

    chassis.guard_mut().complete(GuardedPhase::FindRunModule)?;
    tracing::debug!(?census, "run module census");
    Ok(census)
}

/// Collect every module with a pulse hook, in list order.
///
/// Returns the number collected.
pub fn find_pulsers(chassis: &mut Chassis) -> Result<usize, PromiseError> {
    chassis.guard_mut().enter(GuardedPhase::FindPulsers)?;

    let pulsers: Vec<ModuleRef> = chassis
        .modules()
        .iter()
        .filter(|m| m.hooks().has(&Hook::Pulse))
        .cloned()
        .collect();
    let count = pulsers.len();
    chassis.set_pulsers(pulsers);

    chassis.guard_mut().complete(GuardedPhase::FindPulsers)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::ProgramDescriptor;
    use crate::engine::capabilities::HookSet;
    use crate::engine::modes::names;
    use crate::engine::module::ChassisModule;
    use std::rc::Rc;

    struct Hooked {
        name: &'static str,
        hooks: HookSet,
    }

    impl ChassisModule for Hooked {
        fn name(&self) -> &str {
            self.name
        }

        fn hooks(&self) -> HookSet {
            self.hooks.clone()
        }
    }

    fn chassis(exec: &str, modules: &[(&'static str, &[Hook])]) -> Chassis {
        let mut chassis = Chassis::new(ProgramDescriptor::new(exec)).unwrap();
        for &(name, hooks) in modules {
            chassis.modules_mut().register(Rc::new(Hooked {
                name,
                hooks: HookSet::with(hooks.iter().copied()),
            }));
        }
        chassis
    }

    mod run_module {
        use super::*;

        #[test]
        fn one_of_one_is_designated() {
            let mut c = chassis(names::CLITOOL, &[("tool", &[Hook::Run]), ("lib", &[])]);
            assert_eq!(
                find_run_module(&mut c).unwrap(),
                RunCensus::Designated("tool".into())
            );
            assert_eq!(c.run_module().map(|m| m.name()), Some("tool"));
            assert!(!c.logger().has_errors());
        }

        #[test]
        fn two_of_one_logs_too_many() {
            let mut c = chassis(names::CLITOOL, &[("a", &[Hook::Run]), ("b", &[Hook::Run])]);
            assert_eq!(
                find_run_module(&mut c).unwrap(),
                RunCensus::TooMany(vec!["a".into(), "b".into()])
            );
            assert!(c.run_module().is_none());

            let entry = c.logger().with_code(codes::TOO_MANY_RUN_MODULES).next().unwrap();
            assert_eq!(entry.severity, Severity::Err);
            assert_eq!(entry.title, "Too Many Run Modules");
            assert!(entry.message.contains("  a\n"));
            assert!(entry.message.contains("  b\n"));
        }

        #[test]
        fn none_of_one_logs_no_run_module() {
            let mut c = chassis(names::CLITOOL, &[("lib", &[Hook::Stage])]);
            assert_eq!(find_run_module(&mut c).unwrap(), RunCensus::Missing);
            let entry = c.logger().with_code(codes::NO_RUN_MODULE).next().unwrap();
            assert_eq!(entry.title, "No Run Module");
            assert!(entry.message.contains("  lib\n"));
        }

        #[test]
        fn no_modules_says_so() {
            let mut c = chassis(names::CLITOOL, &[]);
            find_run_module(&mut c).unwrap();
            let entry = c.logger().with_code(codes::NO_RUN_MODULE).next().unwrap();
            assert!(entry.message.contains("(no modules)"));
        }

        #[test]
        fn run_hook_in_zero_mode_is_too_many() {
            let mut c = chassis(names::WEBSERVER, &[("a", &[Hook::Run])]);
            assert_eq!(
                find_run_module(&mut c).unwrap(),
                RunCensus::TooMany(vec!["a".into()])
            );
        }

        #[test]
        fn zero_of_zero_is_satisfied() {
            let mut c = chassis(names::WEBSERVER, &[("a", &[Hook::Stage])]);
            assert_eq!(find_run_module(&mut c).unwrap(), RunCensus::Satisfied);
            assert!(c.logger().entries().is_empty());
        }

        #[test]
        fn second_scan_fails() {
            let mut c = chassis(names::WEBSERVER, &[]);
            find_run_module(&mut c).unwrap();
            assert!(matches!(
                find_run_module(&mut c),
                Err(PromiseError::AlreadyLocked(_))
            ));
        }
    }

    mod pulsers {
        use super::*;

        #[test]
        fn collects_in_list_order() {
            let mut c = chassis(
                names::WEBSERVER,
                &[
                    ("b", &[Hook::Pulse]),
                    ("x", &[Hook::Stage]),
                    ("a", &[Hook::Pulse, Hook::Stage]),
                ],
            );
            assert_eq!(find_pulsers(&mut c).unwrap(), 2);
            let names: Vec<_> = c.pulsers().iter().map(|m| m.name()).collect();
            assert_eq!(names, vec!["b", "a"]);
        }

        #[test]
        fn second_scan_fails() {
            let mut c = chassis(names::WEBSERVER, &[]);
            find_pulsers(&mut c).unwrap();
            assert!(find_pulsers(&mut c).is_err());
        }
    }
}
