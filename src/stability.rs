//! Stable Dependencies Principle checks
//!
//! Martin, R. C. (2018). *Clean Architecture*, chapter 14: instability should
//! decrease in the direction of dependency. A module depending on something
//! less stable than itself is flagged.

use std::fmt;

use serde::Serialize;

use crate::metrics::CouplingMetrics;

/// A dependency on a module that is more unstable than the dependent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StableDependencyViolation {
    pub module: String,
    pub module_instability: f64,
    pub dependency: String,
    pub dependency_instability: f64,
}

impl fmt::Display for StableDependencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}'s instability of {:.2} is bigger than {}'s instability of {:.2}, from which it is a dependency",
            self.dependency, self.dependency_instability, self.module, self.module_instability
        )
    }
}

/// Every efferent edge `m -> d` with `I(d) > I(m)`, in module order
pub fn stable_dependency_violations(metrics: &CouplingMetrics) -> Vec<StableDependencyViolation> {
    let mut violations = Vec::new();

    for (module, deps) in &metrics.efferent_set {
        let Some(&module_instability) = metrics.instability.get(module) else {
            continue;
        };
        for dep in deps {
            let Some(&dependency_instability) = metrics.instability.get(dep) else {
                continue;
            };
            if dependency_instability > module_instability {
                violations.push(StableDependencyViolation {
                    module: module.clone(),
                    module_instability,
                    dependency: dep.clone(),
                    dependency_instability,
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ModuleContribution;
    use std::collections::BTreeMap;

    fn depends_on(deps: &[&str]) -> ModuleContribution {
        ModuleContribution {
            concrete_count: 1,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stable_module_depending_on_unstable_one() {
        // core is used by a and b but depends on util, which depends on two others
        let mut modules = BTreeMap::new();
        modules.insert("pkg.a".to_string(), depends_on(&["pkg.core"]));
        modules.insert("pkg.b".to_string(), depends_on(&["pkg.core"]));
        modules.insert("pkg.core".to_string(), depends_on(&["pkg.util"]));
        modules.insert("pkg.util".to_string(), depends_on(&["pkg.x", "pkg.y"]));
        let metrics = CouplingMetrics::aggregate("pkg", 0, modules);

        let violations = stable_dependency_violations(&metrics);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].module, "pkg.core");
        assert_eq!(violations[0].dependency, "pkg.util");
        assert!(violations[0].to_string().starts_with("pkg.util's instability"));
    }

    #[test]
    fn test_no_violation_when_instability_decreases() {
        let mut modules = BTreeMap::new();
        modules.insert("pkg.app".to_string(), depends_on(&["pkg.domain"]));
        modules.insert("pkg.domain".to_string(), depends_on(&[]));
        let metrics = CouplingMetrics::aggregate("pkg", 0, modules);

        assert!(stable_dependency_violations(&metrics).is_empty());
    }
}
