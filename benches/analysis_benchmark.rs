use std::fs;
use std::hint::black_box;
use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};
use py_coupling::{AnalysisOptions, NullDiagnostics, analyze_project};
use tempfile::TempDir;

/// `groups` subpackages of `modules` files each; every file imports from the
/// next file and from the first file of the next group
fn synthetic_project(root: &Path, groups: usize, modules: usize) {
    for g in 0..groups {
        let dir = root.join("bench_pkg").join(format!("group_{}", g));
        fs::create_dir_all(&dir).unwrap();
        for m in 0..modules {
            let next = (m + 1) % modules;
            let next_group = (g + 1) % groups;
            let source = format!(
                "from abc import abstractmethod\n\
                 from bench_pkg.group_{g}.mod_{next} import Thing{next}\n\
                 from bench_pkg.group_{next_group}.mod_0 import Thing0\n\
                 \n\
                 class Thing{m}:\n    @abstractmethod\n    def run(self):\n        pass\n\
                 \n\
                 def helper_{m}():\n    return Thing{next}\n"
            );
            fs::write(dir.join(format!("mod_{}.py", m)), source).unwrap();
        }
    }
}

fn bench_analyze(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    synthetic_project(dir.path(), 10, 20);

    let flat = AnalysisOptions::new(dir.path(), "bench_pkg");
    c.bench_function("analyze_200_files", |b| {
        b.iter(|| analyze_project(black_box(&flat), &NullDiagnostics).unwrap())
    });

    let grouped = AnalysisOptions::new(dir.path(), "bench_pkg").with_level(2);
    c.bench_function("analyze_200_files_grouped", |b| {
        b.iter(|| analyze_project(black_box(&grouped), &NullDiagnostics).unwrap())
    });
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
