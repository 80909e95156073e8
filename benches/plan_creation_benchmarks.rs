use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pipeline_core::config::PlanCreationConfig;
use pipeline_core::graph::GraphGenerator;
use pipeline_core::models::{Ambiance, ExecutionMode, Level, NodeExecution, StepType};
use pipeline_core::{PlanCreatorService, Status};
use tokio::runtime::Runtime;

/// Pipeline with `count` sequential steps
fn pipeline(count: usize) -> String {
    let mut yaml = String::from("execution:\n  steps:\n");
    for i in 0..count {
        yaml.push_str(&format!(
            "    - step:\n        identifier: step_{i}\n        type: ShellScript\n"
        ));
    }
    yaml
}

fn benchmark_plan_creation(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let service = PlanCreatorService::with_defaults(PlanCreationConfig::default());
    let small = pipeline(5);
    let large = pipeline(100);

    c.bench_function("plan_creation_5_steps", |b| {
        b.iter(|| runtime.block_on(service.create_plan(black_box(&small))))
    });
    c.bench_function("plan_creation_100_steps", |b| {
        b.iter(|| runtime.block_on(service.create_plan(black_box(&large))))
    });
}

fn benchmark_graph_generation(c: &mut Criterion) {
    let executions: Vec<NodeExecution> = (0..500)
        .map(|i| {
            let ambiance = Ambiance::new("pe-bench", "plan-bench").clone_for_child(Level::new(
                format!("node-{i}"),
                format!("rt-{i}"),
                format!("step_{i}"),
                StepType::step("ShellScript"),
                None,
            ));
            let mut execution =
                NodeExecution::started(ambiance, format!("step_{i}"), ExecutionMode::Task);
            if i > 0 {
                execution.previous_id = Some(format!("rt-{}", i - 1));
            }
            execution.next_id = Some(format!("rt-{}", i + 1));
            execution
        })
        .collect();
    let generator = GraphGenerator::new();

    c.bench_function("graph_generation_500_nodes", |b| {
        b.iter(|| generator.generate_dto("pe-bench", Status::Running, black_box(&executions)))
    });
}

criterion_group!(benches, benchmark_plan_creation, benchmark_graph_generation);
criterion_main!(benches);
