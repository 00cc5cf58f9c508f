use std::cell::RefCell;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weave_core::{
    component, create_root_with_options, Child, Dispatch, Element, HookCx, MemoryHost, Props,
    Root, RootOptions,
};

const DEPTH_SAMPLES: &[usize] = &[16, 64, 256];
const STEADY_DEPTH: usize = 128;

thread_local! {
    static TICK: RefCell<Option<Dispatch<u64>>> = RefCell::new(None);
}

fn ticker(cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    let (ticks, set_ticks) = cx.use_state(0_u64);
    TICK.with(|slot| *slot.borrow_mut() = Some(set_ticks));
    Ok(Element::host("span").prop("class", "ticker").child(ticks).into())
}

fn deep_tree(depth: usize) -> Child {
    let mut child: Child = Element::component(component!(ticker)).into();
    for level in 0..depth {
        child = Element::host("div")
            .prop("data-level", level as i64)
            .child(child)
            .into();
    }
    child
}

fn fresh_root() -> Root<MemoryHost> {
    let mut host = MemoryHost::new();
    let container = host.create_container();
    create_root_with_options(
        host,
        container,
        RootOptions::new().with_name("bench").with_verify_flags(false),
    )
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_mount");
    for &depth in DEPTH_SAMPLES {
        let tree = deep_tree(depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), &tree, |b, tree| {
            b.iter(|| {
                let root = fresh_root();
                root.render(tree.clone()).expect("mount");
                black_box(root.fiber_count());
            });
        });
    }
    group.finish();
}

fn bench_rerender_unchanged(c: &mut Criterion) {
    let root = fresh_root();
    let tree = deep_tree(STEADY_DEPTH);
    // Warm up both generations so steady-state passes are measured.
    root.render(tree.clone()).expect("mount");
    root.render(tree.clone()).expect("warm up");

    c.bench_function("reconcile_rerender_unchanged", |b| {
        b.iter(|| {
            root.render(tree.clone()).expect("rerender");
            black_box(root.last_commit().len());
        });
    });
}

fn bench_state_update(c: &mut Criterion) {
    let root = fresh_root();
    root.render(deep_tree(STEADY_DEPTH)).expect("mount");
    let tick = TICK
        .with(|slot| slot.borrow().clone())
        .expect("ticker mounted");

    c.bench_function("reconcile_state_update", |b| {
        b.iter(|| {
            tick.update(|ticks| ticks + 1).expect("dispatch");
            black_box(root.last_commit().len());
        });
    });
}

criterion_group!(
    reconcile,
    bench_mount,
    bench_rerender_unchanged,
    bench_state_update
);
criterion_main!(reconcile);
