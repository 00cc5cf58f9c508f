use std::cell::{Cell, RefCell};

use weave_core::{Action, Dispatch, FiberId, FiberTree, HostNodeId, RenderError};
use weave_testing::prelude::*;

fn greeting(_cx: &mut HookCx, props: &Props) -> anyhow::Result<Child> {
    let name = props
        .get("name")
        .map(ToString::to_string)
        .unwrap_or_default();
    Ok(Element::host("h1").child(format!("hello {name}")).into())
}

fn farewell(_cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    Ok(Element::host("h1").child("bye").into())
}

fn page() -> Element {
    Element::host("main").prop("role", "page").child(
        Element::host("article").child(Element::component(component!(greeting)).prop("name", "ada")),
    )
}

/// Host instances a fiber contributes to its host parent.
fn host_instances(tree: &FiberTree<'_, HostNodeId>, fiber: FiberId) -> Vec<HostNodeId> {
    if let Some(&instance) = tree.host_instance(fiber) {
        return vec![instance];
    }
    let mut found = Vec::new();
    let mut child = tree.child(fiber);
    while let Some(id) = child {
        found.extend(host_instances(tree, id));
        child = tree.sibling(id);
    }
    found
}

fn committed_instances(rule: &RootTestRule) -> Vec<HostNodeId> {
    rule.inspect(|tree| {
        tree.descendants()
            .into_iter()
            .filter_map(|fiber| tree.host_instance(fiber).copied())
            .collect()
    })
}

#[test]
fn unchanged_description_is_idempotent() {
    run_test_root(|rule| {
        rule.set_content(page()).expect("mount");
        let markup = rule.markup();
        rule.take_host_ops();

        for _ in 0..4 {
            rule.set_content(page()).expect("rerender");
            assert!(rule.last_commit().is_empty());
            rule.inspect(|tree| {
                for fiber in tree.descendants() {
                    assert!(tree.flags(fiber).is_empty(), "{fiber:?} kept flags");
                }
            });
        }
        assert!(rule.take_host_ops().is_empty());
        assert_eq!(rule.markup(), markup);
    });
}

#[test]
fn reuse_requires_matching_key_and_type() {
    let same_type = || Element::host("div");
    let cases: Vec<(Element, Element, bool)> = vec![
        (same_type(), same_type(), true),
        (same_type().with_key("a"), same_type().with_key("a"), true),
        (same_type().with_key("a"), same_type().with_key("b"), false),
        (same_type(), same_type().with_key("a"), false),
        (same_type(), Element::host("span"), false),
        (
            Element::component(component!(greeting)),
            Element::component(component!(greeting)),
            true,
        ),
        (
            Element::component(component!(greeting)),
            Element::component(component!(farewell)),
            false,
        ),
        (Element::component(component!(greeting)), same_type(), false),
    ];

    for (index, (before, after, reused)) in cases.into_iter().enumerate() {
        let mut rule = RootTestRule::new();
        rule.set_content(before).expect("mount");
        let (old_fiber, old_hosts) = rule.inspect(|tree| {
            let fiber = tree.child(tree.root()).expect("child");
            (fiber, host_instances(tree, fiber))
        });

        rule.set_content(after).expect("update");
        let (new_fiber, new_hosts) = rule.inspect(|tree| {
            let fiber = tree.child(tree.root()).expect("child");
            assert_eq!(tree.same_unit(fiber, old_fiber), reused, "case {index}");
            (fiber, host_instances(tree, fiber))
        });

        let commit = rule.last_commit();
        if reused {
            assert_eq!(new_hosts, old_hosts, "case {index}");
            assert_eq!(commit.deletions().count(), 0, "case {index}");
        } else {
            assert_eq!(commit.deletions().count(), 1, "case {index}");
            assert!(commit.placements().any(|m| m.fiber == new_fiber), "case {index}");
            for host in old_hosts {
                assert!(!rule.is_attached(host), "case {index}");
            }
        }
    }
}

thread_local! {
    static HANDLES: RefCell<Option<(Dispatch<i64>, Dispatch<String>)>> = RefCell::new(None);
    static SEEN: RefCell<Vec<(i64, String)>> = RefCell::new(Vec::new());
}

fn two_slots(cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    let (total, set_total) = cx.use_state(0_i64);
    let (log, set_log) = cx.use_state_with(String::new);
    HANDLES.with(|slot| *slot.borrow_mut() = Some((set_total, set_log)));
    SEEN.with(|seen| seen.borrow_mut().push((total, log.clone())));
    Ok(Element::host("output").child(format!("{total}:{log}")).into())
}

enum Step {
    Set(i64),
    Apply(fn(i64) -> i64),
}

impl Step {
    fn fold(&self, state: i64) -> i64 {
        match self {
            Step::Set(value) => *value,
            Step::Apply(f) => f(state),
        }
    }

    fn action(&self) -> Action<i64> {
        match *self {
            Step::Set(value) => Action::Replace(value),
            Step::Apply(f) => Action::Reduce(Box::new(move |n: &i64| f(*n))),
        }
    }
}

fn last_seen() -> (i64, String) {
    SEEN.with(|seen| seen.borrow().last().cloned())
        .expect("component rendered")
}

#[test]
fn hook_state_is_the_fold_of_dispatched_actions() {
    let mut rule = RootTestRule::new();
    rule.set_content(Element::component(component!(two_slots)))
        .expect("mount");
    let (set_total, set_log) = HANDLES
        .with(|slot| slot.borrow().clone())
        .expect("mounted");

    let steps = [
        Step::Set(10),
        Step::Apply(|n| n * 3),
        Step::Apply(|n| n - 4),
        Step::Set(-2),
        Step::Apply(|n| n * n),
    ];
    let mut expected_total = 0_i64;
    let mut expected_log = String::new();
    for (index, step) in steps.iter().enumerate() {
        set_total.dispatch(step.action()).expect("dispatch total");
        expected_total = step.fold(expected_total);
        assert_eq!(last_seen().0, expected_total, "step {index}");

        let letter = char::from(b'a' + index as u8);
        set_log
            .update(move |log| format!("{log}{letter}"))
            .expect("dispatch log");
        expected_log.push(letter);

        // Renders without dispatches keep both slots.
        rule.rerender().expect("rerender");
        assert_eq!(last_seen(), (expected_total, expected_log.clone()));
    }
    assert_eq!(expected_total, 4);
    assert_eq!(rule.text_content(), "4:abcde");
}

#[test]
fn placed_instances_are_reachable_and_deleted_ones_are_not() {
    run_test_root(|rule| {
        rule.set_content(page()).expect("mount");
        let mut previous = committed_instances(rule);

        let layouts = [
            Element::host("main").child(Element::host("aside").child("note")),
            Element::host("main").child(Element::component(component!(farewell))),
            Element::host("nav").child(Element::component(component!(greeting))),
            page(),
        ];
        for layout in layouts {
            rule.set_content(layout).expect("swap");
            let commit = rule.last_commit();
            assert!(commit.placements().count() > 0);
            rule.inspect(|tree| {
                for placed in commit.placements() {
                    let hosts = host_instances(tree, placed.fiber);
                    assert!(!hosts.is_empty());
                    for host in hosts {
                        assert!(rule.is_attached(host), "{host} not attached");
                    }
                }
            });

            let current = committed_instances(rule);
            for host in previous.iter().filter(|host| !current.contains(host)) {
                assert!(!rule.is_attached(*host), "{host} still attached");
            }
            for &host in &current {
                assert!(rule.is_attached(host), "{host} detached");
            }
            previous = current;
        }
    });
}

thread_local! {
    static CHILD_FAILS: Cell<bool> = Cell::new(false);
    static COUNT: RefCell<Option<Dispatch<i64>>> = RefCell::new(None);
}

fn fragile(_cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    if CHILD_FAILS.with(Cell::get) {
        anyhow::bail!("fragile child failed");
    }
    Ok("c".into())
}

fn counted(cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    let (n, set_n) = cx.use_state(0_i64);
    COUNT.with(|slot| *slot.borrow_mut() = Some(set_n));
    Ok(Element::host("div")
        .prop("n", n)
        .child(Element::component(component!(fragile)))
        .into())
}

#[test]
fn aborted_pass_keeps_the_dispatched_update() {
    run_test_root(|rule| {
        CHILD_FAILS.with(|fails| fails.set(false));
        rule.set_content(Element::component(component!(counted)))
            .expect("mount");
        assert_eq!(rule.markup(), "<div n=\"0\">c</div>");
        let set_n = COUNT.with(|slot| slot.borrow().clone()).expect("mounted");

        CHILD_FAILS.with(|fails| fails.set(true));
        let err = set_n.set(7).expect_err("child fails");
        assert!(matches!(err, RenderError::Component { component: "fragile", .. }));
        assert_eq!(rule.markup(), "<div n=\"0\">c</div>");

        CHILD_FAILS.with(|fails| fails.set(false));
        rule.rerender().expect("rerender");
        assert_eq!(rule.markup(), "<div n=\"7\">c</div>");
    });
}
