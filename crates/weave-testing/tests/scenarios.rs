use std::cell::RefCell;

use weave_core::{Dispatch, FiberId, HostOp, MutationKind, WorkTag};
use weave_testing::prelude::*;

fn counter_app(cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    let (num, set_num) = cx.use_state(9990);
    Ok(Element::host("div")
        .on("onClick", move |_| set_num.set(89989789))
        .child(num)
        .into())
}

fn div_fiber(rule: &RootTestRule) -> FiberId {
    rule.inspect(|tree| tree.find(|tree, fiber| tree.host_tag(fiber) == Some("div")))
        .expect("div fiber")
}

#[test]
fn click_updates_only_the_text_unit() {
    run_test_root(|rule| {
        rule.set_content(Element::component(component!(counter_app)))
            .expect("mount");
        assert_eq!(rule.markup(), "<div>9990</div>");
        let div = rule.node_by_tag("div");
        let div_before = div_fiber(rule);
        rule.take_host_ops();

        assert!(rule.click(div).expect("click"));

        let commit = rule.last_commit();
        assert_eq!(commit.len(), 1);
        let update = commit.mutations()[0];
        assert_eq!(update.kind, MutationKind::Update);
        assert_eq!(update.tag, WorkTag::HostText);

        let div_after = div_fiber(rule);
        rule.inspect(|tree| {
            assert!(tree.same_unit(div_after, div_before));
            assert_eq!(tree.host_instance(div_after), Some(&div));
        });
        assert_eq!(rule.text_content(), "89989789");
        let ops = rule.take_host_ops();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], HostOp::UpdateText { text, .. } if text == "89989789"));
    });
}

#[test]
fn clicking_again_with_the_same_value_commits_nothing() {
    run_test_root(|rule| {
        rule.set_content(Element::component(component!(counter_app)))
            .expect("mount");
        let div = rule.node_by_tag("div");
        rule.click(div).expect("first click");
        rule.click(div).expect("second click");
        assert!(rule.last_commit().is_empty());
        assert_eq!(rule.text_content(), "89989789");
    });
}

thread_local! {
    static SWITCH: RefCell<Option<Dispatch<i32>>> = RefCell::new(None);
}

fn leaf(_cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    Ok(Element::host("p").child("leaf").into())
}

fn switcher(cx: &mut HookCx, _props: &Props) -> anyhow::Result<Child> {
    let (state, set_state) = cx.use_state(0);
    SWITCH.with(|slot| *slot.borrow_mut() = Some(set_state));
    if state == 3 {
        Ok(Element::component(component!(leaf)).into())
    } else {
        Ok(Element::host("section")
            .child(Element::host("span").child(state))
            .into())
    }
}

fn set_switch(value: i32) {
    let dispatch = SWITCH.with(|slot| slot.borrow().clone()).expect("switcher mounted");
    dispatch.set(value).expect("dispatch");
}

#[test]
fn switching_branch_type_replaces_the_subtree() {
    run_test_root(|rule| {
        rule.set_content(Element::component(component!(switcher)))
            .expect("mount");
        assert_eq!(rule.markup(), "<section><span>0</span></section>");
        let section = rule.node_by_tag("section");
        let span = rule.node_by_tag("span");

        set_switch(3);
        assert_eq!(rule.markup(), "<p>leaf</p>");
        assert!(!rule.is_attached(section));
        assert!(!rule.is_attached(span));
        assert!(rule.host(|host| !host.is_live(section)));

        let commit = rule.last_commit();
        assert_eq!(commit.deletions().count(), 1);
        assert_eq!(commit.placements().count(), 1);
        let placed = commit.placements().next().expect("placement").fiber;
        rule.inspect(|tree| {
            assert_eq!(tree.component_name(placed), Some("leaf"));
            assert_eq!(tree.tag(placed), Some(WorkTag::FunctionComponent));
            assert_eq!(tree.alternate(placed), None);
        });

        set_switch(4);
        assert_eq!(rule.markup(), "<section><span>4</span></section>");
        let remounted = rule.node_by_tag("section");
        assert_ne!(remounted, section);
        assert!(rule.find_by_tag("p").is_empty());
    });
}

#[test]
fn staying_on_the_same_branch_updates_in_place() {
    run_test_root(|rule| {
        rule.set_content(Element::component(component!(switcher)))
            .expect("mount");
        let section = rule.node_by_tag("section");

        set_switch(1);
        set_switch(2);
        assert_eq!(rule.node_by_tag("section"), section);
        assert_eq!(rule.markup(), "<section><span>2</span></section>");
        let commit = rule.last_commit();
        assert_eq!(commit.updates().count(), 1);
        assert_eq!(commit.deletions().count(), 0);
    });
}
