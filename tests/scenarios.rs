use nalgebra::{distance, point};
use octpath::{
    find_path,
    spatial::{Aabb, BoxField},
    Graph, Octree, OctreeSettings, PathResult, Reach, Real, Search, SearchError, SearchMode,
    SharedOctree, Status, StepBudget, Target, Unbounded, WorldPoint,
};

fn baked(settings: OctreeSettings, field: &BoxField) -> Octree {
    let mut tree = Octree::new(settings).unwrap();
    tree.bake(field).unwrap();
    tree
}

fn length(points: &[WorldPoint]) -> Real {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Size 8, depth 3, with one obstacle inside the unit cell just above the center.
fn pebble() -> (Octree, BoxField) {
    let field = BoxField::new().with(Aabb::new(point![0.1, 0.1, 0.1], point![0.9, 0.9, 0.9]));
    let tree = baked(OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 3), &field);
    (tree, field)
}

#[test]
fn empty_root_is_one_leaf() {
    let field = BoxField::new();
    let tree = baked(OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 0), &field);
    assert_eq!(tree.len(), 1);
    assert!(tree.leaves().all(|l| l.is_transitable()));

    let (a, b) = (point![-3.0, 1.0, 2.0], point![3.5, -2.0, 0.0]);
    for mode in [SearchMode::Dijkstra, SearchMode::AStar, SearchMode::Theta] {
        let nav = tree.navigator().with_sight(&field);
        let path = find_path(&nav, a, b, mode, Unbounded)
            .unwrap()
            .into_path()
            .unwrap();
        assert_eq!(path.waypoints, vec![a, b]);
        assert_eq!(path.cost, 0.0);
    }
}

#[test]
fn fully_blocked_root() {
    let field = BoxField::new().with(Aabb::new(
        point![-10.0, -10.0, -10.0],
        point![10.0, 10.0, 10.0],
    ));
    let tree = baked(OctreeSettings::new(point![0.0, 0.0, 0.0], 8.0, 3), &field);
    assert_eq!(tree.len(), 1);
    assert!(tree.leaves().all(|l| !l.is_transitable()));

    let res = find_path(
        &tree.navigator(),
        point![-1.0, 0.0, 0.0],
        point![1.0, 0.0, 0.0],
        SearchMode::AStar,
        Unbounded,
    )
    .unwrap();
    assert_eq!(res, PathResult::NotFound);
}

#[test]
fn routes_around_small_obstacle() {
    let (tree, field) = pebble();
    let blocked: Vec<_> = tree.leaves().filter(|l| !l.is_transitable()).collect();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].center, point![0.5, 0.5, 0.5]);
    assert_eq!(tree.leaves().filter(|l| l.is_transitable()).count(), 21);

    let (from, to) = (point![-3.0, 0.5, 0.5], point![3.0, 0.5, 0.5]);
    let straight = distance(&from, &to);
    assert!(field.iter().any(|b| b.intersects_segment(&from, &to)));

    for mode in [SearchMode::AStar, SearchMode::Theta] {
        let nav = tree.navigator().with_sight(&field);
        let path = find_path(&nav, from, to, mode, Unbounded)
            .unwrap()
            .into_path()
            .unwrap();
        assert_eq!(path.start(), Some(&from));
        assert_eq!(path.end(), Some(&to));
        assert!(path.len() >= 3, "{mode:?} went straight through: {path:?}");
        assert!(length(&path.waypoints) > straight);
        for leg in path.waypoints.windows(2) {
            assert!(field.iter().all(|b| !b.intersects_segment(&leg[0], &leg[1])));
        }
    }
}

#[test]
fn reach_ends_on_leaf_center() {
    let (tree, _) = pebble();
    let nav = tree.navigator();
    let goal = nav.closest_node(&point![3.0, 3.0, 3.0]).unwrap();
    let from = point![-3.0, -3.0, -3.0];

    let mut search = Search::new(from, Reach(goal), SearchMode::AStar);
    assert_eq!(search.run(&nav, Unbounded).unwrap(), Status::Found);
    let path = search.finalize(&nav).unwrap().into_path().unwrap();
    assert_eq!(path.start(), Some(&from));
    assert_eq!(path.end(), Some(&nav.position(&goal)));
}

#[test]
fn zero_budget_times_out() {
    let (tree, _) = pebble();
    let res = find_path(
        &tree.navigator(),
        point![-3.0, 0.5, 0.5],
        point![3.0, 0.5, 0.5],
        SearchMode::AStar,
        StepBudget::new(0),
    )
    .unwrap();
    assert_eq!(res, PathResult::TimedOut);
}

#[test]
fn time_sliced_over_shared_tree() {
    let (tree, field) = pebble();
    let shared = SharedOctree::from(tree);
    let (from, to) = (point![-3.5, -3.5, -3.5], point![3.5, 3.5, 3.5]);

    let mut search = Search::new(from, Target::new(to), SearchMode::Theta);
    let mut slices = 0;
    loop {
        slices += 1;
        let tree = shared.read();
        let nav = tree.navigator().with_sight(&field);
        match search.run(&nav, StepBudget::new(4)).unwrap() {
            Status::TimedOut => continue,
            status => {
                assert_eq!(status, Status::Found);
                break;
            }
        }
    }
    assert!(slices > 1);
    let tree = shared.read();
    let sliced = search
        .finalize(&tree.navigator().with_sight(&field))
        .unwrap()
        .into_path()
        .unwrap();
    let whole = find_path(
        &tree.navigator().with_sight(&field),
        from,
        to,
        SearchMode::Theta,
        Unbounded,
    )
    .unwrap()
    .into_path()
    .unwrap();
    assert_eq!(sliced, whole);
}

#[test]
fn rebake_invalidates_suspended_search() {
    let (tree, field) = pebble();
    let shared = SharedOctree::from(tree);
    let (from, to) = (point![-3.5, -3.5, -3.5], point![3.5, 3.5, 3.5]);

    let mut search = Search::new(from, Target::new(to), SearchMode::AStar);
    {
        let tree = shared.read();
        let status = search.run(&tree.navigator(), StepBudget::new(2)).unwrap();
        assert_eq!(status, Status::TimedOut);
    }
    let before = shared.generation();
    shared.rebake(&field).unwrap();
    assert_ne!(shared.generation(), before);

    let tree = shared.read();
    let err = search.run(&tree.navigator(), Unbounded).unwrap_err();
    assert_eq!(
        err,
        SearchError::StaleGraph {
            expected: before,
            found: tree.generation(),
        }
    );
}
