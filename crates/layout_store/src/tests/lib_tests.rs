use super::*;
use topology::LayoutConfig;

fn topology(raw: &str) -> Arc<Topology> {
    let config = LayoutConfig::from_toml_str(raw).expect("parse");
    Arc::new(Topology::from_config(&config).expect("topology"))
}

fn rig() -> Arc<Topology> {
    topology(
        r#"
        [[stops]]
        id = "S1"
        [[stacks]]
        id = "K1"
        capacity = 2
        [[tracks]]
        id = "T1"
        slots = 3
        from = "S1"
        to = "K1"
        "#,
    )
}

const S1: LocationRef = LocationRef::Stop(0);
const K1: LocationRef = LocationRef::Stack(0);
const T1: LocationRef = LocationRef::Track(0);

fn mint_at(store: &LayoutStore, location: LocationRef) -> PlateId {
    store
        .transact(|state| {
            let plate = state.mint_plate();
            state.place(location, plate)?;
            Ok(plate)
        })
        .expect("mint")
}

#[test]
fn stop_holds_at_most_one_plate() {
    let mut state = LayoutState::new(rig());
    let plate = state.mint_plate();
    state.place(S1, plate).expect("place");
    assert_eq!(state.occupancy_at(S1), vec![plate]);

    let other = state.mint_plate();
    let err = state.place(S1, other).expect_err("occupied");
    assert!(matches!(err, CoreError::Occupied(_)));
    assert_eq!(state.occupancy_at(S1), vec![plate]);
}

#[test]
fn stack_pushes_and_pops_at_the_top() {
    let mut state = LayoutState::new(rig());
    let first = state.mint_plate();
    let second = state.mint_plate();
    state.place(K1, first).expect("first");
    state.place(K1, second).expect("second");
    assert_eq!(state.occupancy_at(K1), vec![second, first]);

    let third = state.mint_plate();
    let err = state.place(K1, third).expect_err("full");
    assert!(matches!(err, CoreError::Capacity(_)));

    assert_eq!(state.remove(K1).expect("pop"), (K1, second));
    assert_eq!(state.occupancy_at(K1), vec![first]);
}

#[test]
fn bare_track_uses_first_free_and_first_occupied_slot() {
    let mut state = LayoutState::new(rig());
    let a = state.mint_plate();
    let b = state.mint_plate();
    state
        .place(LocationRef::TrackSlot { track: 0, slot: 0 }, a)
        .expect("slot 1");
    let landed = state.place(T1, b).expect("bare track");
    assert_eq!(landed, LocationRef::TrackSlot { track: 0, slot: 1 });
    assert_eq!(state.track_slots(0), &[Some(a), Some(b), None]);

    let (from, plate) = state.remove(T1).expect("remove");
    assert_eq!(from, LocationRef::TrackSlot { track: 0, slot: 0 });
    assert_eq!(plate, a);
}

#[test]
fn removing_from_empty_location_is_empty_error() {
    let mut state = LayoutState::new(rig());
    for location in [S1, K1, T1, LocationRef::TrackSlot { track: 0, slot: 2 }] {
        assert!(matches!(state.remove(location), Err(CoreError::Empty(_))));
    }
}

#[test]
fn initial_stack_plates_get_the_first_ids() {
    let topology = topology(
        r#"
        [[stacks]]
        id = "K1"
        capacity = 5
        initial_plates = 3
        [[stops]]
        id = "S1"
        "#,
    );
    let mut state = LayoutState::new(topology);
    assert_eq!(
        state.occupancy_at(K1),
        vec![PlateId(3), PlateId(2), PlateId(1)]
    );
    assert_eq!(state.mint_plate(), PlateId(4));
    assert_eq!(state.revision(), 0);
}

#[test]
fn locate_finds_plates_anywhere() {
    let mut state = LayoutState::new(rig());
    let plate = state.mint_plate();
    state
        .place(LocationRef::TrackSlot { track: 0, slot: 2 }, plate)
        .expect("place");
    assert_eq!(
        state.locate(plate),
        Some(LocationRef::TrackSlot { track: 0, slot: 2 })
    );
    assert_eq!(state.locate(PlateId(99)), None);
}

#[test]
fn invariant_check_reports_duplicates() {
    let mut state = LayoutState::new(rig());
    let plate = state.mint_plate();
    state.place(S1, plate).expect("stop");
    state.stacks[0].push(plate);
    assert!(state.check_invariants().is_err());
}

#[test]
fn place_rejects_a_plate_held_elsewhere() {
    let mut state = LayoutState::new(rig());
    let plate = state.mint_plate();
    state.place(S1, plate).expect("stop");

    let err = state.place(K1, plate).expect_err("duplicate");
    assert!(matches!(err, CoreError::Internal(_)), "{err}");
    assert_eq!(state.locate(plate), Some(S1));
    assert!(state.occupancy_at(K1).is_empty());
    assert_eq!(state.check_invariants(), Ok(()));
}

#[test]
fn place_rejects_ids_that_were_never_minted() {
    let store = LayoutStore::new(rig());
    let err = store.place(K1, PlateId(1)).expect_err("unissued");
    assert!(matches!(err, CoreError::NotFound(_)), "{err}");
    assert!(matches!(store.place(K1, PlateId(0)), Err(CoreError::NotFound(_))));

    // The id stays free for the next mint.
    let plate = store
        .transact(|state| {
            let plate = state.mint_plate();
            state.place(S1, plate)?;
            Ok(plate)
        })
        .expect("dispense");
    assert_eq!(plate, PlateId(1));
    assert_eq!(store.read(|state| state.check_invariants()), Ok(()));
}

#[test]
fn failed_transaction_is_rolled_back() {
    let store = LayoutStore::new(rig());
    let plate = mint_at(&store, S1);
    let before = store.snapshot();

    let err = store
        .transact(|state| {
            state.remove(S1)?;
            state.place(S1, plate)?;
            state.remove(K1).map(|_| ())
        })
        .expect_err("stack is empty");
    assert!(matches!(err, CoreError::Empty(_)));
    assert_eq!(store.snapshot(), before);

    let err = store
        .transact(|state| {
            let next = state.mint_plate();
            state.place(K1, next)?;
            state.place(T1, plate).map(|_| ())
        })
        .expect_err("duplicate");
    assert!(matches!(err, CoreError::Internal(_)));
    assert_eq!(store.snapshot(), before);
    assert_eq!(mint_at(&store, K1), PlateId(2));
}

#[test]
fn transaction_breaking_an_invariant_is_refused() {
    let store = LayoutStore::new(rig());
    let plate = mint_at(&store, S1);
    let before = store.snapshot();

    let err = store
        .transact(|state| {
            state.stacks[0].push(plate);
            state.mutations += 1;
            Ok(())
        })
        .expect_err("duplicate");
    assert!(matches!(err, CoreError::Internal(_)));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn transact_bumps_revision_only_on_change() {
    let store = LayoutStore::new(rig());
    assert_eq!(store.revision(), 0);

    let plate = store
        .transact(|state| {
            let plate = state.mint_plate();
            state.place(S1, plate)?;
            Ok(plate)
        })
        .expect("dispense");
    assert_eq!(store.revision(), 1);
    assert_eq!(store.occupancy_at(S1), vec![plate]);

    let err = store.transact(|state| state.check_place(S1)).expect_err("occupied");
    assert!(matches!(err, CoreError::Occupied(_)));
    assert_eq!(store.revision(), 1);
}

#[test]
fn snapshot_is_a_detached_copy() {
    let store = LayoutStore::new(rig());
    let before = store.snapshot();
    mint_at(&store, K1);
    let after = store.snapshot();

    assert!(before.stack("K1").expect("K1").plates.is_empty());
    assert_eq!(after.stack("K1").expect("K1").plates, vec![PlateId(1)]);
    assert_eq!(after.revision, before.revision + 1);
    assert_eq!(after.track("T1").expect("T1").from.as_str(), "S1");
    assert_eq!(after.plate_count(), 1);
}

#[test]
fn store_remove_reports_the_plate() {
    let store = LayoutStore::new(rig());
    let plate = mint_at(&store, S1);
    assert_eq!(store.remove(S1), Ok((S1, plate)));
    assert!(matches!(store.remove(S1), Err(CoreError::Empty(_))));

    // A plate that left the system may be put back, once.
    assert_eq!(store.place(K1, plate), Ok(K1));
    assert!(matches!(store.place(S1, plate), Err(CoreError::Internal(_))));
}
