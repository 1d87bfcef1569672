//! Integration tests for passenger counting and the overload alarm,
//! driven through the full service control cycle.

use crate::gate_flow_tests::Rig;

use faregate::app::events::AppEvent;

/// One boarding crossing at the doorway: outer beam, both, inner, clear.
fn entry_crossing(rig: &mut Rig) {
    rig.hw.inputs.sensor_a = true;
    rig.run_until(rig.now + 90);
    rig.hw.inputs.sensor_b = true;
    rig.run_until(rig.now + 90);
    rig.hw.inputs.sensor_a = false;
    rig.hw.inputs.sensor_b = false;
    rig.run_until(rig.now + 90);
}

fn exit_crossing(rig: &mut Rig) {
    rig.hw.inputs.sensor_b = true;
    rig.run_until(rig.now + 90);
    rig.hw.inputs.sensor_a = true;
    rig.run_until(rig.now + 90);
    rig.hw.inputs.sensor_a = false;
    rig.hw.inputs.sensor_b = false;
    rig.run_until(rig.now + 90);
}

#[test]
fn crossings_track_occupancy_through_the_service() {
    let mut rig = Rig::new();
    for _ in 0..3 {
        entry_crossing(&mut rig);
    }
    assert_eq!(rig.service.occupancy(), 3);
    assert_eq!(
        rig.sink
            .count_of(|e| matches!(e, AppEvent::PassengerEntered { .. })),
        3
    );

    exit_crossing(&mut rig);
    assert_eq!(rig.service.occupancy(), 2);
    assert_eq!(
        rig.sink
            .count_of(|e| matches!(e, AppEvent::PassengerExited { .. })),
        1
    );
}

#[test]
fn sixth_passenger_trips_overload_exactly_once() {
    let mut rig = Rig::new();

    // Threshold is 5: the first five entries raise nothing.
    for _ in 0..5 {
        entry_crossing(&mut rig);
    }
    assert_eq!(rig.service.overload_count(), 0);
    assert!(!rig.hw.alarm_on);

    entry_crossing(&mut rig);
    assert_eq!(rig.service.occupancy(), 6);
    assert_eq!(rig.service.overload_count(), 1);
    assert!(rig.hw.alarm_on, "alarm sounds on the upward crossing");
    assert_eq!(
        rig.sink
            .count_of(|e| matches!(e, AppEvent::OverloadRaised { .. })),
        1
    );

    // Staying overloaded does not re-raise.
    rig.run_until(rig.now + 1000);
    assert_eq!(rig.service.overload_count(), 1);
}

#[test]
fn overload_alarm_auto_silences_but_latch_holds() {
    let mut rig = Rig::new();
    for _ in 0..6 {
        entry_crossing(&mut rig);
    }
    assert!(rig.hw.alarm_on);
    let raised_at = rig.now;

    // Auto-silence after 3000 ms; the latch stays until occupancy drops.
    rig.run_until(raised_at + 3100);
    assert!(!rig.hw.alarm_on);
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::OverloadCleared)), 0);

    // One exit drops occupancy to 5 (= threshold): latch releases.
    exit_crossing(&mut rig);
    assert_eq!(rig.service.occupancy(), 5);
    assert_eq!(rig.sink.count_of(|e| matches!(e, AppEvent::OverloadCleared)), 1);

    // A seventh boarding re-arms a second overload event.
    entry_crossing(&mut rig);
    assert_eq!(rig.service.overload_count(), 2);
    assert!(rig.hw.alarm_on);
}

#[test]
fn abandoned_half_crossing_does_not_count() {
    let mut rig = Rig::new();
    // Outer beam breaks, but nobody completes the crossing.
    rig.hw.inputs.sensor_a = true;
    rig.run_until(rig.now + 90);
    rig.hw.inputs.sensor_a = false;
    // Crossing window is 1000 ms; wait it out.
    rig.run_until(rig.now + 1500);
    assert_eq!(rig.service.occupancy(), 0);
    assert_eq!(
        rig.sink
            .count_of(|e| matches!(e, AppEvent::PassengerEntered { .. })),
        0
    );
}

#[test]
fn exits_at_zero_keep_occupancy_at_zero() {
    let mut rig = Rig::new();
    exit_crossing(&mut rig);
    exit_crossing(&mut rig);
    assert_eq!(rig.service.occupancy(), 0);
    entry_crossing(&mut rig);
    assert_eq!(rig.service.occupancy(), 1);
}
