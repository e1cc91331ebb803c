use {
    conveyor::Conveyor,
    std::sync::mpsc::channel,
    std::time::Duration,
    thiserror::Error,
};

#[derive(Clone, Debug, Error, PartialEq)]
#[error("mock conveyor failure")]
struct MockFailure;

/// GIVEN
/// - a `Conveyor<u8>` whose consumer forwards every item to a channel
///
/// WHEN
/// - `0, 1, 2` are pushed via `push`
///
/// THEN
/// - the consumer observes all three, in order, and `check_error` reports no failure
#[test]
fn single_stage_move_pipeline() {
    let (tx, rx) = channel();
    let conveyor = Conveyor::new(move |item: u8| -> Result<(), MockFailure> {
        tx.send(item).unwrap();
        Ok(())
    });

    conveyor.push(0).unwrap();
    conveyor.push(1).unwrap();
    conveyor.push(2).unwrap();
    conveyor.finish();

    assert!(conveyor.check_error().is_ok());
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(0));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(1));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(2));
}

/// GIVEN
/// - a `Conveyor<u8>` whose consumer fails on its second call
///
/// WHEN
/// - three items are pushed
///
/// THEN
/// - `check_error`, called after `finish`, surfaces the captured failure
#[test]
fn check_error_after_finish_surfaces_failure() {
    let conveyor = Conveyor::new(|item: u8| -> Result<(), MockFailure> {
        if item == 1 {
            Err(MockFailure)
        } else {
            Ok(())
        }
    });

    for item in 0..3 {
        let _ = conveyor.push(item);
    }
    conveyor.finish();

    let error = conveyor.check_error().unwrap_err();
    assert_eq!(error.to_string(), MockFailure.to_string());
}

/// GIVEN
/// - a `Conveyor<u8>` whose consumer never fails
///
/// WHEN
/// - items are pushed via `push_copy`
///
/// THEN
/// - the copies, not the originals, are what the consumer observes, and the caller retains its
///   own copy of each item
#[test]
fn push_copy_retains_caller_copy() {
    let (tx, rx) = channel();
    let conveyor = Conveyor::new(move |item: u8| -> Result<(), MockFailure> {
        tx.send(item).unwrap();
        Ok(())
    });

    let item = 9_u8;
    conveyor.push_copy(&item).unwrap();
    conveyor.finish();

    assert_eq!(item, 9);
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(9));
}

/// GIVEN
/// - a `Conveyor<u8>` whose consumer captures a failure that is never observed
///
/// WHEN
/// - the conveyor is dropped without calling `finish`/`check_error`
///
/// THEN
/// - the drop itself does not panic (the failure is logged and discarded)
#[test]
fn drop_without_observing_failure_does_not_panic() {
    let conveyor = Conveyor::new(|_: u8| -> Result<(), MockFailure> { Err(MockFailure) });

    conveyor.push(0).unwrap();
    drop(conveyor);
}
