// minnow-vm garbage-collector tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Collector behaviour observed through scripts and native descriptors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use minnow_vm::{Marker, NativeAddr, NativeProp, State, Thread, Value};

fn run(state: &State) -> Thread<'_> {
    let mut thread = Thread::new(state);
    thread.start();
    thread.run().unwrap();
    thread
}

#[test]
fn transient_strings_are_collected() {
    let allocations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&allocations);

    let mut state = State::new();
    state
        .bind_function("make_tmp", move |thread, _args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(thread.new_string("tmp"))
        })
        .unwrap();
    state
        .compile_string(
            "gc.mnw",
            "func churn() { t := \"\" for i := 0; i < 1000; i += 1 { t = make_tmp() } return t } \
             x := churn()",
        )
        .unwrap();

    let thread = run(&state);
    assert_eq!(allocations.load(Ordering::SeqCst), 1000);

    // Only the string still reachable from `x` (and the return register)
    // survives; the collector kept the heap near its live size throughout.
    assert!(
        thread.live_objects() <= 4,
        "expected a handful of live objects, found {}",
        thread.live_objects()
    );

    let x = state.global_index("x").unwrap();
    let value = thread.global(x).unwrap();
    assert_eq!(thread.value_str(&value), Some("tmp"));
}

static NATIVE_FINALIZED: AtomicUsize = AtomicUsize::new(0);

fn counting_finalize(_addr: NativeAddr) {
    NATIVE_FINALIZED.fetch_add(1, Ordering::SeqCst);
}

static COUNTING_PROP: NativeProp = NativeProp {
    name: "counted",
    protect: None,
    finalize: Some(counting_finalize),
    to_string: None,
};

#[test]
fn finalize_runs_exactly_once_per_native() {
    NATIVE_FINALIZED.store(0, Ordering::SeqCst);

    let mut state = State::new();
    state
        .bind_function("make_obj", |thread, _args| {
            Ok(thread.new_native(std::ptr::null_mut(), Some(&COUNTING_PROP)))
        })
        .unwrap();
    state
        .compile_string(
            "gc.mnw",
            "o := null for i := 0; i < 100; i += 1 { o = make_obj() }",
        )
        .unwrap();

    {
        let thread = run(&state);
        let finalized = NATIVE_FINALIZED.load(Ordering::SeqCst);
        let live = thread.live_objects();
        assert_eq!(finalized + live, 100);
        assert!(live >= 1, "the object in `o` must still be alive");
        // Thread teardown finalizes the survivors.
    }
    assert_eq!(NATIVE_FINALIZED.load(Ordering::SeqCst), 100);
}

/// A native payload that owns another script value; `protect` forwards
/// marking to it, the way hosts keep transitively referenced objects alive.
struct PairPayload {
    inner: Value,
}

static PAIR_FINALIZED: AtomicUsize = AtomicUsize::new(0);

fn pair_protect(addr: NativeAddr, marker: &mut Marker<'_>) {
    let payload = unsafe { &*(addr as *const PairPayload) };
    marker.mark(&payload.inner);
}

fn pair_finalize(addr: NativeAddr) {
    PAIR_FINALIZED.fetch_add(1, Ordering::SeqCst);
    drop(unsafe { Box::from_raw(addr as *mut PairPayload) });
}

static PAIR_PROP: NativeProp = NativeProp {
    name: "pair",
    protect: Some(pair_protect),
    finalize: Some(pair_finalize),
    to_string: None,
};

#[test]
fn protect_callback_keeps_inner_values_alive() {
    PAIR_FINALIZED.store(0, Ordering::SeqCst);

    let mut state = State::new();
    state
        .bind_function("make_pair", |thread, _args| {
            let inner = thread.new_string("keepme");
            let payload = Box::into_raw(Box::new(PairPayload { inner }));
            Ok(thread.new_native(payload as NativeAddr, Some(&PAIR_PROP)))
        })
        .unwrap();
    state
        .bind_function("pair_inner", |thread, args| {
            let addr = thread
                .value_addr(&args[0])
                .ok_or_else(|| minnow_vm::RuntimeError::type_error("native", &args[0]))?;
            let payload = unsafe { &*(addr as *const PairPayload) };
            Ok(payload.inner.clone())
        })
        .unwrap();
    state
        .bind_function("garbage", |thread, _args| Ok(thread.new_string("junk")))
        .unwrap();
    state
        .compile_string(
            "gc.mnw",
            "p := make_pair() \
             j := \"\" \
             for i := 0; i < 200; i += 1 { j = garbage() } \
             s := pair_inner(p) \
             ok := (s == \"keepme\")",
        )
        .unwrap();

    {
        let thread = run(&state);
        let ok = state.global_index("ok").unwrap();
        assert_eq!(thread.global(ok).unwrap().as_bool(), Some(true));
        // The pair in `p` never died while the thread was alive.
        assert_eq!(PAIR_FINALIZED.load(Ordering::SeqCst), 0);

        let s = state.global_index("s").unwrap();
        let inner = thread.global(s).unwrap();
        assert_eq!(thread.value_str(&inner), Some("keepme"));
    }
    assert_eq!(PAIR_FINALIZED.load(Ordering::SeqCst), 1);
}

#[test]
fn light_natives_are_never_tracked() {
    let mut state = State::new();
    state
        .bind_function("make_light", |_thread, _args| {
            Ok(Value::light_native(0x1000 as NativeAddr))
        })
        .unwrap();
    state
        .compile_string(
            "gc.mnw",
            "l := null for i := 0; i < 50; i += 1 { l = make_light() }",
        )
        .unwrap();

    let thread = run(&state);
    assert_eq!(thread.live_objects(), 0);

    let l = state.global_index("l").unwrap();
    let value = thread.global(l).unwrap();
    assert_eq!(thread.value_addr(&value), Some(0x1000 as NativeAddr));
}

#[test]
fn randomised_stores_survive_collection() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let rng = Arc::new(Mutex::new(StdRng::seed_from_u64(42)));
    let expected = Arc::new(Mutex::new(vec![String::new(); 3]));

    let writer_rng = Arc::clone(&rng);
    let writer_expected = Arc::clone(&expected);

    let mut state = State::new();
    state
        .bind_function("stash", move |thread, _args| {
            let (slot, text) = {
                let mut rng = writer_rng.lock().unwrap();
                let slot = rng.random_range(0..3usize);
                let len = rng.random_range(1..64usize);
                let text: String = (0..len)
                    .map(|_| rng.random_range(b'a'..=b'z') as char)
                    .collect();
                (slot, text)
            };

            let name = ["g0", "g1", "g2"][slot];
            let index = thread
                .state()
                .global_index(name)
                .ok_or_else(|| minnow_vm::RuntimeError::Internal(name.to_string()))?;
            let value = thread.new_string(text.clone());
            thread.set_global(index, value)?;
            writer_expected.lock().unwrap()[slot] = text;
            Ok(Value::Null)
        })
        .unwrap();
    state
        .compile_string(
            "gc.mnw",
            "g0 := \"\" g1 := \"\" g2 := \"\" \
             for i := 0; i < 500; i += 1 { stash() }",
        )
        .unwrap();

    let thread = run(&state);

    // At most the three rooted strings survive, plus bounded slack from the
    // doubling threshold.
    assert!(
        thread.live_objects() <= 8,
        "heap grew unbounded: {} live objects",
        thread.live_objects()
    );

    let expected = expected.lock().unwrap();
    for (slot, name) in ["g0", "g1", "g2"].iter().enumerate() {
        if expected[slot].is_empty() {
            continue;
        }
        let index = state.global_index(name).unwrap();
        let value = thread.global(index).unwrap();
        assert_eq!(thread.value_str(&value), Some(expected[slot].as_str()));
    }
}
